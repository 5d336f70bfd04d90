//! Process-wide settings, installed once at startup and read-only after.

use crate::{ConfigError, ConfigResult, Settings};
use std::sync::OnceLock;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Install the resolved settings. Fails if settings are already installed.
pub fn install(settings: Settings) -> ConfigResult<&'static Settings> {
    let mut installed = false;
    let stored = SETTINGS.get_or_init(|| {
        installed = true;
        settings
    });

    if installed {
        Ok(stored)
    } else {
        Err(ConfigError::AlreadyInstalled)
    }
}

/// The installed settings, if any.
pub fn get() -> Option<&'static Settings> {
    SETTINGS.get()
}
