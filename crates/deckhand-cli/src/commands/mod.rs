//! CLI command implementations.

pub mod plugins;
pub mod run;
pub mod settings;

use anyhow::{Context, Result};
use deckhand_config::{ConfigResolver, Settings};
use deckhand_plugins::{LoadReport, PluginContext, PluginRegistry, builtin};

/// Resolve settings from the process environment.
pub fn resolve() -> Result<(ConfigResolver, Settings)> {
    let resolver =
        ConfigResolver::from_process_env().context("Failed to read artifact env files")?;
    let settings = resolver.resolve().context("Failed to resolve settings")?;
    Ok((resolver, settings))
}

/// Load every built-in plugin against the resolver's environment.
pub fn load_plugins(
    resolver: &ConfigResolver,
    settings: &Settings,
) -> (PluginRegistry, Vec<LoadReport>) {
    let context = PluginContext {
        settings,
        ci_provider: resolver.provider().map(|provider| provider.name()),
    };
    let mut registry = PluginRegistry::new();
    let reports = registry.load_all(builtin::catalog(), resolver.environment(), &context);
    (registry, reports)
}
