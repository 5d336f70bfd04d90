//! Plugin registration.
//!
//! Plugins are kept in registration order, which is also the order hooks are
//! dispatched in.

use crate::lifecycle::LifecycleManager;
use crate::{Plugin, PluginConfig, PluginDescriptor, PluginError};
use deckhand_config::{Environment, Settings};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// What a plugin factory can see besides its own configuration.
#[derive(Debug, Clone, Copy)]
pub struct PluginContext<'a> {
    pub settings: &'a Settings,
    /// Display name of the active CI provider.
    pub ci_provider: Option<&'a str>,
}

pub type PluginFactory =
    for<'a> fn(PluginConfig, &PluginContext<'a>) -> Result<Box<dyn Plugin>, PluginError>;

/// A plugin type that can be loaded: its descriptor and a constructor.
#[derive(Debug, Clone, Copy)]
pub struct PluginEntry {
    pub descriptor: &'static PluginDescriptor,
    pub build: PluginFactory,
}

/// Outcome of loading one plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub name: String,
    pub verbose_name: String,
    pub version: String,
    pub loaded: bool,
    pub reason: String,
}

impl LoadReport {
    fn new(descriptor: &PluginDescriptor, outcome: &Result<(), PluginError>) -> Self {
        Self {
            name: descriptor.name.to_string(),
            verbose_name: descriptor.verbose_name.to_string(),
            version: descriptor.version.to_string(),
            loaded: outcome.is_ok(),
            reason: match outcome {
                Ok(()) => "loaded".to_string(),
                Err(e) => e.to_string(),
            },
        }
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure, build and register one plugin.
    pub fn load(
        &mut self,
        entry: &PluginEntry,
        env: &Environment,
        context: &PluginContext<'_>,
    ) -> Result<(), PluginError> {
        let config = PluginConfig::configure(entry.descriptor, env)?;
        let plugin = (entry.build)(config, context)?;
        self.register(plugin)
    }

    /// Load every entry, in order.
    ///
    /// One plugin failing to load does not affect the others; each outcome
    /// is reported and logged.
    pub fn load_all(
        &mut self,
        entries: &[PluginEntry],
        env: &Environment,
        context: &PluginContext<'_>,
    ) -> Vec<LoadReport> {
        entries
            .iter()
            .map(|entry| {
                let outcome = self.load(entry, env, context);
                let report = LoadReport::new(entry.descriptor, &outcome);
                if report.loaded {
                    info!(plugin = %report.name, version = %report.version, "Plugin loaded");
                } else {
                    warn!(plugin = %report.name, reason = %report.reason, "Plugin not loaded");
                }
                report
            })
            .collect()
    }

    /// Add a plugin instance. Names must be unique.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<(), PluginError> {
        if self.contains(plugin.name()) {
            return Err(PluginError::Duplicate(plugin.name().to_string()));
        }
        self.plugins.push(plugin);
        Ok(())
    }

    /// Remove the registered instance named `name` and hand it back.
    ///
    /// The instance itself is looked up and removed, so no hook reaches it
    /// afterwards.
    pub fn unregister(&mut self, name: &str) -> Option<Box<dyn Plugin>> {
        let index = self.plugins.iter().position(|p| p.name() == name)?;
        Some(self.plugins.remove(index))
    }

    /// Remove the instance registered for `descriptor`.
    pub fn unregister_descriptor(
        &mut self,
        descriptor: &PluginDescriptor,
    ) -> Option<Box<dyn Plugin>> {
        self.unregister(descriptor.name)
    }

    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Plugin> {
        self.plugins.iter().map(|p| p.as_ref())
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Dispatcher for lifecycle scopes over the registered plugins.
    pub fn lifecycle(&self) -> LifecycleManager<'_> {
        LifecycleManager::new(self)
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}
