//! Static plugin descriptors and their configuration step.

use crate::PluginError;
use deckhand_config::{Environment, ParseOptions, Value, ValueParser};
use std::collections::BTreeMap;

/// An environment variable a plugin reads, with the parser for its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginVariable {
    pub name: &'static str,
    pub parser: ValueParser,
}

impl PluginVariable {
    pub const fn new(name: &'static str, parser: ValueParser) -> Self {
        Self { name, parser }
    }
}

/// What a plugin is and which variables it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Registration name, unique per registry.
    pub name: &'static str,
    pub verbose_name: &'static str,
    pub version: &'static str,
    /// Variables that must be set, even if empty, for the plugin to load.
    pub required: &'static [PluginVariable],
    pub optional: &'static [PluginVariable],
}

/// Typed plugin variables copied out of the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginConfig {
    values: BTreeMap<&'static str, Value>,
    configured: bool,
}

impl PluginConfig {
    /// Check `descriptor`'s required variables against `env` and copy every
    /// declared variable with a non-empty value.
    ///
    /// A required variable only counts as missing when it is unset; an
    /// explicitly empty value satisfies the requirement but is not copied.
    pub fn configure(
        descriptor: &PluginDescriptor,
        env: &Environment,
    ) -> Result<Self, PluginError> {
        let missing: Vec<String> = descriptor
            .required
            .iter()
            .filter(|variable| env.get(variable.name).is_none())
            .map(|variable| variable.name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PluginError::MissingConfiguration { missing });
        }

        let mut values = BTreeMap::new();
        for variable in descriptor.required.iter().chain(descriptor.optional) {
            let Some(raw) = env.get_non_empty(variable.name) else {
                continue;
            };
            let value = variable
                .parser
                .parse(raw, ParseOptions::default())
                .map_err(|source| PluginError::InvalidVariable {
                    variable: variable.name.to_string(),
                    source,
                })?;
            values.insert(variable.name, value);
        }

        Ok(Self {
            values,
            configured: true,
        })
    }

    /// True once every required variable has been checked.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }
}
