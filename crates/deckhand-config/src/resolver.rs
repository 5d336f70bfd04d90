//! Layered settings resolution.
//!
//! For each declared variable the first source that yields a value wins:
//!
//! 1. `NAME` in the environment
//! 2. `{PROJECT}_NAME`, where `PROJECT` is the env-var safe project name
//! 3. the active CI provider's mapping for `NAME`
//! 4. the value from a previous resolution, when re-resolving
//! 5. the declared default
//!
//! Artifact env files are folded into the environment snapshot before any
//! of this happens, with lower priority than variables already set.

use crate::artifacts::merge_artifact_env_files;
use crate::ci::{self, CiProvider, MappedSource};
use crate::schema::{Settings, VARIABLES, VariableDefinition};
use crate::{ConfigError, ConfigResult, Environment, ParseOptions, Value, ValueParser};
use deckhand_core::naming::env_var_safe_key;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const PROJECT_NAME: &str = "PROJECT_NAME";

#[derive(Debug)]
pub struct ConfigResolver {
    env: Environment,
    provider: Option<Box<dyn CiProvider>>,
    defaults: BTreeMap<&'static str, Value>,
}

impl ConfigResolver {
    /// Prepare a resolver over an environment snapshot.
    ///
    /// Merges artifact env files, detects the CI provider, and draws the
    /// declared defaults. Generated defaults are drawn here, once, so every
    /// resolution through this resolver sees the same values.
    ///
    /// Repeatable resolution holds per resolver only: two resolvers over the
    /// same environment draw different generated defaults, such as
    /// `DATABASE_PASSWORD`. Reuse one resolver, or set the variable, when
    /// separate resolutions must agree.
    pub fn new(mut env: Environment) -> ConfigResult<Self> {
        let merged = merge_artifact_env_files(&mut env)?;
        if merged > 0 {
            debug!(count = merged, "Merged variables from artifact env files");
        }

        let provider = ci::active_provider(&env);
        match &provider {
            Some(provider) => info!(provider = provider.name(), "Detected CI provider"),
            None => debug!("No CI provider detected"),
        }

        let defaults = VARIABLES
            .iter()
            .map(|definition| (definition.name, definition.default.materialize(definition.parser)))
            .collect();

        Ok(Self {
            env,
            provider,
            defaults,
        })
    }

    /// Prepare a resolver over the current process environment.
    pub fn from_process_env() -> ConfigResult<Self> {
        Self::new(Environment::from_process())
    }

    /// The effective environment, including merged artifact variables.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn provider(&self) -> Option<&dyn CiProvider> {
        self.provider.as_deref()
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            unescape: self
                .provider
                .as_ref()
                .is_some_and(|provider| provider.unescape_values()),
        }
    }

    /// Resolve the project name.
    ///
    /// Only the plain variable and the CI mapping are consulted, since the
    /// project prefix is derived from this value. An empty result is fatal.
    pub fn project_name(&self) -> ConfigResult<String> {
        let options = self.parse_options();

        let resolved = match self.env.get_non_empty(PROJECT_NAME) {
            Some(raw) => Some(parse_variable(ValueParser::Text, PROJECT_NAME, raw, options)?),
            None => self.provider_value(PROJECT_NAME, ValueParser::Text, options)?,
        };

        resolved
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingProjectName)
    }

    /// Resolve every declared variable into a fresh [`Settings`].
    pub fn resolve(&self) -> ConfigResult<Settings> {
        self.resolve_with(None)
    }

    /// Re-resolve, keeping values from `previous` where no higher-priority
    /// source is set instead of falling back to defaults.
    pub fn resolve_over(&self, previous: &Settings) -> ConfigResult<Settings> {
        self.resolve_with(Some(previous))
    }

    fn resolve_with(&self, previous: Option<&Settings>) -> ConfigResult<Settings> {
        let project_name = self.project_name()?;
        let prefix = env_var_safe_key(&project_name);
        let options = self.parse_options();

        self.warn_unknown_mappings();

        let mut values = BTreeMap::new();
        for definition in VARIABLES {
            let value = if definition.name == PROJECT_NAME {
                Value::Text(project_name.clone())
            } else {
                self.resolve_variable(definition, &prefix, previous, options)?
            };
            values.insert(definition.name, value);
        }

        let settings = Settings::from_values(values)?;
        debug!(project = %settings.project_name, prefix = %prefix, "Resolved settings");
        Ok(settings)
    }

    fn resolve_variable(
        &self,
        definition: &VariableDefinition,
        prefix: &str,
        previous: Option<&Settings>,
        options: ParseOptions,
    ) -> ConfigResult<Value> {
        if let Some(raw) = self.env.get(definition.name) {
            return parse_variable(definition.parser, definition.name, raw, options);
        }

        let prefixed = format!("{prefix}_{}", definition.name);
        if let Some(raw) = self.env.get(&prefixed) {
            return parse_variable(definition.parser, &prefixed, raw, options);
        }

        if let Some(value) = self.provider_value(definition.name, definition.parser, options)? {
            return Ok(value);
        }

        if let Some(value) = previous.and_then(|settings| settings.get(definition.name)) {
            return Ok(value);
        }

        self.defaults.get(definition.name).cloned().ok_or_else(|| {
            ConfigError::Schema(format!("no default drawn for {}", definition.name))
        })
    }

    /// Value supplied by the active CI provider for `setting`, if any.
    ///
    /// A CI value that does not parse is fatal; it is never skipped.
    fn provider_value(
        &self,
        setting: &str,
        parser: ValueParser,
        options: ParseOptions,
    ) -> ConfigResult<Option<Value>> {
        let Some(provider) = &self.provider else {
            return Ok(None);
        };
        let Some(source) = provider.source_for(setting) else {
            return Ok(None);
        };

        let (variable, raw) = match source {
            MappedSource::Env(variable) => match self.env.get(variable) {
                Some(raw) => (variable, raw.to_string()),
                None => return Ok(None),
            },
            MappedSource::Computed(property) => match provider.computed(property) {
                Some(raw) => (property, raw),
                None => return Ok(None),
            },
        };

        parser
            .parse(&raw, options)
            .map(Some)
            .map_err(|source| ConfigError::InvalidCiValue {
                variable: variable.to_string(),
                value: raw,
                source,
            })
    }

    fn warn_unknown_mappings(&self) {
        let Some(provider) = &self.provider else {
            return;
        };
        for mapping in provider.mapping() {
            if VariableDefinition::lookup(mapping.setting).is_none() {
                warn!(
                    provider = provider.name(),
                    setting = mapping.setting,
                    "CI variable mapping failed, no such setting"
                );
            }
        }
    }
}

fn parse_variable(
    parser: ValueParser,
    variable: &str,
    raw: &str,
    options: ParseOptions,
) -> ConfigResult<Value> {
    parser
        .parse(raw, options)
        .map_err(|source| ConfigError::Parse {
            variable: variable.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(vars: &[(&str, &str)]) -> ConfigResolver {
        ConfigResolver::new(vars.iter().copied().collect()).unwrap()
    }

    #[test]
    fn test_project_name_is_required() {
        let err = resolver(&[]).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingProjectName));

        let err = resolver(&[("PROJECT_NAME", "")]).resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingProjectName));
    }

    #[test]
    fn test_project_name_has_no_prefixed_variant() {
        let err = resolver(&[("SHOP_PROJECT_NAME", "shop")])
            .project_name()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingProjectName));
    }

    #[test]
    fn test_generated_defaults_are_drawn_per_resolver() {
        let vars = [("PROJECT_NAME", "shop")];
        let first = resolver(&vars);
        let second = resolver(&vars);

        let password = first.resolve().unwrap().database_password;
        assert_eq!(first.resolve().unwrap().database_password, password);
        assert_ne!(second.resolve().unwrap().database_password, password);

        let pinned = [("PROJECT_NAME", "shop"), ("DATABASE_PASSWORD", "fixed")];
        assert_eq!(
            resolver(&pinned).resolve().unwrap(),
            resolver(&pinned).resolve().unwrap()
        );
    }

    #[test]
    fn test_project_name_from_ci() {
        let r = resolver(&[("GITLAB_CI", "true"), ("CI_PROJECT_NAME", "from-ci")]);
        assert_eq!(r.project_name().unwrap(), "from-ci");
    }

    #[test]
    fn test_prefixed_variable_uses_safe_project_key() {
        let settings = resolver(&[
            ("PROJECT_NAME", "my-shop.v2"),
            ("MY_SHOP_V2_SERVICE_PORT", "9000"),
        ])
        .resolve()
        .unwrap();
        assert_eq!(settings.service_port, 9000);
    }

    #[test]
    fn test_parse_error_names_the_variable() {
        let err = resolver(&[("PROJECT_NAME", "shop"), ("SHOP_SERVICE_PORT", "http")])
            .resolve()
            .unwrap_err();
        match err {
            ConfigError::Parse { variable, .. } => assert_eq!(variable, "SHOP_SERVICE_PORT"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_generated_default_is_drawn_once() {
        let r = resolver(&[("PROJECT_NAME", "shop")]);
        let first = r.resolve().unwrap();
        let second = r.resolve().unwrap();
        assert_eq!(first.database_password, second.database_password);
    }
}
