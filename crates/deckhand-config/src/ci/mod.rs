//! CI provider detection and variable mapping.
//!
//! Providers are checked in [`ProviderKind::DETECTION_ORDER`]; the first one
//! whose activation variable is set wins. Each provider maps setting names to
//! either a raw CI variable or a value it computes itself.

mod azure;
mod github;
mod gitlab;

pub use azure::AzurePipelines;
pub use github::GitHubActions;
pub use gitlab::GitLabCi;

use crate::Environment;
use derive_more::Display;
use std::fmt::Debug;

/// Where a mapped setting gets its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappedSource {
    /// Read the named CI variable from the environment.
    Env(&'static str),
    /// Ask the provider for a computed property.
    Computed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableMapping {
    pub setting: &'static str,
    pub source: MappedSource,
}

impl VariableMapping {
    pub const fn env(setting: &'static str, variable: &'static str) -> Self {
        Self {
            setting,
            source: MappedSource::Env(variable),
        }
    }

    pub const fn computed(setting: &'static str, property: &'static str) -> Self {
        Self {
            setting,
            source: MappedSource::Computed(property),
        }
    }
}

/// A CI system whose environment seeds settings.
pub trait CiProvider: Send + Sync + Debug {
    /// Display name, e.g. `GitLab CI`.
    fn name(&self) -> &'static str;

    fn kind(&self) -> ProviderKind;

    /// Setting name to source mapping.
    fn mapping(&self) -> &'static [VariableMapping];

    /// Value of a computed property. `None` when the provider has no value.
    fn computed(&self, _property: &str) -> Option<String> {
        None
    }

    /// Whether exported variables carry backslash escapes that need decoding.
    fn unescape_values(&self) -> bool {
        false
    }

    fn file_secret_path_prefixes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Look up the mapping for a setting.
    fn source_for(&self, setting: &str) -> Option<MappedSource> {
        self.mapping()
            .iter()
            .find(|m| m.setting == setting)
            .map(|m| m.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ProviderKind {
    #[display("azure-pipelines")]
    AzurePipelines,
    #[display("gitlab-ci")]
    GitLab,
    #[display("github-actions")]
    GitHubActions,
}

impl ProviderKind {
    /// Detection priority. Earlier entries win when several signals are present.
    pub const DETECTION_ORDER: [ProviderKind; 3] = [
        ProviderKind::AzurePipelines,
        ProviderKind::GitLab,
        ProviderKind::GitHubActions,
    ];

    pub fn is_active(self, env: &Environment) -> bool {
        match self {
            ProviderKind::AzurePipelines => env.get_non_empty("AZURE_HTTP_USER_AGENT").is_some(),
            ProviderKind::GitLab => env.flag("GITLAB_CI"),
            ProviderKind::GitHubActions => env.flag("GITHUB_ACTIONS"),
        }
    }

    pub fn instantiate(self, env: &Environment) -> Box<dyn CiProvider> {
        match self {
            ProviderKind::AzurePipelines => Box::new(AzurePipelines),
            ProviderKind::GitLab => Box::new(GitLabCi),
            ProviderKind::GitHubActions => Box::new(GitHubActions::from_env(env)),
        }
    }
}

/// The first active provider kind in detection order.
pub fn detect(env: &Environment) -> Option<ProviderKind> {
    ProviderKind::DETECTION_ORDER
        .into_iter()
        .find(|kind| kind.is_active(env))
}

/// Detect and initialize the active provider, if any.
pub fn active_provider(env: &Environment) -> Option<Box<dyn CiProvider>> {
    detect(env).map(|kind| kind.instantiate(env))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_provider() {
        assert!(active_provider(&Environment::new()).is_none());
    }

    #[test]
    fn test_detects_each_provider() {
        let cases = [
            ("AZURE_HTTP_USER_AGENT", "VSTS_agent", ProviderKind::AzurePipelines),
            ("GITLAB_CI", "true", ProviderKind::GitLab),
            ("GITHUB_ACTIONS", "true", ProviderKind::GitHubActions),
        ];
        for (key, value, expected) in cases {
            let env = Environment::from_iter([(key, value)]);
            assert_eq!(detect(&env), Some(expected), "{key}");
        }
    }

    #[test]
    fn test_detection_order_breaks_ties() {
        let env = Environment::from_iter([
            ("GITHUB_ACTIONS", "true"),
            ("GITLAB_CI", "true"),
            ("AZURE_HTTP_USER_AGENT", "agent"),
        ]);
        assert_eq!(detect(&env), Some(ProviderKind::AzurePipelines));

        let env = env.without("AZURE_HTTP_USER_AGENT");
        assert_eq!(detect(&env), Some(ProviderKind::GitLab));
    }

    #[test]
    fn test_false_flags_do_not_activate() {
        let env = Environment::from_iter([
            ("GITLAB_CI", "false"),
            ("GITHUB_ACTIONS", "0"),
            ("AZURE_HTTP_USER_AGENT", ""),
        ]);
        assert_eq!(detect(&env), None);
    }

    #[test]
    fn test_instantiated_provider_reports_kind() {
        let env = Environment::from_iter([("GITLAB_CI", "1")]);
        let provider = active_provider(&env).unwrap();
        assert_eq!(provider.kind(), ProviderKind::GitLab);
        assert_eq!(provider.name(), "GitLab CI");
        assert_eq!(
            provider.source_for("GIT_COMMIT_SHA"),
            Some(MappedSource::Env("CI_COMMIT_SHA"))
        );
    }
}
