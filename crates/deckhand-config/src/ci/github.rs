//! GitHub Actions.
//!
//! Pull request metadata is not exported as variables; it lives in the
//! webhook event payload at `GITHUB_EVENT_PATH`, which is read once.

use super::{CiProvider, ProviderKind, VariableMapping};
use crate::Environment;
use deckhand_core::naming::kubernetes_safe_name;
use std::fs;
use tracing::debug;

const MAPPING: &[VariableMapping] = &[
    VariableMapping::env("GIT_COMMIT_REF_NAME", "GITHUB_REF"),
    VariableMapping::env("GIT_COMMIT_SHA", "GITHUB_SHA"),
    VariableMapping::env("GIT_TARGET_BRANCH", "GITHUB_BASE_REF"),
    VariableMapping::env("JOB_ACTOR", "GITHUB_ACTOR"),
    VariableMapping::env("JOB_ID", "GITHUB_ACTION"),
    VariableMapping::env("JOB_NAME", "GITHUB_WORKFLOW"),
    VariableMapping::env("JOB_PIPELINE_ID", "GITHUB_RUN_ID"),
    VariableMapping::computed("PR_ID", "PR_ID"),
    VariableMapping::computed("PR_TITLE", "PR_TITLE"),
    VariableMapping::computed("PR_URL", "PR_URL"),
    VariableMapping::computed("PROJECT_ID", "PROJECT_ID"),
    VariableMapping::env("PROJECT_NAME", "GITHUB_REPOSITORY"),
];

#[derive(Debug, Clone, Default)]
pub struct GitHubActions {
    event: Option<serde_json::Value>,
    repository: Option<String>,
}

impl GitHubActions {
    pub fn from_env(env: &Environment) -> Self {
        Self {
            event: env.path("GITHUB_EVENT_PATH").and_then(|path| {
                let payload = fs::read_to_string(&path)
                    .inspect_err(|e| {
                        debug!(path = %path.display(), error = %e, "No GitHub event payload")
                    })
                    .ok()?;
                serde_json::from_str(&payload)
                    .inspect_err(|e| {
                        debug!(
                            path = %path.display(),
                            error = %e,
                            "Unreadable GitHub event payload"
                        )
                    })
                    .ok()
            }),
            repository: env.get_non_empty("GITHUB_REPOSITORY").map(str::to_string),
        }
    }

    fn event_field(&self, pointer: &str) -> Option<String> {
        let value = self.event.as_ref()?.pointer(pointer)?;
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

impl CiProvider for GitHubActions {
    fn name(&self) -> &'static str {
        "GitHub Actions"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHubActions
    }

    fn mapping(&self) -> &'static [VariableMapping] {
        MAPPING
    }

    fn computed(&self, property: &str) -> Option<String> {
        match property {
            "PR_ID" => self.event_field("/pull_request/number"),
            "PR_TITLE" => self.event_field("/pull_request/title"),
            "PR_URL" => self.event_field("/pull_request/url"),
            "PROJECT_ID" => self.repository.as_deref().map(kubernetes_safe_name),
            _ => None,
        }
    }

    fn unescape_values(&self) -> bool {
        true
    }

    fn file_secret_path_prefixes(&self) -> &'static [&'static str] {
        &["/builds/"]
    }
}
