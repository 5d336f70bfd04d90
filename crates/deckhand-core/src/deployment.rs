//! Deployment payloads.
//!
//! Projects and services are the domain objects handed to the
//! `project_deployment` and `service_deployment` hooks.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A username/password pair protecting an ingress with basic auth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[display("{username}:***")]
pub struct BasicAuthUser {
    pub username: String,
    pub password: String,
}

impl BasicAuthUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse a `user:pass` token.
    ///
    /// Only the first two colon-separated parts are used, so
    /// `user:first:rest` yields the password `first`.
    pub fn from_colon_string(credential: &str) -> Option<Self> {
        let mut parts = credential.split(':');
        let username = parts.next().filter(|s| !s.is_empty())?;
        let password = parts.next().filter(|s| !s.is_empty())?;
        Some(Self::new(username, password))
    }
}

/// The application project being deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project name.
    pub name: String,
    /// Deployment track (e.g. `stable`, `review`).
    pub track: String,
    /// Image reference that will be deployed.
    pub image: String,
    /// Primary URL of the deployed environment.
    pub url: String,
    /// Extra hostnames routed to the project.
    pub additional_urls: Vec<String>,
    /// Users allowed through ingress basic auth.
    pub basic_auth_users: Vec<BasicAuthUser>,
    pub initialize_command: String,
    pub migrate_command: String,
    pub liveness_path: String,
    pub readiness_path: String,
    pub probe_failure_threshold: i64,
    pub probe_initial_delay: i64,
    pub probe_period: i64,
    pub replica_count: i64,
    pub request_cpu: String,
    pub request_ram: String,
    pub limit_cpu: String,
    pub limit_ram: String,
    pub service_port: i64,
}

impl Project {
    pub fn new(name: impl Into<String>, track: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            track: track.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Human readable name used in notifications.
    pub fn verbose_name(&self) -> String {
        if self.track.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.track)
        }
    }
}

/// A supporting service (database, message broker, ...) deployed with a chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub track: String,
    /// Chart reference, e.g. `bitnami/postgresql`.
    pub chart: String,
    pub chart_version: Option<String>,
    /// Chart values passed to the chart manager.
    pub values: BTreeMap<String, String>,
    /// Names of services this one depends on.
    pub depends_on: Vec<String>,
}

impl Service {
    pub fn new(
        name: impl Into<String>,
        track: impl Into<String>,
        chart: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            track: track.into(),
            chart: chart.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_user_from_colon_string() {
        assert_eq!(
            BasicAuthUser::from_colon_string("user:pass"),
            Some(BasicAuthUser::new("user", "pass"))
        );
        assert_eq!(
            BasicAuthUser::from_colon_string("username:firstpart:only"),
            Some(BasicAuthUser::new("username", "firstpart"))
        );
        assert_eq!(BasicAuthUser::from_colon_string("user"), None);
        assert_eq!(BasicAuthUser::from_colon_string("user:"), None);
    }

    #[test]
    fn test_basic_auth_user_display_hides_password() {
        let user = BasicAuthUser::new("admin", "hunter2");
        assert_eq!(user.to_string(), "admin:***");
    }

    #[test]
    fn test_project_verbose_name() {
        assert_eq!(Project::new("shop", "review").verbose_name(), "shop (review)");
        assert_eq!(Project::new("shop", "").verbose_name(), "shop");
    }
}
