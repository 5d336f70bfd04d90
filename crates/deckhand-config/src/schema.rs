//! The declared settings catalog.
//!
//! Every setting is declared once in [`settings_schema!`], which generates
//! the [`Settings`] struct, the [`VARIABLES`] definition table, and the
//! conversions between them, so a declared variable cannot lack a field.

use crate::{ConfigError, ConfigResult, Value, ValueParser};
use deckhand_core::{BasicAuthUser, Project};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Name fragments that mark a setting as secret.
const SENSITIVE_FRAGMENTS: &[&str] = &[
    "PASSWORD",
    "TOKEN",
    "JWT",
    "PRIVATE_KEY",
    "SECRET",
    "BASIC_AUTH",
];

/// Static default for a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Text(&'static str),
    Bool(bool),
    Int(i64),
    EmptyList,
    Null,
    /// A fresh random token, drawn once per resolver.
    GeneratedSecret,
}

impl DefaultValue {
    /// Turn the static default into a value for `parser`.
    pub fn materialize(self, parser: ValueParser) -> Value {
        match self {
            DefaultValue::Text(s) => Value::Text(s.to_string()),
            DefaultValue::Bool(b) => Value::Bool(b),
            DefaultValue::Int(i) => Value::Int(i),
            DefaultValue::EmptyList if parser == ValueParser::BasicAuth => {
                Value::Credentials(Vec::new())
            }
            DefaultValue::EmptyList => Value::List(Vec::new()),
            DefaultValue::Null => Value::Null,
            DefaultValue::GeneratedSecret => Value::Text(uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// One known setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDefinition {
    pub name: &'static str,
    pub parser: ValueParser,
    pub default: DefaultValue,
}

impl VariableDefinition {
    pub fn lookup(name: &str) -> Option<&'static VariableDefinition> {
        VARIABLES.iter().find(|definition| definition.name == name)
    }
}

/// Conversion between a settings field and a [`Value`].
pub trait SettingValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
    fn into_value(self) -> Value;
}

impl SettingValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl SettingValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl SettingValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_int()
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl SettingValue for Vec<String> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::List(self)
    }
}

impl SettingValue for Vec<BasicAuthUser> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Credentials(users) => Some(users),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Credentials(self)
    }
}

impl<T: SettingValue> SettingValue for Option<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, T::into_value)
    }
}

fn take_field<T: SettingValue>(
    values: &mut BTreeMap<&'static str, Value>,
    name: &'static str,
) -> ConfigResult<T> {
    let value = values
        .remove(name)
        .ok_or_else(|| ConfigError::Schema(format!("no value resolved for {name}")))?;
    let shown = format!("{value:?}");
    T::from_value(value)
        .ok_or_else(|| ConfigError::Schema(format!("value {shown} does not fit field {name}")))
}

macro_rules! settings_schema {
    ($(
        $(#[$meta:meta])*
        $field:ident: $ty:ty = $name:literal, $parser:ident, $default:expr;
    )*) => {
        /// Resolved settings. Built once per resolution and never mutated.
        #[derive(Debug, Clone, PartialEq)]
        pub struct Settings {
            $(
                $(#[$meta])*
                pub $field: $ty,
            )*
        }

        /// Every declared setting, in declaration order.
        pub static VARIABLES: &[VariableDefinition] = &[
            $(
                VariableDefinition {
                    name: $name,
                    parser: ValueParser::$parser,
                    default: $default,
                },
            )*
        ];

        impl Settings {
            /// Build settings from resolved values keyed by variable name.
            ///
            /// Every declared variable must be present with a value of the
            /// declared type, and no undeclared names may remain.
            pub fn from_values(mut values: BTreeMap<&'static str, Value>) -> ConfigResult<Self> {
                let settings = Self {
                    $( $field: take_field(&mut values, $name)?, )*
                };
                if let Some(name) = values.keys().next() {
                    return Err(ConfigError::Schema(format!(
                        "declared variable {name} has no settings field"
                    )));
                }
                Ok(settings)
            }

            /// Value of a setting by its variable name.
            pub fn get(&self, name: &str) -> Option<Value> {
                match name {
                    $( $name => Some(SettingValue::into_value(self.$field.clone())), )*
                    _ => None,
                }
            }

            /// All settings as `(name, value)` pairs, in declaration order.
            pub fn values(&self) -> Vec<(&'static str, Value)> {
                vec![
                    $( ($name, SettingValue::into_value(self.$field.clone())), )*
                ]
            }
        }
    };
}

settings_schema! {
    app_initialize_command: String = "APP_INITIALIZE_COMMAND", Text, DefaultValue::Text("");
    app_migrate_command: String = "APP_MIGRATE_COMMAND", Text, DefaultValue::Text("");
    build_artifact_folder: String = "BUILD_ARTIFACT_FOLDER", Text, DefaultValue::Text("");
    buildkit_cache_disable: bool = "BUILDKIT_CACHE_DISABLE", Bool, DefaultValue::Bool(false);
    buildkit_cache_image_name: String = "BUILDKIT_CACHE_IMAGE_NAME", Text, DefaultValue::Text("cache");
    buildkit_cache_repo: String = "BUILDKIT_CACHE_REPO", Text, DefaultValue::Text("");
    built_docker_test_image: String = "BUILT_DOCKER_TEST_IMAGE", Text, DefaultValue::Text("");
    container_registry: String = "CONTAINER_REGISTRY", Text, DefaultValue::Text("");
    container_registry_password: String = "CONTAINER_REGISTRY_PASSWORD", Text, DefaultValue::Text("");
    container_registry_repo: String = "CONTAINER_REGISTRY_REPO", Text, DefaultValue::Text("");
    container_registry_user: String = "CONTAINER_REGISTRY_USER", Text, DefaultValue::Text("");
    database_db: String = "DATABASE_DB", Text, DefaultValue::Text("appdb");
    /// Random per resolver unless set.
    database_password: String = "DATABASE_PASSWORD", Text, DefaultValue::GeneratedSecret;
    database_user: String = "DATABASE_USER", Text, DefaultValue::Text("user");
    default_track: String = "DEFAULT_TRACK", Text, DefaultValue::Text("stable");
    depends_on_projects: String = "DEPENDS_ON_PROJECTS", Text, DefaultValue::Text("");
    docker_build_arg_prefix: String = "DOCKER_BUILD_ARG_PREFIX", Text, DefaultValue::Text("DOCKER_BUILD_ARG_");
    docker_build_context: String = "DOCKER_BUILD_CONTEXT", Text, DefaultValue::Text(".");
    docker_build_platforms: Option<Vec<String>> = "DOCKER_BUILD_PLATFORMS", List, DefaultValue::Null;
    docker_build_source: String = "DOCKER_BUILD_SOURCE", Text, DefaultValue::Text("Dockerfile");
    docker_host: String = "DOCKER_HOST", Text, DefaultValue::Text("");
    docker_image_name: String = "DOCKER_IMAGE_NAME", Text, DefaultValue::Text("");
    docker_image_tags: Option<Vec<String>> = "DOCKER_IMAGE_TAGS", List, DefaultValue::Null;
    docker_test_image_stage: String = "DOCKER_TEST_IMAGE_STAGE", Text, DefaultValue::Text("development");
    deckhand_debug: bool = "DECKHAND_DEBUG", Bool, DefaultValue::Bool(false);
    deckhand_jobs_only: bool = "DECKHAND_JOBS_ONLY", Bool, DefaultValue::Bool(false);
    environment_slug: String = "ENVIRONMENT_SLUG", Text, DefaultValue::Text("");
    environment_url: String = "ENVIRONMENT_URL", Text, DefaultValue::Text("");
    git_commit_ref_name: String = "GIT_COMMIT_REF_NAME", Text, DefaultValue::Text("");
    git_commit_sha: String = "GIT_COMMIT_SHA", Text, DefaultValue::Text("");
    git_default_target_branch: String = "GIT_DEFAULT_TARGET_BRANCH", Text, DefaultValue::Text("master");
    git_target_branch: String = "GIT_TARGET_BRANCH", Text, DefaultValue::Text("");
    /// Seconds added to Helm's wait timeout.
    helm_buffer_time: i64 = "HELM_BUFFER_TIME", Int, DefaultValue::Int(120);
    job_actor: String = "JOB_ACTOR", Text, DefaultValue::Text("");
    job_id: String = "JOB_ID", Text, DefaultValue::Text("");
    job_name: String = "JOB_NAME", Text, DefaultValue::Text("");
    job_pipeline_id: String = "JOB_PIPELINE_ID", Text, DefaultValue::Text("");
    k8s_additional_hostnames: Vec<String> = "K8S_ADDITIONAL_HOSTNAMES", List, DefaultValue::EmptyList;
    k8s_certmanager_use_old_api: bool = "K8S_CERTMANAGER_USE_OLD_API", Bool, DefaultValue::Bool(false);
    k8s_cluster_issuer: String = "K8S_CLUSTER_ISSUER", Text, DefaultValue::Text("");
    k8s_file_secret_mountpath: String = "K8S_FILE_SECRET_MOUNTPATH", Text, DefaultValue::Text("/tmp/secrets");
    k8s_file_secret_prefix: String = "K8S_FILE_SECRET_PREFIX", Text, DefaultValue::Text("K8S_FILE_SECRET_");
    k8s_hpa_enabled: bool = "K8S_HPA_ENABLED", Bool, DefaultValue::Bool(false);
    k8s_hpa_max_cpu_avg: i64 = "K8S_HPA_MAX_CPU_AVG", Int, DefaultValue::Int(75);
    k8s_hpa_max_ram_avg: i64 = "K8S_HPA_MAX_RAM_AVG", Int, DefaultValue::Int(0);
    k8s_hpa_max_replicas: i64 = "K8S_HPA_MAX_REPLICAS", Int, DefaultValue::Int(3);
    k8s_hpa_min_replicas: i64 = "K8S_HPA_MIN_REPLICAS", Int, DefaultValue::Int(1);
    k8s_ingress_annotations: Vec<String> = "K8S_INGRESS_ANNOTATIONS", List, DefaultValue::EmptyList;
    k8s_ingress_base_domain: String = "K8S_INGRESS_BASE_DOMAIN", Text, DefaultValue::Text("");
    k8s_ingress_basic_auth: Vec<BasicAuthUser> = "K8S_INGRESS_BASIC_AUTH", BasicAuth, DefaultValue::EmptyList;
    k8s_ingress_disabled: bool = "K8S_INGRESS_DISABLED", Bool, DefaultValue::Bool(false);
    k8s_ingress_max_body_size: String = "K8S_INGRESS_MAX_BODY_SIZE", Text, DefaultValue::Text("100m");
    k8s_ingress_path: String = "K8S_INGRESS_PATH", Text, DefaultValue::Text("");
    k8s_ingress_prevent_robots: bool = "K8S_INGRESS_PREVENT_ROBOTS", Bool, DefaultValue::Bool(false);
    k8s_ingress_secret_name: String = "K8S_INGRESS_SECRET_NAME", Text, DefaultValue::Text("");
    k8s_ingress_whitelist_ips: String = "K8S_INGRESS_WHITELIST_IPS", Text, DefaultValue::Text("");
    k8s_limit_cpu: String = "K8S_LIMIT_CPU", Text, DefaultValue::Text("");
    k8s_limit_ram: String = "K8S_LIMIT_RAM", Text, DefaultValue::Text("");
    k8s_liveness_file: String = "K8S_LIVENESS_FILE", Text, DefaultValue::Text("");
    k8s_liveness_path: String = "K8S_LIVENESS_PATH", Text, DefaultValue::Text("/healthz");
    k8s_liveness_probe_timeout: i64 = "K8S_LIVENESS_PROBE_TIMEOUT", Int, DefaultValue::Int(1);
    k8s_monitoring_enabled: bool = "K8S_MONITORING_ENABLED", Bool, DefaultValue::Bool(false);
    k8s_monitoring_namespace: String = "K8S_MONITORING_NAMESPACE", Text, DefaultValue::Text("monitoring");
    k8s_monitoring_path: String = "K8S_MONITORING_PATH", Text, DefaultValue::Text("/metrics");
    k8s_monitoring_port: Option<i64> = "K8S_MONITORING_PORT", Int, DefaultValue::Null;
    k8s_namespace: String = "K8S_NAMESPACE", Text, DefaultValue::Text("");
    k8s_persistent_storage: bool = "K8S_PERSISTENT_STORAGE", Bool, DefaultValue::Bool(false);
    k8s_persistent_storage_access_mode: String = "K8S_PERSISTENT_STORAGE_ACCESS_MODE", Text, DefaultValue::Text("ReadWriteOnce");
    k8s_persistent_storage_path: String = "K8S_PERSISTENT_STORAGE_PATH", Text, DefaultValue::Text("");
    k8s_persistent_storage_size: String = "K8S_PERSISTENT_STORAGE_SIZE", Text, DefaultValue::Text("1Gi");
    k8s_persistent_storage_storage_type: String = "K8S_PERSISTENT_STORAGE_STORAGE_TYPE", Text, DefaultValue::Text("standard");
    k8s_pod_security: String = "K8S_POD_SECURITY", Text, DefaultValue::Text("");
    k8s_probe_failure_threshold: i64 = "K8S_PROBE_FAILURE_THRESHOLD", Int, DefaultValue::Int(3);
    k8s_probe_initial_delay: i64 = "K8S_PROBE_INITIAL_DELAY", Int, DefaultValue::Int(60);
    k8s_probe_period: i64 = "K8S_PROBE_PERIOD", Int, DefaultValue::Int(10);
    k8s_readiness_file: String = "K8S_READINESS_FILE", Text, DefaultValue::Text("");
    k8s_readiness_path: String = "K8S_READINESS_PATH", Text, DefaultValue::Text("/readiness");
    k8s_readiness_probe_timeout: i64 = "K8S_READINESS_PROBE_TIMEOUT", Int, DefaultValue::Int(1);
    k8s_replicacount: i64 = "K8S_REPLICACOUNT", Int, DefaultValue::Int(1);
    k8s_request_cpu: String = "K8S_REQUEST_CPU", Text, DefaultValue::Text("50m");
    k8s_request_ram: String = "K8S_REQUEST_RAM", Text, DefaultValue::Text("128Mi");
    k8s_secret_prefix: String = "K8S_SECRET_PREFIX", Text, DefaultValue::Text("K8S_SECRET_");
    k8s_temp_storage_path: String = "K8S_TEMP_STORAGE_PATH", Text, DefaultValue::Text("");
    kubeconfig: String = "KUBECONFIG", Text, DefaultValue::Text("");
    mysql_version_tag: String = "MYSQL_VERSION_TAG", Text, DefaultValue::Text("5.7");
    postgres_image: String = "POSTGRES_IMAGE", Text, DefaultValue::Text("docker.io/bitnami/postgresql:9.6");
    pr_assignees: String = "PR_ASSIGNEES", Text, DefaultValue::Text("");
    pr_id: String = "PR_ID", Text, DefaultValue::Text("");
    pr_title: String = "PR_TITLE", Text, DefaultValue::Text("");
    pr_url: String = "PR_URL", Text, DefaultValue::Text("");
    project_dir: String = "PROJECT_DIR", Text, DefaultValue::Text("");
    project_id: String = "PROJECT_ID", Text, DefaultValue::Text("");
    project_name: String = "PROJECT_NAME", Text, DefaultValue::Text("");
    project_path_slug: String = "PROJECT_PATH_SLUG", Text, DefaultValue::Text("");
    rabbitmq_version_tag: String = "RABBITMQ_VERSION_TAG", Text, DefaultValue::Text("3.8.5");
    service_artifact_folder: String = "SERVICE_ARTIFACT_FOLDER", Text, DefaultValue::Text("");
    service_port: i64 = "SERVICE_PORT", Int, DefaultValue::Int(8000);
    track: String = "TRACK", Text, DefaultValue::Text("");
    vault_addr: String = "VAULT_ADDR", Text, DefaultValue::Text("");
    vault_jwt: String = "VAULT_JWT", Text, DefaultValue::Text("");
    vault_jwt_auth_path: String = "VAULT_JWT_AUTH_PATH", Text, DefaultValue::Text("jwt");
    vault_jwt_private_key: String = "VAULT_JWT_PRIVATE_KEY", Text, DefaultValue::Text("");
    vault_kv_secret_mount_point: String = "VAULT_KV_SECRET_MOUNT_POINT", Text, DefaultValue::Text("project_secrets");
    vault_kv_version: i64 = "VAULT_KV_VERSION", Int, DefaultValue::Int(2);
    vault_project_secret_name: String = "VAULT_PROJECT_SECRET_NAME", Text, DefaultValue::Text("");
    vault_tf_secrets: bool = "VAULT_TF_SECRETS", Bool, DefaultValue::Bool(false);
    vault_tls_enabled: bool = "VAULT_TLS_ENABLED", Bool, DefaultValue::Bool(true);
}

impl Settings {
    /// Pick the deployment track: `explicit`, then `TRACK`, then `DEFAULT_TRACK`.
    pub fn track(&self, explicit: Option<&str>) -> String {
        explicit
            .filter(|t| !t.is_empty())
            .or_else(|| Some(self.track.as_str()).filter(|t| !t.is_empty()))
            .unwrap_or(self.default_track.as_str())
            .to_string()
    }

    /// The project payload handed to deployment hooks.
    pub fn project(&self, track: &str) -> Project {
        Project {
            name: self.project_name.clone(),
            track: track.to_string(),
            image: self.docker_image_name.clone(),
            url: self.environment_url.clone(),
            additional_urls: self.k8s_additional_hostnames.clone(),
            basic_auth_users: self.k8s_ingress_basic_auth.clone(),
            initialize_command: self.app_initialize_command.clone(),
            migrate_command: self.app_migrate_command.clone(),
            liveness_path: self.k8s_liveness_path.clone(),
            readiness_path: self.k8s_readiness_path.clone(),
            probe_failure_threshold: self.k8s_probe_failure_threshold,
            probe_initial_delay: self.k8s_probe_initial_delay,
            probe_period: self.k8s_probe_period,
            replica_count: self.k8s_replicacount,
            request_cpu: self.k8s_request_cpu.clone(),
            request_ram: self.k8s_request_ram.clone(),
            limit_cpu: self.k8s_limit_cpu.clone(),
            limit_ram: self.k8s_limit_ram.clone(),
            service_port: self.service_port,
        }
    }
}

/// Whether a setting holds a credential and should be masked when shown.
pub fn is_sensitive(name: &str) -> bool {
    SENSITIVE_FRAGMENTS
        .iter()
        .any(|fragment| name.contains(fragment))
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let values = self.values();
        let mut map = serializer.serialize_map(Some(values.len()))?;
        for (name, value) in &values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
pub(crate) fn default_values() -> BTreeMap<&'static str, Value> {
    VARIABLES
        .iter()
        .map(|d| (d.name, d.default.materialize(d.parser)))
        .collect()
}
