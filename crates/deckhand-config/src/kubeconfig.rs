//! Cluster configuration lookup per deployment track.

use crate::{ConfigError, ConfigResult, Environment};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// A kubeconfig file and the variable it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kubeconfig {
    pub path: PathBuf,
    pub variable: String,
}

impl Kubeconfig {
    /// The `KUBECONFIG` pair to hand to cluster tool subprocesses.
    pub fn env_pair(&self) -> (&'static str, String) {
        ("KUBECONFIG", self.path.display().to_string())
    }
}

fn candidates(base: &str, track: &str) -> Vec<String> {
    let mut keys = Vec::with_capacity(2);
    if !track.is_empty() {
        keys.push(format!("{base}_{}", track.to_uppercase()));
    }
    keys.push(base.to_string());
    keys
}

/// Find the kubeconfig for `track`.
///
/// Raw contents in `KUBECONFIG_RAW_<TRACK>` or `KUBECONFIG_RAW` are written
/// to a temporary file that outlives this call. Otherwise the path in
/// `KUBECONFIG_<TRACK>` or `KUBECONFIG` is used. Empty variables are skipped.
pub fn locate_kubeconfig(env: &Environment, track: &str) -> ConfigResult<Kubeconfig> {
    for key in candidates("KUBECONFIG_RAW", track) {
        let Some(contents) = env.get_non_empty(&key) else {
            continue;
        };

        let mut file = tempfile::Builder::new().prefix("kubeconfig-").tempfile()?;
        file.write_all(contents.as_bytes())?;
        let (_, path) = file.keep().map_err(|e| e.error)?;

        info!(variable = %key, path = %path.display(), "Created a kubeconfig file");
        return Ok(Kubeconfig {
            path,
            variable: key,
        });
    }

    for key in candidates("KUBECONFIG", track) {
        if let Some(path) = env.path(&key) {
            return Ok(Kubeconfig { path, variable: key });
        }
    }

    Err(ConfigError::NoClusterConfig)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_track_specific_raw_config_wins() {
        let env = Environment::from_iter([
            ("KUBECONFIG_RAW", "generic"),
            ("KUBECONFIG_RAW_REVIEW", "review contents"),
            ("KUBECONFIG", "/etc/kube/config"),
        ]);
        let found = locate_kubeconfig(&env, "review").unwrap();

        assert_eq!(found.variable, "KUBECONFIG_RAW_REVIEW");
        assert_eq!(fs::read_to_string(&found.path).unwrap(), "review contents");
        fs::remove_file(&found.path).unwrap();
    }

    #[test]
    fn test_generic_raw_config() {
        let env = Environment::from_iter([("KUBECONFIG_RAW", "generic")]);
        let found = locate_kubeconfig(&env, "stable").unwrap();

        assert_eq!(found.variable, "KUBECONFIG_RAW");
        assert_eq!(fs::read_to_string(&found.path).unwrap(), "generic");
        fs::remove_file(&found.path).unwrap();
    }

    #[test]
    fn test_path_fallbacks() {
        let env = Environment::from_iter([
            ("KUBECONFIG_RAW", ""),
            ("KUBECONFIG_STABLE", "/kube/stable"),
            ("KUBECONFIG", "/kube/default"),
        ]);

        let found = locate_kubeconfig(&env, "stable").unwrap();
        assert_eq!(found.variable, "KUBECONFIG_STABLE");
        assert_eq!(found.path, PathBuf::from("/kube/stable"));

        let found = locate_kubeconfig(&env, "").unwrap();
        assert_eq!(found.variable, "KUBECONFIG");
        assert_eq!(found.env_pair(), ("KUBECONFIG", "/kube/default".to_string()));
    }

    #[test]
    fn test_nothing_found() {
        let env = Environment::from_iter([("KUBECONFIG", "")]);
        assert!(matches!(
            locate_kubeconfig(&env, "stable"),
            Err(ConfigError::NoClusterConfig)
        ));
    }
}
