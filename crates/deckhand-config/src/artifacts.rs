//! Artifact `.env` files passed between pipeline jobs.
//!
//! Build and service jobs leave `KEY=VALUE` files in their artifact folders.
//! Later jobs fold them into their environment before settings resolve.
//! Values are read literally, see [`crate::envfile`].

use crate::envfile;
use crate::{ConfigError, ConfigResult, Environment};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const BUILD_ARTIFACT_FOLDER: &str = "BUILD_ARTIFACT_FOLDER";
pub const SERVICE_ARTIFACT_FOLDER: &str = "SERVICE_ARTIFACT_FOLDER";

const ENV_FILE_SUFFIX: &str = ".env";

/// Env files found in the configured artifact folders.
///
/// Build folder files come first, then service folder files; each folder is
/// sorted by file name. Missing folders are skipped.
pub fn artifact_env_files(env: &Environment) -> ConfigResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for folder_var in [BUILD_ARTIFACT_FOLDER, SERVICE_ARTIFACT_FOLDER] {
        let Some(folder) = env.path(folder_var) else {
            continue;
        };
        if !folder.is_dir() {
            debug!(folder = %folder.display(), "Artifact folder does not exist");
            continue;
        }

        let mut found = Vec::new();
        for entry in fs::read_dir(&folder)? {
            let path = entry?.path();
            let is_env_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(ENV_FILE_SUFFIX));
            if is_env_file && path.is_file() {
                found.push(path);
            }
        }
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

/// Read every artifact env file, in discovery order.
///
/// Malformed statements are logged and skipped; an unreadable file is an
/// error.
pub fn read_artifact_env_files(env: &Environment) -> ConfigResult<Vec<(String, String)>> {
    let mut vars = Vec::new();

    for path in artifact_env_files(env)? {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::EnvFile {
            path: path.clone(),
            source,
        })?;
        for statement in envfile::parse(&content) {
            match statement {
                Ok(pair) => vars.push(pair),
                Err(e) => warn!(file = %path.display(), error = %e, "Skipping env file statement"),
            }
        }
        debug!(file = %path.display(), "Read artifact env file");
    }

    Ok(vars)
}

/// Fold artifact env files into `env` without overriding anything already set.
///
/// Returns the number of variables added.
pub fn merge_artifact_env_files(env: &mut Environment) -> ConfigResult<usize> {
    let vars = read_artifact_env_files(env)?;
    Ok(env.merge_missing(vars))
}

/// Write `vars` as an env file into `dir`, creating it if needed.
///
/// Values are single-quoted and escaped so they read back unchanged. `.env`
/// is appended to `name` when missing.
pub fn write_artifact_env_file<I, K, V>(dir: &Path, name: &str, vars: I) -> ConfigResult<PathBuf>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let file_name = if name.ends_with(ENV_FILE_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{ENV_FILE_SUFFIX}")
    };

    let mut content = String::new();
    for (key, value) in vars {
        let key = key.as_ref();
        if !envfile::is_valid_key(key) {
            return Err(ConfigError::InvalidEnvKey(key.to_string()));
        }
        content.push_str(&envfile::quote_statement(key, value.as_ref()));
        content.push('\n');
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let mut file = fs::File::create(&path)?;
    file.write_all(content.as_bytes())?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env_with_folders(build: &Path, service: &Path) -> Environment {
        Environment::from_iter([
            (BUILD_ARTIFACT_FOLDER, build.display().to_string()),
            (SERVICE_ARTIFACT_FOLDER, service.display().to_string()),
        ])
    }

    #[test]
    fn test_discovers_env_files_in_order() {
        let build = TempDir::new().unwrap();
        let service = TempDir::new().unwrap();
        fs::write(build.path().join("b.env"), "B=1\n").unwrap();
        fs::write(build.path().join("a.env"), "A=1\n").unwrap();
        fs::write(build.path().join("notes.txt"), "X=1\n").unwrap();
        fs::write(service.path().join(".env"), "S=1\n").unwrap();

        let files = artifact_env_files(&env_with_folders(build.path(), service.path())).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.env", "b.env", ".env"]);
    }

    #[test]
    fn test_missing_folders_are_skipped() {
        let env = Environment::from_iter([(BUILD_ARTIFACT_FOLDER, "/nonexistent/artifacts")]);
        assert!(artifact_env_files(&env).unwrap().is_empty());
        assert!(artifact_env_files(&Environment::new()).unwrap().is_empty());
    }

    #[test]
    fn test_merge_does_not_override() {
        let build = TempDir::new().unwrap();
        let service = TempDir::new().unwrap();
        fs::write(build.path().join("build.env"), "IMAGE=app:1\nSHARED=build\n").unwrap();
        fs::write(service.path().join("db.env"), "SHARED=service\nDB_HOST=db\n").unwrap();

        let mut env = env_with_folders(build.path(), service.path()).with("IMAGE", "from-process");
        let added = merge_artifact_env_files(&mut env).unwrap();

        assert_eq!(added, 2);
        assert_eq!(env.get("IMAGE"), Some("from-process"));
        assert_eq!(env.get("SHARED"), Some("build"));
        assert_eq!(env.get("DB_HOST"), Some("db"));
    }

    #[test]
    fn test_values_are_not_expanded() {
        let build = TempDir::new().unwrap();
        fs::write(
            build.path().join("build.env"),
            "DATABASE_PASSWORD=pa$word\nCONTAINER_REGISTRY_PASSWORD=x${HOME}y\n",
        )
        .unwrap();

        let mut env = Environment::from_iter([(
            BUILD_ARTIFACT_FOLDER,
            build.path().display().to_string(),
        )]);
        merge_artifact_env_files(&mut env).unwrap();

        assert_eq!(env.get("DATABASE_PASSWORD"), Some("pa$word"));
        assert_eq!(env.get("CONTAINER_REGISTRY_PASSWORD"), Some("x${HOME}y"));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let build = TempDir::new().unwrap();
        fs::write(
            build.path().join("build.env"),
            "APP_MIGRATE_COMMAND=two words\nnot an assignment\nIMAGE=app:1\n",
        )
        .unwrap();

        let mut env = Environment::from_iter([(
            BUILD_ARTIFACT_FOLDER,
            build.path().display().to_string(),
        )]);
        assert_eq!(merge_artifact_env_files(&mut env).unwrap(), 2);
        assert_eq!(env.get("APP_MIGRATE_COMMAND"), Some("two words"));
        assert_eq!(env.get("IMAGE"), Some("app:1"));
    }

    #[test]
    fn test_written_values_round_trip() {
        let dir = TempDir::new().unwrap();
        let vars = [
            ("APP_MIGRATE_COMMAND", "python manage.py migrate --noinput"),
            ("COMMENTED", "value # not a comment"),
            ("QUOTES", r#"it's "fine""#),
            ("DATABASE_PASSWORD", "pa$word ${HOME}"),
            ("BACKSLASHES", r"C:\temp\"),
            ("MULTILINE", "first\nsecond"),
        ];
        write_artifact_env_file(dir.path(), "build", vars).unwrap();

        let mut env = Environment::from_iter([(
            BUILD_ARTIFACT_FOLDER,
            dir.path().display().to_string(),
        )]);
        assert_eq!(merge_artifact_env_files(&mut env).unwrap(), vars.len());
        for (key, value) in vars {
            assert_eq!(env.get(key), Some(value), "{key}");
        }
    }

    #[test]
    fn test_write_rejects_invalid_keys() {
        let dir = TempDir::new().unwrap();
        let err = write_artifact_env_file(dir.path(), "build", [("BAD KEY", "x")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvKey(key) if key == "BAD KEY"));
        assert!(!dir.path().join("build.env").exists());
    }

    #[test]
    fn test_write_then_merge() {
        let dir = TempDir::new().unwrap();
        let artifacts = dir.path().join("artifacts");

        let path = write_artifact_env_file(
            &artifacts,
            "build",
            [("BUILT_DOCKER_TEST_IMAGE", "registry.local/app:dev")],
        )
        .unwrap();
        assert_eq!(path.file_name().unwrap(), "build.env");

        let mut env = Environment::from_iter([(
            BUILD_ARTIFACT_FOLDER,
            artifacts.display().to_string(),
        )]);
        merge_artifact_env_files(&mut env).unwrap();
        assert_eq!(
            env.get("BUILT_DOCKER_TEST_IMAGE"),
            Some("registry.local/app:dev")
        );
    }
}
