//! Configuration resolution errors.

use crate::parsers::ParseError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration schema error: {0}")]
    Schema(String),

    #[error("no project name could be found")]
    MissingProjectName,

    #[error("invalid value for {variable}: {source}")]
    Parse {
        variable: String,
        #[source]
        source: ParseError,
    },

    #[error("invalid value from CI variable {variable}={value:?}: {source}")]
    InvalidCiValue {
        variable: String,
        value: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to read env file {}: {source}", .path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid env file key {0:?}")]
    InvalidEnvKey(String),

    #[error("no cluster configuration found")]
    NoClusterConfig,

    #[error("settings have already been installed")]
    AlreadyInstalled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
