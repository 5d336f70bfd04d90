//! Plugin loading errors.

use deckhand_config::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Required variables not set: {missing:?}")]
    MissingConfiguration { missing: Vec<String> },

    #[error("{0}")]
    NotEnabled(String),

    #[error("invalid value for {variable}: {source}")]
    InvalidVariable {
        variable: String,
        #[source]
        source: ParseError,
    },

    #[error("plugin {0} is already registered")]
    Duplicate(String),

    #[error("plugin setup failed: {0}")]
    Setup(String),
}
