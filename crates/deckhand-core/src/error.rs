//! Error types for deckhand pipeline phases.

use thiserror::Error;

/// Failure of a pipeline phase.
///
/// Collaborators that wrap external tools translate their failures into this
/// type before returning from a lifecycle scope, so every `*_complete` hook
/// observes the same error value the caller receives.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("command `{command}` failed with exit code {}", exit_code(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("deployment failed: {0}")]
    DeploymentFailed(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("lifecycle scope `{0}` ended without completion")]
    ScopeAbandoned(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}
