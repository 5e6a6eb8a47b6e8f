//! Procedure execution error types.

use thiserror::Error;

/// Result type for procedure operations.
pub type ProcedureResult<T> = Result<T, ProcedureError>;

/// Errors that halt a procedure run.
#[derive(Debug, Error)]
pub enum ProcedureError {
    /// A step read a state key that no earlier step produced.
    #[error("Step '{step}' references state key '{key}' which has not been set")]
    MissingStateKey { step: String, key: String },

    /// The automation attached to a step failed.
    #[error("Automation for step '{step}' failed: {source}")]
    AutomationFailure {
        step: String,
        #[source]
        source: anyhow::Error,
    },

    /// Step text could not be rendered.
    #[error("Failed to render step '{step}': {message}")]
    RenderFailure { step: String, message: String },

    /// Emitting output or waiting on a prompt failed.
    #[error("Interaction failed: {0}")]
    Interaction(#[from] std::io::Error),
}
