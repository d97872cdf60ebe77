//! Engine error types.
//!
//! Every failure in this subsystem is a structured, recoverable value;
//! nothing here panics across the engine boundary, and nothing retries.
//! Retry policy, where it exists at all, belongs to the network layer
//! outside this crate.

use thiserror::Error;

use pagepilot_store::StoreError;

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Unified error type for the automation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The field matcher exhausted all strategies for a hint.
    #[error("no field matched \"{hint}\"")]
    NoMatch {
        hint: String,
        /// Ranked near-miss labels for operator feedback.
        suggestions: Vec<String>,
    },

    /// A `ProfileRef` fill referenced a key the profile does not hold.
    #[error("profile has no value for \"{key}\"")]
    ProfileKeyMissing { key: String },

    /// Recording stopped with nothing captured.
    #[error("nothing recorded")]
    EmptyRecording,

    /// The referenced macro does not exist.
    #[error("macro not found: {name}")]
    MacroNotFound { name: String },

    /// The referenced template does not exist.
    #[error("template not found: {name}")]
    TemplateNotFound { name: String },

    /// The referenced workflow does not exist.
    #[error("workflow not found: {name}")]
    WorkflowNotFound { name: String },

    /// A workflow with no steps cannot be executed or saved.
    #[error("workflow has no steps")]
    EmptyWorkflow,

    /// A save command found nothing to persist.
    #[error("nothing to save: {0}")]
    NothingToSave(&'static str),

    /// A page-level operation failed in the driver.
    #[error("page action `{action}` failed: {reason}")]
    PageAction { action: &'static str, reason: String },

    /// An error propagated from the persistence layer.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
