//! Structured errors for record/replay
//!
//! Every failure carries a machine-readable code plus optional JSON context
//! (action index, file path) so callers can log or report it as-is.

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("[{code:?}] {message}")]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Persisted sequence/chain file is missing required structure
    Format,
    /// A single action could not be dispatched to the driver
    ActionExecution,
    /// A chain entry's sequence file could not be read or parsed
    ChainItemLoad,
    /// Retryable driver failure
    Transient,
    /// Non-retryable driver failure
    DriverFailure,
    /// The driver or build does not support the operation
    Unsupported,
    Config,
    Io,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn format(path: &str, reason: &str) -> Self {
        Self::new(ErrorCode::Format, format!("Invalid file '{}': {}", path, reason))
            .with_context(serde_json::json!({ "path": path }))
    }

    /// Wraps a failure of the action at `index`, keeping the original code in the context.
    pub fn action_execution(index: usize, action: &str, cause: &Error) -> Self {
        Self::new(
            ErrorCode::ActionExecution,
            format!("Action {} ({}) failed: {}", index, action, cause.message),
        )
        .with_context(serde_json::json!({
            "index": index,
            "action": action,
            "cause": cause.code,
        }))
    }

    pub fn chain_item_load(item: usize, path: &str, cause: &Error) -> Self {
        Self::new(
            ErrorCode::ChainItemLoad,
            format!("Chain item {} ('{}') could not be loaded: {}", item, path, cause.message),
        )
        .with_context(serde_json::json!({ "item": item, "path": path }))
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Transient, message)
    }

    pub fn driver(operation: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::DriverFailure,
            format!("{} failed: {}", operation, reason),
        )
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unsupported, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.code == ErrorCode::Transient
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorCode::Io, e.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Self::new(ErrorCode::DriverFailure, format!("{:#}", e))
    }
}
