//! Error types for relay-core

use thiserror::Error;

use crate::agents::AgentName;

/// Main error type for relay-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("agent '{agent}' cannot handle task type '{task_type}'")]
    UnsupportedTaskType { agent: AgentName, task_type: String },

    #[error("executor failed: {0}")]
    Execution(String),

    #[error("no response within {ms}ms")]
    Timeout { ms: u64 },

    #[error("delegation chain depth {depth} exceeds maximum {max}")]
    ChainDepthExceeded { depth: u32, max: u32 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for relay-core
pub type Result<T> = std::result::Result<T, Error>;
