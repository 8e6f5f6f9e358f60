//! Error types for the DeskPilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The top-level error type for all DeskPilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Run errors ---
    #[error("Run error: {0}")]
    Run(#[from] RunError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the model capability. Any of these is fatal for a run.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

impl ToolError {
    /// Shorthand used by tool bodies when a backend call fails.
    pub fn failed(tool_name: &str, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Run-level error taxonomy.
///
/// Carried as data in a run result rather than propagated, so the caller
/// always gets the partial tool-call history alongside the reason.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunError {
    #[error("unknown tool requested: {name}")]
    UnknownTool { name: String },

    #[error("tool {name} failed: {reason}")]
    ToolExecution { name: String, reason: String },

    #[error("model call failed: {message}")]
    ModelCall { message: String },

    #[error("maximum iterations exceeded ({cap})")]
    MaxIterationsExceeded { cap: u32 },

    #[error("blocked by guard rail: {rule}")]
    GuardRailBlock { rule: String },

    #[error("run timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },
}

impl RunError {
    /// Soft failures keep their partial history meaningful and route to a human.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::MaxIterationsExceeded { .. } | Self::GuardRailBlock { .. } | Self::TimedOut { .. }
        )
    }
}

impl From<ProviderError> for RunError {
    fn from(err: ProviderError) -> Self {
        Self::ModelCall {
            message: err.to_string(),
        }
    }
}

impl From<&ToolError> for RunError {
    fn from(err: &ToolError) -> Self {
        match err {
            ToolError::NotFound(name) => Self::UnknownTool { name: name.clone() },
            ToolError::ExecutionFailed { tool_name, reason } => Self::ToolExecution {
                name: tool_name.clone(),
                reason: reason.clone(),
            },
            ToolError::InvalidArguments(reason) => Self::ToolExecution {
                name: String::new(),
                reason: reason.clone(),
            },
        }
    }
}
