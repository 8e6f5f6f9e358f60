//! Tool-call audit records.
//!
//! One [`ToolCallRecord`] per tool invocation, appended in invocation order.
//! The list is the evidence every downstream decision (classification,
//! escalation routing) is recomputed from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a tool invocation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { output: serde_json::Value },
    Error { error: String },
}

/// The audit entry for a single tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// The model's tool-use id
    pub id: String,

    /// Requested tool name (may not exist in the registry)
    pub name: String,

    /// Input exactly as the model sent it
    pub input: serde_json::Value,

    #[serde(flatten)]
    pub outcome: ToolOutcome,

    pub timestamp: DateTime<Utc>,
}

impl ToolCallRecord {
    pub fn success(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            outcome: ToolOutcome::Success { output },
            timestamp: Utc::now(),
        }
    }

    pub fn error(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            outcome: ToolOutcome::Error { error: error.into() },
            timestamp: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Error { .. })
    }

    /// A boolean flag from the input; absent or non-boolean reads as `false`.
    pub fn input_flag(&self, key: &str) -> bool {
        self.input.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// A string field from the input.
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(|v| v.as_str())
    }

    /// The text relayed back to the model for this call.
    pub fn result_text(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success { output } => output.to_string(),
            ToolOutcome::Error { error } => format!("Error: {error}"),
        }
    }
}
