//! Routable outcomes of a finished conversation.

use serde::{Deserialize, Serialize};

/// What happened to a ticket after an agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Customer was answered and the ticket closed
    Resolved,
    /// Customer was answered (or work happened) but the ticket stays open
    Responded,
    /// Routed to a person or to engineering
    Escalated,
    /// Nothing actionable happened
    Pending,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Resolved => "resolved",
            Self::Responded => "responded",
            Self::Escalated => "escalated",
            Self::Pending => "pending",
        };
        f.write_str(s)
    }
}

/// The queue an escalated conversation is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTarget {
    /// Engineering queue
    Devops,
    /// Human support staff
    Human,
}

impl std::fmt::Display for EscalationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Devops => f.write_str("devops"),
            Self::Human => f.write_str("human"),
        }
    }
}
