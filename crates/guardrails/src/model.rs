//! Guard-rail data model: rules, decisions, verdicts.

use chrono::{DateTime, Utc};
use deskpilot_core::outcome::EscalationTarget;
use serde::{Deserialize, Serialize};

/// The guard rails, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    HumanRequest,
    BlockedContent,
    ResponseCeiling,
    LowConfidence,
}

impl RuleId {
    pub const ALL: [RuleId; 4] = [
        Self::HumanRequest,
        Self::BlockedContent,
        Self::ResponseCeiling,
        Self::LowConfidence,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HumanRequest => "human_request",
            Self::BlockedContent => "blocked_content",
            Self::ResponseCeiling => "response_ceiling",
            Self::LowConfidence => "low_confidence",
        }
    }

    /// Whether the rule inspects a drafted answer.
    pub fn needs_draft(self) -> bool {
        matches!(self, Self::BlockedContent | Self::LowConfidence)
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// No rule fired; the model's output stands.
    Allow,
    /// The drafted content must not reach the customer.
    Block,
    /// Hand the ticket to a person.
    Escalate,
}

/// How much a drafted answer can be trusted to go out unreviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// The run took a terminal action.
    Decisive,
    /// Plain text with no hedging.
    Tentative,
    /// Empty or hedged text.
    Speculative,
}

/// The result of a guard-rail evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardRailVerdict {
    /// The rule that fired, if any.
    pub rule_id: Option<RuleId>,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EscalationTarget>,
    /// Customer-facing text to send in place of the model's draft.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl GuardRailVerdict {
    /// No rule fired.
    pub fn allow() -> Self {
        Self {
            rule_id: None,
            decision: Decision::Allow,
            target: None,
            message: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn fired(rule: RuleId, decision: Decision, message: impl Into<String>) -> Self {
        Self {
            rule_id: Some(rule),
            decision,
            target: Some(EscalationTarget::Human),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Decision::Allow
    }
}
