//! Outcome classification and escalation routing.
//!
//! Both functions are pure over a tool-call record list, so a stored record
//! always reproduces the same outcome.

use deskpilot_core::catalog::{self, CLOSE_TICKET_FLAG, ESCALATE_TO_DEVOPS, RESPOND_TO_CUSTOMER};
use deskpilot_core::outcome::{EscalationTarget, Outcome};
use deskpilot_core::record::ToolCallRecord;

/// Classify a completed run from its tool calls.
///
/// 1. Any escalation call: `Escalated`.
/// 2. A customer reply: `Resolved` when it closed the ticket, else `Responded`.
/// 3. Any other tool call: `Responded`.
/// 4. Nothing: `Pending`.
pub fn classify(records: &[ToolCallRecord]) -> Outcome {
    if records.iter().any(|r| catalog::is_escalation(&r.name)) {
        return Outcome::Escalated;
    }

    if let Some(reply) = records.iter().rev().find(|r| r.name == RESPOND_TO_CUSTOMER) {
        return if reply.input_flag(CLOSE_TICKET_FLAG) {
            Outcome::Resolved
        } else {
            Outcome::Responded
        };
    }

    if records.is_empty() {
        Outcome::Pending
    } else {
        Outcome::Responded
    }
}

/// Where an escalated run goes: devops wins over human.
pub fn escalation_target(records: &[ToolCallRecord]) -> Option<EscalationTarget> {
    if records.iter().any(|r| r.name == ESCALATE_TO_DEVOPS) {
        Some(EscalationTarget::Devops)
    } else if records.iter().any(|r| catalog::is_escalation(&r.name)) {
        Some(EscalationTarget::Human)
    } else {
        None
    }
}

/// Replies that actually reached the customer.
pub fn replies_sent(records: &[ToolCallRecord]) -> u32 {
    records
        .iter()
        .filter(|r| r.name == RESPOND_TO_CUSTOMER && !r.is_error())
        .count() as u32
}
