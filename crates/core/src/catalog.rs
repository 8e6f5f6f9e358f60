//! Names of the support tool catalogue.
//!
//! Shared vocabulary between the tool implementations, the guard rails and
//! the outcome classifier, so none of them matches on stray string literals.

pub const CHECK_CONNECTION_STATUS: &str = "check_connection_status";
pub const LOOKUP_KNOWN_ISSUES: &str = "lookup_known_issues";
pub const TRIGGER_REAUTH: &str = "trigger_reauth";
pub const ESCALATE_TO_ADMIN: &str = "escalate_to_admin";
pub const ESCALATE_TO_DEVOPS: &str = "escalate_to_devops";
pub const RESPOND_TO_CUSTOMER: &str = "respond_to_customer";

/// Input flag on `respond_to_customer` that closes the ticket.
pub const CLOSE_TICKET_FLAG: &str = "close_ticket";

/// Tools whose invocation hands the ticket to a person or to engineering.
pub fn is_escalation(name: &str) -> bool {
    name == ESCALATE_TO_ADMIN || name == ESCALATE_TO_DEVOPS
}

/// Tools that count as a decisive action for a conversation.
pub fn is_terminal(name: &str) -> bool {
    name == RESPOND_TO_CUSTOMER || is_escalation(name)
}
