//! The support agent runtime — the heart of DeskPilot.
//!
//! A ticket flows through four stages:
//!
//! 1. **Guard rails (pre-flight)**: a request for a person or a spent
//!    response budget escalates before the model is ever called
//! 2. **Driver**: a bounded tool-use loop against the model provider
//! 3. **Guard rails (post-run)**: the answer that would reach the customer
//!    is screened for blocked content and low confidence
//! 4. **Classifier**: the outcome and escalation target are derived from
//!    the tool-call record
//!
//! The loop continues until the model answers with text only or the
//! iteration cap is reached.

pub mod classifier;
pub mod driver;
pub mod prompt;
pub mod support;

#[cfg(test)]
mod test_helpers;

pub use classifier::{classify, escalation_target, replies_sent};
pub use driver::{
    AgentRunResult, ConversationDriver, DEFAULT_MAX_ITERATIONS, RunProgress, RunState,
    SUPPORT_MAX_ITERATIONS,
};
pub use support::{SupportAgent, TicketResolution};
