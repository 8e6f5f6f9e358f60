//! Guard rails — deterministic limits that do not depend on the model.
//!
//! Rules run in strict precedence order and the first one that fires decides
//! the turn:
//!
//! 1. **Human request**: the customer asks for a person.
//! 2. **Blocked content**: the drafted answer touches a forbidden topic
//!    (refunds, account deletion, credentials, payment data, promises).
//! 3. **Response ceiling**: too many automated replies already sent.
//! 4. **Low confidence**: the draft is hedged or empty and no terminal
//!    action was taken.
//!
//! ```text
//! ┌──────────────┐  inbound   ┌──────────────┐   draft    ┌──────────────┐
//! │   Customer   │───────────▶│  Guard-Rail  │◀───────────│    Driver    │
//! │   message    │            │    Engine    │            │  (tool loop) │
//! └──────────────┘            └──────┬───────┘            └──────────────┘
//!                                    │
//!                              ┌─────┴─────┐
//!                              │  Verdict  │
//!                              │ Allow     │
//!                              │ Block     │
//!                              │ Escalate  │
//!                              └───────────┘
//! ```

mod engine;
mod model;
pub mod patterns;

pub use engine::{GuardRailEngine, GuardRailInput, GuardRailLogEntry};
pub use model::{Confidence, Decision, GuardRailVerdict, RuleId};

/// Errors from the guard-rail subsystem.
#[derive(Debug, thiserror::Error)]
pub enum GuardRailError {
    #[error("invalid guard-rail pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
