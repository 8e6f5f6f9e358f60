//! # DeskPilot Core
//!
//! Domain types, traits, and error definitions for the DeskPilot support
//! agent runtime. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is defined as a trait here (`Provider`, `Tool`).
//! Implementations live in their respective crates. This enables:
//! - Swapping the model backend via configuration
//! - Easy testing with scripted providers and stub tools
//! - Clean dependency graph (all crates depend inward on core)

pub mod catalog;
pub mod error;
pub mod event;
pub mod message;
pub mod outcome;
pub mod provider;
pub mod record;
pub mod ticket;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, RunError, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{ContentBlock, Message, MessageContent, Role};
pub use outcome::{EscalationTarget, Outcome};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StopReason, Usage};
pub use record::{ToolCallRecord, ToolOutcome};
pub use ticket::ConversationContext;
pub use tool::{
    ParamKind, ParamSpec, ParameterSchema, Tool, ToolContext, ToolDefinition, ToolRegistry,
    ToolRegistryBuilder,
};
