//! LLM Provider implementations for DeskPilot.
//!
//! All providers implement the `deskpilot_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod anthropic;
pub mod router;

pub use anthropic::AnthropicProvider;
pub use router::ProviderRouter;
