//! Support tool catalogue for DeskPilot.
//!
//! Tools give the agent a bounded set of actions on a ticket: inspect the
//! customer's integrations, look up known issues, trigger reauthorisation,
//! escalate, and reply. Every side effect goes through a [`SupportBackend`].

pub mod backend;
pub mod connection_status;
pub mod escalate;
pub mod known_issues;
pub mod reauth;
pub mod respond;

use deskpilot_core::tool::ToolRegistry;
use std::sync::Arc;

pub use backend::{
    BackendError, ConnectionState, ConnectionStatus, CustomerReply, EscalationRequest,
    KnownIssue, Priority, ReauthLink, SideEffect, StubBackend, SupportBackend,
};

/// Build the support registry with every catalogue tool bound to `backend`.
pub fn support_registry(backend: Arc<dyn SupportBackend>) -> ToolRegistry {
    ToolRegistry::builder()
        .register(Box::new(connection_status::ConnectionStatusTool::new(backend.clone())))
        .register(Box::new(known_issues::KnownIssuesTool::new(backend.clone())))
        .register(Box::new(reauth::ReauthTool::new(backend.clone())))
        .register(Box::new(escalate::EscalateTool::admin(backend.clone())))
        .register(Box::new(escalate::EscalateTool::devops(backend.clone())))
        .register(Box::new(respond::RespondTool::new(backend)))
        .build()
}
