//! Escalation tools — hand a ticket to human support or to engineering.
//!
//! Both tools share one implementation parameterised by queue. Calling either
//! one is terminal for the conversation: the router classifies the ticket as
//! escalated regardless of what else happened.

use async_trait::async_trait;
use deskpilot_core::catalog::{ESCALATE_TO_ADMIN, ESCALATE_TO_DEVOPS};
use deskpilot_core::error::ToolError;
use deskpilot_core::outcome::EscalationTarget;
use deskpilot_core::tool::{ParamKind, ParameterSchema, Tool, ToolContext};
use std::sync::Arc;
use tracing::info;

use crate::backend::{EscalationRequest, Priority, SupportBackend};

pub struct EscalateTool {
    target: EscalationTarget,
    backend: Arc<dyn SupportBackend>,
}

impl EscalateTool {
    /// `escalate_to_admin`: route to human support staff.
    pub fn admin(backend: Arc<dyn SupportBackend>) -> Self {
        Self {
            target: EscalationTarget::Human,
            backend,
        }
    }

    /// `escalate_to_devops`: route to the engineering queue.
    pub fn devops(backend: Arc<dyn SupportBackend>) -> Self {
        Self {
            target: EscalationTarget::Devops,
            backend,
        }
    }
}

#[async_trait]
impl Tool for EscalateTool {
    fn name(&self) -> &str {
        match self.target {
            EscalationTarget::Human => ESCALATE_TO_ADMIN,
            EscalationTarget::Devops => ESCALATE_TO_DEVOPS,
        }
    }

    fn description(&self) -> &str {
        match self.target {
            EscalationTarget::Human => {
                "Escalate the ticket to a human support agent. Use when the customer asks for a \
                 person, when the request needs account changes you cannot make, or when unsure."
            }
            EscalationTarget::Devops => {
                "Escalate the ticket to engineering. Use for platform bugs, outages, or \
                 integration failures that reauthorisation does not fix."
            }
        }
    }

    fn parameters(&self) -> ParameterSchema {
        let schema = ParameterSchema::new()
            .required("reason", ParamKind::String, "Why the ticket needs escalation")
            .optional(
                "priority",
                ParamKind::String,
                "One of low, normal, high, urgent (default normal)",
            );
        match self.target {
            EscalationTarget::Devops => schema.optional(
                "error_code",
                ParamKind::String,
                "Error code observed, if any",
            ),
            EscalationTarget::Human => schema,
        }
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, ToolError> {
        let reason = input["reason"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'reason' argument".into()))?;
        let priority = Priority::parse(input["priority"].as_str());

        let request = EscalationRequest {
            ticket_id: ctx.ticket_id.clone(),
            customer_id: ctx.customer_id.clone(),
            target: self.target,
            reason: reason.to_string(),
            priority: priority.clone(),
            error_code: input["error_code"].as_str().map(String::from),
        };

        let reference = self
            .backend
            .escalate(request)
            .await
            .map_err(|e| ToolError::failed(self.name(), e.to_string()))?;

        info!(ticket = %ctx.ticket_id, target = %self.target, %reference, "Ticket escalated");

        Ok(serde_json::json!({
            "escalated": true,
            "queue": self.target,
            "reference": reference,
            "priority": priority,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SideEffect, StubBackend};

    #[test]
    fn names_follow_queue() {
        let backend: Arc<dyn SupportBackend> = Arc::new(StubBackend::new());
        assert_eq!(EscalateTool::admin(backend.clone()).name(), "escalate_to_admin");
        assert_eq!(EscalateTool::devops(backend).name(), "escalate_to_devops");
    }

    #[test]
    fn only_devops_takes_error_code() {
        let backend: Arc<dyn SupportBackend> = Arc::new(StubBackend::new());
        let has_code = |t: EscalateTool| t.parameters().params.iter().any(|p| p.name == "error_code");
        assert!(has_code(EscalateTool::devops(backend.clone())));
        assert!(!has_code(EscalateTool::admin(backend)));
    }

    #[tokio::test]
    async fn devops_escalation_reaches_backend() {
        let backend = Arc::new(StubBackend::new());
        let tool = EscalateTool::devops(backend.clone());

        let out = tool
            .execute(
                serde_json::json!({"reason": "sync broken", "priority": "high", "error_code": "E500"}),
                &ToolContext::new("T-3", "C-3"),
            )
            .await
            .unwrap();

        assert_eq!(out["queue"], "devops");
        assert_eq!(out["priority"], "high");
        assert!(out["reference"].as_str().unwrap().starts_with("ESC-"));

        match &backend.effects()[0] {
            SideEffect::Escalation(req) => {
                assert_eq!(req.ticket_id, "T-3");
                assert_eq!(req.target, EscalationTarget::Devops);
                assert_eq!(req.error_code.as_deref(), Some("E500"));
            }
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_names_the_tool() {
        let tool = EscalateTool::admin(Arc::new(StubBackend::new().unavailable()));
        let err = tool
            .execute(serde_json::json!({"reason": "x"}), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("escalate_to_admin"));
    }
}
