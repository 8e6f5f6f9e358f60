//! Connection status tool — reports the health of a customer's integrations.
//!
//! Read-only. With no `integration` argument every known connection for the
//! ticket's customer is listed.

use async_trait::async_trait;
use deskpilot_core::catalog::CHECK_CONNECTION_STATUS;
use deskpilot_core::error::ToolError;
use deskpilot_core::tool::{ParamKind, ParameterSchema, Tool, ToolContext};
use std::sync::Arc;

use crate::backend::SupportBackend;

pub struct ConnectionStatusTool {
    backend: Arc<dyn SupportBackend>,
}

impl ConnectionStatusTool {
    pub fn new(backend: Arc<dyn SupportBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ConnectionStatusTool {
    fn name(&self) -> &str {
        CHECK_CONNECTION_STATUS
    }

    fn description(&self) -> &str {
        "Check the status of the customer's integrations (active, expired, error, disconnected). \
         Use this first when a ticket mentions sync problems or missing data."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().optional(
            "integration",
            ParamKind::String,
            "Limit the check to one integration, e.g. 'moneybird'",
        )
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, ToolError> {
        let integration = input["integration"].as_str();
        let connections = self
            .backend
            .connection_status(&ctx.customer_id, integration)
            .await
            .map_err(|e| ToolError::failed(CHECK_CONNECTION_STATUS, e.to_string()))?;

        Ok(serde_json::json!({
            "customer_id": ctx.customer_id,
            "connections": connections,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ConnectionState, StubBackend};

    fn ctx() -> ToolContext {
        ToolContext::new("T-1", "C-42")
    }

    #[tokio::test]
    async fn reports_expired_connection() {
        let backend = Arc::new(StubBackend::new().with_connection("moneybird", ConnectionState::Expired));
        let tool = ConnectionStatusTool::new(backend);

        let out = tool
            .execute(serde_json::json!({"integration": "moneybird"}), &ctx())
            .await
            .unwrap();
        assert_eq!(out["customer_id"], "C-42");
        assert_eq!(out["connections"][0]["status"], "expired");
    }

    #[tokio::test]
    async fn lists_all_without_filter() {
        let backend = Arc::new(
            StubBackend::new()
                .with_connection("moneybird", ConnectionState::Active)
                .with_connection("bunq", ConnectionState::Error),
        );
        let tool = ConnectionStatusTool::new(backend);
        let out = tool.execute(serde_json::json!({}), &ctx()).await.unwrap();
        assert_eq!(out["connections"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn backend_failure_is_tool_error() {
        let tool = ConnectionStatusTool::new(Arc::new(StubBackend::new().unavailable()));
        let err = tool.execute(serde_json::json!({}), &ctx()).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed { .. }));
    }

    #[test]
    fn integration_is_optional() {
        let tool = ConnectionStatusTool::new(Arc::new(StubBackend::new()));
        assert!(tool.parameters().required_names().is_empty());
    }
}
