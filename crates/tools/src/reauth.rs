//! Reauthorisation tool — issues a fresh connect link for an expired integration.

use async_trait::async_trait;
use deskpilot_core::catalog::TRIGGER_REAUTH;
use deskpilot_core::error::ToolError;
use deskpilot_core::tool::{ParamKind, ParameterSchema, Tool, ToolContext};
use std::sync::Arc;
use tracing::info;

use crate::backend::SupportBackend;

pub struct ReauthTool {
    backend: Arc<dyn SupportBackend>,
}

impl ReauthTool {
    pub fn new(backend: Arc<dyn SupportBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ReauthTool {
    fn name(&self) -> &str {
        TRIGGER_REAUTH
    }

    fn description(&self) -> &str {
        "Start reauthorisation for an integration whose credentials expired. \
         Returns a link the customer must open to reconnect."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new().required(
            "integration",
            ParamKind::String,
            "The integration to reconnect",
        )
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, ToolError> {
        let integration = input["integration"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'integration' argument".into()))?;

        let link = self
            .backend
            .trigger_reauth(&ctx.customer_id, integration)
            .await
            .map_err(|e| ToolError::failed(TRIGGER_REAUTH, e.to_string()))?;

        info!(ticket = %ctx.ticket_id, integration, "Reauthorisation triggered");

        Ok(serde_json::json!({
            "integration": link.integration,
            "reauth_url": link.url,
        }))
    }
}
