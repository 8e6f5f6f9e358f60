//! Customer reply tool — posts a message on the ticket, optionally closing it.
//!
//! The only tool that talks to the customer. The driver screens `message`
//! against the guard rails before this tool is allowed to run.

use async_trait::async_trait;
use deskpilot_core::catalog::{CLOSE_TICKET_FLAG, RESPOND_TO_CUSTOMER};
use deskpilot_core::error::ToolError;
use deskpilot_core::tool::{ParamKind, ParameterSchema, Tool, ToolContext};
use std::sync::Arc;
use tracing::info;

use crate::backend::{CustomerReply, SupportBackend};

pub struct RespondTool {
    backend: Arc<dyn SupportBackend>,
}

impl RespondTool {
    pub fn new(backend: Arc<dyn SupportBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for RespondTool {
    fn name(&self) -> &str {
        RESPOND_TO_CUSTOMER
    }

    fn description(&self) -> &str {
        "Send a reply to the customer. Set close_ticket to true only when the problem is \
         fully solved and no further action is needed."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("message", ParamKind::String, "The reply shown to the customer")
            .optional(
                CLOSE_TICKET_FLAG,
                ParamKind::Boolean,
                "Close the ticket after replying (default false)",
            )
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> Result<serde_json::Value, ToolError> {
        let message = input["message"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'message' argument".into()))?;
        if message.trim().is_empty() {
            return Err(ToolError::InvalidArguments("'message' must not be empty".into()));
        }
        let close_ticket = input[CLOSE_TICKET_FLAG].as_bool().unwrap_or(false);

        self.backend
            .send_reply(CustomerReply {
                ticket_id: ctx.ticket_id.clone(),
                message: message.to_string(),
                close_ticket,
            })
            .await
            .map_err(|e| ToolError::failed(RESPOND_TO_CUSTOMER, e.to_string()))?;

        info!(ticket = %ctx.ticket_id, close_ticket, "Reply sent to customer");

        Ok(serde_json::json!({
            "sent": true,
            "closed": close_ticket,
        }))
    }
}
