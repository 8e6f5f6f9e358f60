//! Known issues tool — searches the catalogue of open incidents.

use async_trait::async_trait;
use deskpilot_core::catalog::LOOKUP_KNOWN_ISSUES;
use deskpilot_core::error::ToolError;
use deskpilot_core::tool::{ParamKind, ParameterSchema, Tool, ToolContext};
use std::sync::Arc;

use crate::backend::SupportBackend;

pub struct KnownIssuesTool {
    backend: Arc<dyn SupportBackend>,
}

impl KnownIssuesTool {
    pub fn new(backend: Arc<dyn SupportBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for KnownIssuesTool {
    fn name(&self) -> &str {
        LOOKUP_KNOWN_ISSUES
    }

    fn description(&self) -> &str {
        "Search known issues and incidents by keywords and optionally an error code. \
         Returns matching issues with their workaround."
    }

    fn parameters(&self) -> ParameterSchema {
        ParameterSchema::new()
            .required("query", ParamKind::String, "Keywords describing the problem")
            .optional(
                "error_code",
                ParamKind::String,
                "Error code reported by the customer or integration",
            )
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<serde_json::Value, ToolError> {
        let query = input["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;
        let error_code = input["error_code"].as_str();

        let issues = self
            .backend
            .known_issues(query, error_code)
            .await
            .map_err(|e| ToolError::failed(LOOKUP_KNOWN_ISSUES, e.to_string()))?;

        Ok(serde_json::json!({
            "matches": issues.len(),
            "issues": issues,
        }))
    }
}
