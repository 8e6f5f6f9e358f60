//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are the bounded set of side-effecting capabilities the model may
//! exercise: checking a connection, looking up known issues, escalating,
//! replying to the customer. Each tool declares a [`ParameterSchema`] that is
//! validated structurally before `execute` ever runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::error::ToolError;

/// Primitive kinds a tool parameter can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn accepts(self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// One named parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
}

/// The parameter contract of a tool, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub params: Vec<ParamSpec>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required parameter.
    pub fn required(mut self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.push(name, kind, description, true);
        self
    }

    /// Declare an optional parameter.
    pub fn optional(mut self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.push(name, kind, description, false);
        self
    }

    fn push(&mut self, name: &str, kind: ParamKind, description: &str, required: bool) {
        self.params.retain(|p| p.name != name);
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required,
        });
    }

    /// Names of the required parameters.
    pub fn required_names(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Check an input object against this schema.
    ///
    /// Required fields must be present and non-null; declared fields that are
    /// present must match their kind. Undeclared fields are passed through.
    pub fn validate(&self, input: &serde_json::Value) -> Result<(), ToolError> {
        let obj = input.as_object().ok_or_else(|| {
            ToolError::InvalidArguments("tool input must be a JSON object".into())
        })?;

        for param in &self.params {
            match obj.get(&param.name) {
                None | Some(serde_json::Value::Null) if param.required => {
                    return Err(ToolError::InvalidArguments(format!(
                        "missing required parameter '{}'",
                        param.name
                    )));
                }
                None | Some(serde_json::Value::Null) => {}
                Some(value) if !param.kind.accepts(value) => {
                    return Err(ToolError::InvalidArguments(format!(
                        "parameter '{}' must be of type {}",
                        param.name,
                        param.kind.as_str()
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Render as a JSON Schema object for the model provider.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({
                        "type": p.kind.as_str(),
                        "description": p.description,
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required_names(),
        })
    }
}

/// Per-invocation context handed to a tool alongside its input.
///
/// Carries the identity of the ticket being worked so a shared, immutable
/// registry can serve many conversations at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolContext {
    /// The model's id for this tool call
    pub tool_use_id: String,
    pub ticket_id: String,
    pub customer_id: String,
}

impl ToolContext {
    pub fn new(ticket_id: impl Into<String>, customer_id: impl Into<String>) -> Self {
        Self {
            tool_use_id: String::new(),
            ticket_id: ticket_id.into(),
            customer_id: customer_id.into(),
        }
    }

    /// The same context scoped to one tool call.
    pub fn for_call(&self, tool_use_id: &str) -> Self {
        Self {
            tool_use_id: tool_use_id.to_string(),
            ..self.clone()
        }
    }
}

/// A tool descriptor sent to the model so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// Parameter contract
    pub parameters: ParameterSchema,
}

/// The core Tool trait.
///
/// Side effects are owned entirely by the tool body. Failures are returned as
/// [`ToolError`] values; the driver turns them into error-tagged tool results
/// so one failing tool never aborts a conversation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "check_connection_status").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// The parameter contract for this tool.
    fn parameters(&self) -> ParameterSchema;

    /// Execute the tool with already-validated input.
    async fn execute(
        &self,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> std::result::Result<serde_json::Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Collects tools before the registry is frozen.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistryBuilder {
    /// Register a tool. Replaces any earlier tool with the same name.
    pub fn register(mut self, tool: Box<dyn Tool>) -> Self {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
        self
    }

    /// Freeze the catalogue.
    pub fn build(self) -> ToolRegistry {
        let index = self
            .tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();
        ToolRegistry {
            tools: self.tools,
            index,
        }
    }
}

/// The fixed, immutable catalogue of tools exposed to the model.
///
/// Shared read-only (behind an `Arc`) between concurrent conversations.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// A registry with no tools.
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    /// Tool definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Resolve, validate and execute a tool call.
    pub async fn execute(
        &self,
        name: &str,
        input: &serde_json::Value,
        ctx: &ToolContext,
    ) -> std::result::Result<serde_json::Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        tool.parameters().validate(input)?;
        tool.execute(input.clone(), ctx).await
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
