//! The conversation driver — a bounded tool-use loop.
//!
//! Each iteration sends the system prompt, tool descriptors and message
//! sequence to the model. Tool requests are executed in order and their
//! results are appended as one combined turn once the whole batch has
//! finished. A reply with no tool request ends the run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use deskpilot_core::catalog::RESPOND_TO_CUSTOMER;
use deskpilot_core::error::RunError;
use deskpilot_core::event::{DomainEvent, EventBus};
use deskpilot_core::message::{ContentBlock, Message};
use deskpilot_core::provider::{Provider, ProviderRequest};
use deskpilot_core::record::ToolCallRecord;
use deskpilot_core::tool::{ToolContext, ToolRegistry};
use deskpilot_guardrails::{GuardRailEngine, GuardRailVerdict};

use crate::classifier::replies_sent;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Iteration cap used when none is configured.
pub const DEFAULT_MAX_ITERATIONS: u32 = 25;

/// Iteration cap for support conversations.
pub const SUPPORT_MAX_ITERATIONS: u32 = 5;

/// Driver state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    AwaitingModelResponse,
    ExecutingTools,
    Done,
    Failed,
    MaxIterationsReached,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::MaxIterationsReached)
    }
}

/// The result of one driver invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRunResult {
    pub success: bool,

    /// The model's final plain-text answer (empty unless the run completed)
    pub final_text: String,

    /// Every tool invocation, in request order
    pub tool_call_records: Vec<ToolCallRecord>,

    /// Model calls made
    pub iteration_count: u32,

    pub state: RunState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,

    /// Set when a reply was blocked before it could be sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_rail: Option<GuardRailVerdict>,

    /// The full transcript, including the initial messages
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
}

/// Mutable state of a run in progress.
///
/// Lives outside the driver future so a caller-level timeout can still
/// recover everything gathered before cancellation.
#[derive(Debug)]
pub struct RunProgress {
    pub messages: Vec<Message>,
    pub records: Vec<ToolCallRecord>,
    /// Records of the turn being executed, not yet flushed
    pub turn_batch: Vec<ToolCallRecord>,
    pub iteration_count: u32,
    pub state: RunState,
    pub final_text: String,
    pub guard_rail: Option<GuardRailVerdict>,
}

impl RunProgress {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            records: Vec::new(),
            turn_batch: Vec::new(),
            iteration_count: 0,
            state: RunState::AwaitingModelResponse,
            final_text: String::new(),
            guard_rail: None,
        }
    }
}

/// Drives one conversation through the tool-use loop.
pub struct ConversationDriver {
    /// The model backend
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Fixed system prompt
    system_prompt: String,

    /// Temperature setting
    temperature: f32,

    /// Max tokens per model response
    max_tokens: Option<u32>,

    /// Immutable tool catalogue
    tools: Arc<ToolRegistry>,

    /// Maximum model calls per run
    max_iterations: u32,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,

    /// Screens outgoing replies when set
    guard_rails: Option<Arc<GuardRailEngine>>,

    /// Automated replies sent in this conversation before the run
    responses_already_sent: u32,
}

impl ConversationDriver {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: system_prompt.into(),
            temperature: 0.2,
            max_tokens: None,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            event_bus: Arc::new(EventBus::default()),
            guard_rails: None,
            responses_already_sent: 0,
        }
    }

    /// Set the maximum number of model calls. Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Screen `respond_to_customer` calls before they execute.
    pub fn with_guard_rails(mut self, engine: Arc<GuardRailEngine>) -> Self {
        self.guard_rails = Some(engine);
        self
    }

    /// Replies sent before this run; in-run replies are added on top.
    pub fn with_responses_already_sent(mut self, count: u32) -> Self {
        self.responses_already_sent = count;
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Run the loop to completion.
    pub async fn run(&self, messages: Vec<Message>, ctx: &ToolContext) -> AgentRunResult {
        let mut progress = RunProgress::new(messages);
        let outcome = self.run_into(&mut progress, ctx).await;
        self.finish(progress, outcome, ctx)
    }

    /// Run the loop under a caller-level timeout.
    ///
    /// On expiry the run is cancelled and every record completed so far is
    /// returned with [`RunError::TimedOut`].
    pub async fn run_with_timeout(
        &self,
        messages: Vec<Message>,
        ctx: &ToolContext,
        timeout: Duration,
    ) -> AgentRunResult {
        let mut progress = RunProgress::new(messages);
        let outcome = match tokio::time::timeout(timeout, self.run_into(&mut progress, ctx)).await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    ticket = %ctx.ticket_id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Run timed out"
                );
                Err(RunError::TimedOut {
                    after_ms: timeout.as_millis() as u64,
                })
            }
        };
        self.finish(progress, outcome, ctx)
    }

    /// The loop itself, writing into caller-owned progress.
    pub async fn run_into(
        &self,
        progress: &mut RunProgress,
        ctx: &ToolContext,
    ) -> Result<(), RunError> {
        info!(
            ticket = %ctx.ticket_id,
            messages = progress.messages.len(),
            max_iterations = self.max_iterations,
            "Starting conversation run"
        );

        let tool_definitions = self.tools.definitions();

        while progress.iteration_count < self.max_iterations {
            progress.iteration_count += 1;
            progress.state = RunState::AwaitingModelResponse;

            debug!(
                ticket = %ctx.ticket_id,
                iteration = progress.iteration_count,
                "Driver iteration"
            );

            let request = ProviderRequest {
                model: self.model.clone(),
                system_prompt: self.system_prompt.clone(),
                tools: tool_definitions.clone(),
                messages: progress.messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };

            let response = self.provider.complete(request).await.map_err(|e| {
                warn!(ticket = %ctx.ticket_id, error = %e, "Model call failed");
                RunError::from(e)
            })?;

            self.event_bus.publish(DomainEvent::ModelCalled {
                ticket_id: ctx.ticket_id.clone(),
                model: response.model.clone(),
                iteration: progress.iteration_count,
                tokens_used: response.usage.as_ref().map(|u| u.total_tokens),
                timestamp: Utc::now(),
            });

            if !response.has_tool_use() {
                progress.final_text = response.text();
                progress
                    .messages
                    .push(Message::assistant(progress.final_text.clone()));
                return Ok(());
            }

            progress.state = RunState::ExecutingTools;
            let assistant_turn = Message::assistant_blocks(response.content);
            let calls: Vec<(String, String, serde_json::Value)> = assistant_turn
                .tool_uses()
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, name, input } => {
                        Some((id.clone(), name.clone(), input.clone()))
                    }
                    _ => None,
                })
                .collect();
            progress.messages.push(assistant_turn);

            debug!(tool_count = calls.len(), "Executing tool calls");

            let mut blocked: Option<GuardRailVerdict> = None;
            for (id, name, input) in calls {
                let record = if blocked.is_some() {
                    ToolCallRecord::error(&id, &name, input, "not executed: turn halted by guard rail")
                } else if let Some(verdict) = self.screen_reply(
                    &name,
                    &input,
                    self.responses_already_sent
                        + replies_sent(&progress.records)
                        + replies_sent(&progress.turn_batch),
                    ctx,
                ) {
                    let reason = format!("blocked by guard rail: {}", rule_name(&verdict));
                    blocked = Some(verdict);
                    ToolCallRecord::error(&id, &name, input, reason)
                } else {
                    self.execute_call(&id, &name, input, ctx).await
                };
                progress.turn_batch.push(record);
            }

            // Flush the whole turn at once.
            let results: Vec<ContentBlock> = progress
                .turn_batch
                .iter()
                .map(|r| ContentBlock::ToolResult {
                    tool_use_id: r.id.clone(),
                    content: r.result_text(),
                    is_error: r.is_error(),
                })
                .collect();
            progress.records.append(&mut progress.turn_batch);
            progress.messages.push(Message::tool_results(results));

            if let Some(verdict) = blocked {
                let rule = rule_name(&verdict);
                progress.guard_rail = Some(verdict);
                return Err(RunError::GuardRailBlock { rule });
            }
        }

        warn!(
            ticket = %ctx.ticket_id,
            iterations = progress.iteration_count,
            "Max iterations reached without a final answer"
        );
        Err(RunError::MaxIterationsExceeded {
            cap: self.max_iterations,
        })
    }

    // ── Internal ───────────────────────────────────────────────────

    /// Returns a verdict when an outgoing reply must not be sent.
    fn screen_reply(
        &self,
        name: &str,
        input: &serde_json::Value,
        responses_sent: u32,
        ctx: &ToolContext,
    ) -> Option<GuardRailVerdict> {
        let engine = self.guard_rails.as_ref()?;
        if name != RESPOND_TO_CUSTOMER {
            return None;
        }
        let message = input.get("message").and_then(|m| m.as_str()).unwrap_or("");
        let verdict = engine.check_outgoing(message, responses_sent);
        if verdict.is_allowed() {
            return None;
        }

        self.event_bus.publish(DomainEvent::GuardRailTriggered {
            ticket_id: ctx.ticket_id.clone(),
            rule: rule_name(&verdict),
            timestamp: Utc::now(),
        });
        Some(verdict)
    }

    async fn execute_call(
        &self,
        id: &str,
        name: &str,
        input: serde_json::Value,
        ctx: &ToolContext,
    ) -> ToolCallRecord {
        let start = Instant::now();
        let result = self.tools.execute(name, &input, &ctx.for_call(id)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.event_bus.publish(DomainEvent::ToolExecuted {
            ticket_id: ctx.ticket_id.clone(),
            tool_name: name.to_string(),
            success: result.is_ok(),
            duration_ms,
            timestamp: Utc::now(),
        });

        match result {
            Ok(output) => ToolCallRecord::success(id, name, input, output),
            Err(e) => {
                // Reported back to the model so it can recover
                warn!(tool = %name, error = %e, "Tool execution failed");
                ToolCallRecord::error(id, name, input, e.to_string())
            }
        }
    }

    fn finish(
        &self,
        progress: RunProgress,
        outcome: Result<(), RunError>,
        ctx: &ToolContext,
    ) -> AgentRunResult {
        let RunProgress {
            messages,
            mut records,
            turn_batch,
            iteration_count,
            final_text,
            guard_rail,
            ..
        } = progress;
        // A cancelled turn still contributes the calls that completed.
        records.extend(turn_batch);

        let (success, state, error) = match outcome {
            Ok(()) => (true, RunState::Done, None),
            Err(e @ RunError::MaxIterationsExceeded { .. }) => {
                (false, RunState::MaxIterationsReached, Some(e))
            }
            Err(e) => (false, RunState::Failed, Some(e)),
        };

        self.event_bus.publish(DomainEvent::RunFinished {
            ticket_id: ctx.ticket_id.clone(),
            success,
            iterations: iteration_count,
            tool_calls: records.len(),
            timestamp: Utc::now(),
        });

        info!(
            ticket = %ctx.ticket_id,
            success,
            iterations = iteration_count,
            tool_calls = records.len(),
            "Conversation run finished"
        );

        AgentRunResult {
            success,
            final_text: if success { final_text } else { String::new() },
            tool_call_records: records,
            iteration_count,
            state,
            error,
            guard_rail,
            messages,
        }
    }
}

fn rule_name(verdict: &GuardRailVerdict) -> String {
    verdict
        .rule_id
        .map(|r| r.to_string())
        .unwrap_or_else(|| "unknown".into())
}
