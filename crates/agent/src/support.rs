//! The support agent — one ticket in, one resolution out.
//!
//! Ties the pieces together for a single inbound ticket:
//!
//! 1. Pre-flight guard rails on the customer's text and response counter.
//! 2. The conversation driver under a caller-level timeout.
//! 3. Post-run guard rails on the answer that would reach the customer.
//! 4. Classification and escalation routing over the tool-call record.
//!
//! Persistence and notifications belong to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use deskpilot_config::AppConfig;
use deskpilot_core::catalog::RESPOND_TO_CUSTOMER;
use deskpilot_core::error::RunError;
use deskpilot_core::event::{DomainEvent, EventBus};
use deskpilot_core::outcome::{EscalationTarget, Outcome};
use deskpilot_core::provider::Provider;
use deskpilot_core::record::ToolCallRecord;
use deskpilot_core::ticket::ConversationContext;
use deskpilot_core::tool::{ToolContext, ToolRegistry};
use deskpilot_guardrails::{GuardRailEngine, GuardRailError, GuardRailVerdict};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classifier::{classify, escalation_target, replies_sent};
use crate::driver::{ConversationDriver, SUPPORT_MAX_ITERATIONS};
use crate::prompt;

/// What the caller gets back for one ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketResolution {
    pub ticket_id: String,
    pub outcome: Outcome,

    /// The text the customer receives
    pub message: String,

    pub tool_call_records: Vec<ToolCallRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_target: Option<EscalationTarget>,

    /// The guard rail that overrode the model, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_rail: Option<GuardRailVerdict>,

    pub iteration_count: u32,

    /// The driver's run error, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

impl TicketResolution {
    /// Recompute outcome and target from the stored record and verdict.
    pub fn reclassify(&self) -> (Outcome, Option<EscalationTarget>) {
        decide(&self.tool_call_records, self.guard_rail.as_ref(), self.error.as_ref())
    }
}

/// Outcome routing over stored evidence.
///
/// A guard-rail verdict or a run error forces escalation; a target already
/// chosen by the model's own escalation calls is kept, otherwise it is human.
fn decide(
    records: &[ToolCallRecord],
    guard_rail: Option<&GuardRailVerdict>,
    error: Option<&RunError>,
) -> (Outcome, Option<EscalationTarget>) {
    let outcome = classify(records);
    let target = escalation_target(records);

    if guard_rail.is_none() && error.is_none() {
        return (outcome, target);
    }

    let forced = guard_rail
        .and_then(|v| v.target)
        .unwrap_or(EscalationTarget::Human);
    (Outcome::Escalated, target.or(Some(forced)))
}

/// The most recent reply that actually reached the customer.
fn last_sent_reply(records: &[ToolCallRecord]) -> Option<&str> {
    records
        .iter()
        .rev()
        .filter(|r| r.name == RESPOND_TO_CUSTOMER && !r.is_error())
        .find_map(|r| r.input_str("message"))
}

pub struct SupportAgent {
    provider: Arc<dyn Provider>,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_iterations: u32,
    timeout: Duration,
    tools: Arc<ToolRegistry>,
    guard_rails: Arc<GuardRailEngine>,
    event_bus: Arc<EventBus>,
}

impl SupportAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        guard_rails: Arc<GuardRailEngine>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: prompt::SUPPORT_SYSTEM_PROMPT.to_string(),
            temperature: 0.2,
            max_tokens: None,
            max_iterations: SUPPORT_MAX_ITERATIONS,
            timeout: Duration::from_secs(120),
            tools,
            guard_rails,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Build from application configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
    ) -> Result<Self, GuardRailError> {
        let guard_rails = Arc::new(GuardRailEngine::new(&config.guardrails)?);
        let mut agent = Self::new(provider, &config.default_model, tools, guard_rails)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_max_iterations(config.agent.max_iterations)
            .with_timeout(Duration::from_secs(config.agent.timeout_secs.max(1)));
        if let Some(prompt) = &config.agent.system_prompt_override {
            agent = agent.with_system_prompt(prompt);
        }
        Ok(agent)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
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

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn guard_rails(&self) -> &GuardRailEngine {
        &self.guard_rails
    }

    /// Handle one inbound ticket.
    pub async fn handle(&self, ctx: &ConversationContext) -> TicketResolution {
        info!(ticket = %ctx.ticket_id, customer = %ctx.customer_id, "Handling ticket");

        let inbound = self
            .guard_rails
            .check_inbound(&ctx.ticket_text, ctx.automated_responses_sent);
        if !inbound.is_allowed() {
            self.publish_guard_rail(&ctx.ticket_id, &inbound);
            return self.resolve(ctx, Vec::new(), 0, Some(inbound), None, String::new());
        }

        let driver = self.driver(ctx);
        let tool_ctx = ToolContext::new(&ctx.ticket_id, &ctx.customer_id);
        let result = driver
            .run_with_timeout(prompt::initial_messages(ctx), &tool_ctx, self.timeout)
            .await;

        let mut guard_rail = result.guard_rail;
        if result.success {
            let draft = last_sent_reply(&result.tool_call_records)
                .unwrap_or(result.final_text.as_str())
                .to_string();
            let verdict = self.guard_rails.check_draft(
                &ctx.ticket_text,
                ctx.automated_responses_sent + replies_sent(&result.tool_call_records),
                &draft,
                &result.tool_call_records,
            );
            if !verdict.is_allowed() {
                self.publish_guard_rail(&ctx.ticket_id, &verdict);
                guard_rail = Some(verdict);
            }
        }

        self.resolve(
            ctx,
            result.tool_call_records,
            result.iteration_count,
            guard_rail,
            result.error,
            result.final_text,
        )
    }

    fn driver(&self, ctx: &ConversationContext) -> ConversationDriver {
        let system_prompt =
            prompt::system_prompt(&self.system_prompt, ctx.admin_instructions.as_deref());
        let mut driver = ConversationDriver::new(
            self.provider.clone(),
            self.model.clone(),
            system_prompt,
            self.tools.clone(),
        )
        .with_max_iterations(self.max_iterations)
        .with_temperature(self.temperature)
        .with_event_bus(self.event_bus.clone())
        .with_guard_rails(self.guard_rails.clone())
        .with_responses_already_sent(ctx.automated_responses_sent);
        if let Some(max) = self.max_tokens {
            driver = driver.with_max_tokens(max);
        }
        driver
    }

    fn resolve(
        &self,
        ctx: &ConversationContext,
        records: Vec<ToolCallRecord>,
        iteration_count: u32,
        guard_rail: Option<GuardRailVerdict>,
        error: Option<RunError>,
        final_text: String,
    ) -> TicketResolution {
        let (outcome, target) = decide(&records, guard_rail.as_ref(), error.as_ref());

        let message = match (&guard_rail, last_sent_reply(&records)) {
            (Some(verdict), _) => verdict.message.clone(),
            (None, Some(reply)) => reply.to_string(),
            (None, None) if outcome == Outcome::Escalated || final_text.trim().is_empty() => {
                self.guard_rails.forwarded_message().to_string()
            }
            (None, None) => final_text,
        };

        info!(
            ticket = %ctx.ticket_id,
            outcome = %outcome,
            target = ?target,
            tool_calls = records.len(),
            "Ticket resolved"
        );

        TicketResolution {
            ticket_id: ctx.ticket_id.clone(),
            outcome,
            message,
            tool_call_records: records,
            escalation_target: target,
            guard_rail,
            iteration_count,
            error,
        }
    }

    fn publish_guard_rail(&self, ticket_id: &str, verdict: &GuardRailVerdict) {
        if let Some(rule) = verdict.rule_id {
            self.event_bus.publish(DomainEvent::GuardRailTriggered {
                ticket_id: ticket_id.to_string(),
                rule: rule.to_string(),
                timestamp: Utc::now(),
            });
        }
    }
}
