//! End-to-end integration tests for the DeskPilot support runtime.
//!
//! These tests exercise the full pipeline from an inbound ticket to a
//! classified resolution: guard rails, the conversation driver, the support
//! tool catalogue on the stub backend, and outcome routing.

use std::sync::{Arc, Mutex};

use deskpilot_agent::{
    ConversationDriver, SUPPORT_MAX_ITERATIONS, SupportAgent, TicketResolution, classify,
    escalation_target,
};
use deskpilot_config::AppConfig;
use deskpilot_core::error::{ProviderError, RunError};
use deskpilot_core::message::{ContentBlock, Message, MessageContent, Role};
use deskpilot_core::outcome::{EscalationTarget, Outcome};
use deskpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason, Usage};
use deskpilot_core::record::ToolOutcome;
use deskpilot_core::ticket::ConversationContext;
use deskpilot_core::tool::{ToolContext, ToolRegistry};
use deskpilot_guardrails::{GuardRailEngine, RuleId};
use deskpilot_tools::{ConnectionState, SideEffect, StubBackend, support_registry};
use serde_json::json;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence.
///
/// With `repeat` set the last response is returned forever.
struct ScriptedProvider {
    responses: Vec<ProviderResponse>,
    repeat: bool,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses,
            repeat: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn forever(response: ProviderResponse) -> Self {
        Self {
            responses: vec![response],
            repeat: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> ProviderRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        requests.push(request);

        let index = if self.repeat {
            call.min(self.responses.len() - 1)
        } else {
            call
        };
        match self.responses.get(index) {
            Some(resp) => Ok(resp.clone()),
            None => panic!(
                "ScriptedProvider exhausted: call #{call}, have {}",
                self.responses.len()
            ),
        }
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        stop_reason: StopReason::EndTurn,
        content: vec![ContentBlock::Text { text: text.into() }],
        usage: usage(),
        model: "mock-model".into(),
    }
}

fn tool_response(calls: Vec<(&str, &str, serde_json::Value)>) -> ProviderResponse {
    ProviderResponse {
        stop_reason: StopReason::ToolUse,
        content: calls
            .into_iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: id.into(),
                name: name.into(),
                input,
            })
            .collect(),
        usage: usage(),
        model: "mock-model".into(),
    }
}

fn support_agent(provider: Arc<ScriptedProvider>, backend: Arc<StubBackend>) -> SupportAgent {
    let tools = Arc::new(support_registry(backend));
    let config = AppConfig::default();
    SupportAgent::from_config(&config, provider, tools).unwrap()
}

fn tool_result_ids(message: &Message) -> Vec<String> {
    match &message.content {
        MessageContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.clone()),
                _ => None,
            })
            .collect(),
        MessageContent::Text(_) => Vec::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// E2E: Expired credentials, the happy path
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn e2e_expired_credentials_are_responded() {
    let backend =
        Arc::new(StubBackend::new().with_connection("exact_online", ConnectionState::Expired));
    let reply = "Je koppeling met Exact Online is verlopen. We hebben je een nieuwe koppellink gestuurd.";
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![
            ("s1", "check_connection_status", json!({"integration": "exact_online"})),
            ("s2", "lookup_known_issues", json!({"query": "invoice import", "error_code": "AUTH_EXPIRED"})),
        ]),
        tool_response(vec![("s3", "trigger_reauth", json!({"integration": "exact_online"}))]),
        tool_response(vec![(
            "s4",
            "respond_to_customer",
            json!({"message": reply, "close_ticket": false}),
        )]),
        text_response("Reauth link sent and customer informed."),
    ]));

    let ctx = ConversationContext::new("T-100", "C-100", "Mijn facturen worden niet meer geimporteerd")
        .with_category("integration")
        .with_error_code("AUTH_EXPIRED");
    let resolution = support_agent(provider.clone(), backend.clone())
        .handle(&ctx)
        .await;

    assert_eq!(resolution.outcome, Outcome::Responded);
    assert_eq!(resolution.escalation_target, None);
    assert_eq!(resolution.message, reply);
    assert_eq!(resolution.iteration_count, 4);
    assert!(resolution.guard_rail.is_none());
    assert!(resolution.error.is_none());
    assert_eq!(provider.calls(), 4);

    let names: Vec<&str> = resolution
        .tool_call_records
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "check_connection_status",
            "lookup_known_issues",
            "trigger_reauth",
            "respond_to_customer"
        ]
    );
    assert!(matches!(
        &resolution.tool_call_records[1].outcome,
        ToolOutcome::Success { output } if output["issues"][0]["id"] == "KI-117"
    ));

    let effects = backend.effects();
    assert!(matches!(
        &effects[0],
        SideEffect::Reauth { customer_id, integration }
            if customer_id == "C-100" && integration == "exact_online"
    ));
    assert!(matches!(&effects[1], SideEffect::Reply(r) if !r.close_ticket && r.ticket_id == "T-100"));
}

// ═══════════════════════════════════════════════════════════════════════
// E2E: Guard rails before the model
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn e2e_dutch_human_request_skips_the_model() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let backend = Arc::new(StubBackend::new());

    let ctx = ConversationContext::new("T-101", "C-101", "Ik wil een mens spreken");
    let resolution = support_agent(provider.clone(), backend.clone())
        .handle(&ctx)
        .await;

    assert_eq!(provider.calls(), 0);
    assert_eq!(resolution.outcome, Outcome::Escalated);
    assert_eq!(resolution.escalation_target, Some(EscalationTarget::Human));
    assert!(resolution.tool_call_records.is_empty());
    assert_eq!(resolution.iteration_count, 0);
    let verdict = resolution.guard_rail.as_ref().unwrap();
    assert_eq!(verdict.rule_id, Some(RuleId::HumanRequest));
    assert!(!resolution.message.is_empty());
    assert!(backend.effects().is_empty());
}

#[tokio::test]
async fn e2e_human_request_wins_inside_a_busy_ticket() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let backend =
        Arc::new(StubBackend::new().with_connection("exact_online", ConnectionState::Expired));

    let ctx = ConversationContext::new(
        "T-111",
        "C-111",
        "Mijn Exact Online koppeling geeft al dagen AUTH_EXPIRED en mijn facturen komen niet \
         binnen. Ik wil mijn geld terug voor deze maand en mijn account verwijderen als dit zo \
         blijft. Ik wil nu met een medewerker praten.",
    )
    .with_category("integration")
    .with_error_code("AUTH_EXPIRED")
    .with_prior_messages(vec![
        Message::user("De koppeling werkt niet"),
        Message::assistant("Ik heb je een nieuwe koppellink gestuurd."),
    ])
    .with_automated_responses_sent(2);
    let resolution = support_agent(provider.clone(), backend.clone())
        .handle(&ctx)
        .await;

    assert_eq!(provider.calls(), 0);
    assert!(resolution.tool_call_records.is_empty());
    assert!(backend.effects().is_empty());
    assert_eq!(resolution.outcome, Outcome::Escalated);
    assert_eq!(resolution.escalation_target, Some(EscalationTarget::Human));
    assert_eq!(
        resolution.guard_rail.as_ref().unwrap().rule_id,
        Some(RuleId::HumanRequest)
    );
}

#[tokio::test]
async fn e2e_replies_in_one_run_cannot_pass_the_ceiling() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![(
            "c1",
            "respond_to_customer",
            json!({"message": "Je bankkoppeling is weer actief."}),
        )]),
        tool_response(vec![(
            "c2",
            "respond_to_customer",
            json!({"message": "Controleer of de transacties binnenkomen."}),
        )]),
        tool_response(vec![(
            "c3",
            "respond_to_customer",
            json!({"message": "Laat het weten als het niet werkt."}),
        )]),
        text_response("Replied."),
    ]));
    let backend = Arc::new(StubBackend::new());

    let ctx = ConversationContext::new("T-112", "C-112", "Mijn bankfeed loopt achter")
        .with_automated_responses_sent(4);
    let resolution = support_agent(provider.clone(), backend.clone())
        .handle(&ctx)
        .await;

    let delivered = backend
        .effects()
        .iter()
        .filter(|e| matches!(e, SideEffect::Reply(_)))
        .count();
    assert_eq!(delivered, 1);
    assert_eq!(provider.calls(), 2);
    assert_eq!(resolution.outcome, Outcome::Escalated);
    assert_eq!(
        resolution.guard_rail.as_ref().unwrap().rule_id,
        Some(RuleId::ResponseCeiling)
    );
}

#[tokio::test]
async fn e2e_response_ceiling_reached_at_five() {
    let provider = Arc::new(ScriptedProvider::new(vec![]));

    let ctx = ConversationContext::new("T-102", "C-102", "Het werkt nog steeds niet")
        .with_automated_responses_sent(5);
    let resolution = support_agent(provider.clone(), Arc::new(StubBackend::new()))
        .handle(&ctx)
        .await;

    assert_eq!(provider.calls(), 0);
    assert_eq!(resolution.outcome, Outcome::Escalated);
    assert_eq!(
        resolution.guard_rail.as_ref().unwrap().rule_id,
        Some(RuleId::ResponseCeiling)
    );

    // Four replies so far still lets the model run.
    let provider = Arc::new(ScriptedProvider::new(vec![text_response("Ik kijk ernaar.")]));
    let ctx = ConversationContext::new("T-103", "C-103", "Het werkt nog steeds niet")
        .with_automated_responses_sent(4);
    let resolution = support_agent(provider.clone(), Arc::new(StubBackend::new()))
        .handle(&ctx)
        .await;
    assert_eq!(provider.calls(), 1);
    assert!(resolution.guard_rail.is_none());
}

#[tokio::test]
async fn e2e_configured_ceiling_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_provider = "anthropic"

[guardrails]
max_automated_responses = 2
"#,
    )
    .unwrap();
    let config = AppConfig::load_from(&path).unwrap();

    let provider = Arc::new(ScriptedProvider::new(vec![]));
    let tools = Arc::new(support_registry(Arc::new(StubBackend::new())));
    let agent = SupportAgent::from_config(&config, provider.clone(), tools).unwrap();

    let ctx = ConversationContext::new("T-104", "C-104", "Nog een vraag")
        .with_automated_responses_sent(2);
    let resolution = agent.handle(&ctx).await;

    assert_eq!(provider.calls(), 0);
    assert_eq!(
        resolution.guard_rail.as_ref().unwrap().rule_id,
        Some(RuleId::ResponseCeiling)
    );
    assert_eq!(agent.guard_rails().max_automated_responses(), 2);
}

// ═══════════════════════════════════════════════════════════════════════
// E2E: Driver loop semantics
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn e2e_iterations_never_exceed_the_cap() {
    let provider = Arc::new(ScriptedProvider::forever(tool_response(vec![(
        "loop",
        "lookup_known_issues",
        json!({"query": "bank feed"}),
    )])));

    let ctx = ConversationContext::new("T-105", "C-105", "Bankkoppeling hapert");
    let resolution = support_agent(provider.clone(), Arc::new(StubBackend::new()))
        .handle(&ctx)
        .await;

    assert_eq!(provider.calls(), SUPPORT_MAX_ITERATIONS as usize);
    assert_eq!(resolution.iteration_count, SUPPORT_MAX_ITERATIONS);
    assert_eq!(
        resolution.error,
        Some(RunError::MaxIterationsExceeded {
            cap: SUPPORT_MAX_ITERATIONS
        })
    );
    // The partial history survives.
    assert_eq!(resolution.tool_call_records.len(), 5);
    assert!(resolution.tool_call_records.iter().all(|r| !r.is_error()));
    assert_eq!(resolution.outcome, Outcome::Escalated);
    assert_eq!(resolution.escalation_target, Some(EscalationTarget::Human));
}

#[tokio::test]
async fn e2e_records_keep_cross_turn_order() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![
            ("a1", "check_connection_status", json!({})),
            ("a2", "lookup_known_issues", json!({"query": "sync delayed"})),
        ]),
        tool_response(vec![("b1", "check_connection_status", json!({"integration": "mollie"}))]),
        text_response("Alles lijkt in orde."),
    ]));
    let tools = Arc::new(support_registry(Arc::new(StubBackend::new())));
    let driver = ConversationDriver::new(provider.clone(), "mock-model", "system", tools);

    let result = driver
        .run(
            vec![Message::user("Mijn bankfeed loopt achter")],
            &ToolContext::new("T-106", "C-106"),
        )
        .await;

    assert!(result.success);
    assert_eq!(result.iteration_count, 3);
    let ids: Vec<&str> = result.tool_call_records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2", "b1"]);

    // One tool-result message per turn, flushed in call order.
    let flushed: Vec<Vec<String>> = result
        .messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(tool_result_ids)
        .filter(|ids| !ids.is_empty())
        .collect();
    assert_eq!(flushed, vec![vec!["a1".to_string(), "a2".to_string()], vec!["b1".to_string()]]);

    // The model saw the first turn's results before its third call.
    let last = provider.last_request();
    assert_eq!(last.messages.len(), 5);
}

#[tokio::test]
async fn e2e_unknown_tool_is_reported_to_the_model() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![("x1", "refund_invoice", json!({"invoice": "F-2024-001"}))]),
        text_response("Dat kan ik niet doen."),
    ]));
    let tools = Arc::new(support_registry(Arc::new(StubBackend::new())));
    let driver = ConversationDriver::new(provider.clone(), "mock-model", "system", tools);

    let result = driver
        .run(vec![Message::user("Graag geld terug")], &ToolContext::new("T-107", "C-107"))
        .await;

    assert!(result.success);
    assert_eq!(provider.calls(), 2);
    assert_eq!(result.tool_call_records.len(), 1);
    let record = &result.tool_call_records[0];
    assert_eq!(record.name, "refund_invoice");
    assert!(record.is_error());
    assert!(record.result_text().contains("refund_invoice"));

    let second = provider.last_request();
    let relayed = second.messages.last().unwrap();
    assert!(matches!(
        &relayed.content,
        MessageContent::Blocks(blocks)
            if matches!(&blocks[0], ContentBlock::ToolResult { is_error: true, .. })
    ));
}

#[tokio::test]
async fn e2e_empty_registry_still_finishes() {
    let provider = Arc::new(ScriptedProvider::new(vec![text_response("Hallo!")]));
    let driver =
        ConversationDriver::new(provider, "mock-model", "system", Arc::new(ToolRegistry::empty()));

    let result = driver
        .run(vec![Message::user("Hoi")], &ToolContext::new("T-108", "C-108"))
        .await;

    assert!(result.success);
    assert_eq!(result.final_text, "Hallo!");
    assert!(result.tool_call_records.is_empty());
    assert_eq!(classify(&result.tool_call_records), Outcome::Pending);
}

// ═══════════════════════════════════════════════════════════════════════
// E2E: Outcome routing
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn e2e_devops_escalation_and_stable_classification() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![("d1", "check_connection_status", json!({"integration": "mollie"}))]),
        tool_response(vec![(
            "d2",
            "escalate_to_devops",
            json!({"reason": "Sync times out for every customer", "error_code": "SYNC_TIMEOUT", "priority": "high"}),
        )]),
        text_response("Escalated to engineering."),
    ]));
    let backend = Arc::new(StubBackend::new().with_connection("mollie", ConnectionState::Error));

    let ctx = ConversationContext::new("T-109", "C-109", "Mollie synchroniseert niet")
        .with_error_code("SYNC_TIMEOUT");
    let resolution = support_agent(provider, backend.clone()).handle(&ctx).await;

    assert_eq!(resolution.outcome, Outcome::Escalated);
    assert_eq!(resolution.escalation_target, Some(EscalationTarget::Devops));
    assert!(matches!(
        &backend.effects()[0],
        SideEffect::Escalation(req) if req.target == EscalationTarget::Devops
    ));

    // Classification is a pure function of the stored record.
    let json = serde_json::to_string(&resolution).unwrap();
    let stored: TicketResolution = serde_json::from_str(&json).unwrap();
    assert_eq!(classify(&stored.tool_call_records), Outcome::Escalated);
    assert_eq!(
        escalation_target(&stored.tool_call_records),
        Some(EscalationTarget::Devops)
    );
    assert_eq!(
        stored.reclassify(),
        (resolution.outcome, resolution.escalation_target)
    );
    assert_eq!(classify(&stored.tool_call_records), classify(&resolution.tool_call_records));
}

#[tokio::test]
async fn e2e_blocked_reply_never_reaches_the_customer() {
    let provider = Arc::new(ScriptedProvider::new(vec![tool_response(vec![
        (
            "r1",
            "respond_to_customer",
            json!({"message": "We storten je geld terug, je krijgt een volledige terugbetaling."}),
        ),
        ("r2", "check_connection_status", json!({})),
    ])]));
    let backend = Arc::new(StubBackend::new());

    let ctx = ConversationContext::new("T-110", "C-110", "Ik wil mijn abonnement opzeggen");
    let resolution = support_agent(provider.clone(), backend.clone())
        .handle(&ctx)
        .await;

    assert_eq!(provider.calls(), 1);
    assert!(backend.effects().is_empty());
    assert_eq!(resolution.outcome, Outcome::Escalated);
    assert_eq!(
        resolution.error,
        Some(RunError::GuardRailBlock {
            rule: "blocked_content".into()
        })
    );
    assert_eq!(resolution.tool_call_records.len(), 2);
    assert!(resolution.tool_call_records.iter().all(|r| r.is_error()));
    assert!(!resolution.message.contains("terugbetaling"));

    let engine = GuardRailEngine::new(&AppConfig::default().guardrails).unwrap();
    assert_eq!(resolution.message, engine.deflection_message());
}
