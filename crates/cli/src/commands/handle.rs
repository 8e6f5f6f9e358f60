//! `deskpilot handle` — Run the support agent on one ticket.
//!
//! Tools act on the deterministic stub backend; the printed resolution is
//! what a caller would persist.

use std::path::Path;
use std::sync::Arc;

use deskpilot_agent::{SupportAgent, prompt};
use deskpilot_config::AppConfig;
use deskpilot_core::ticket::ConversationContext;
use deskpilot_guardrails::GuardRailEngine;
use deskpilot_tools::{StubBackend, support_registry};
use tracing::info;

pub async fn run(
    config_path: Option<&Path>,
    ticket_path: &Path,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    let raw = std::fs::read_to_string(ticket_path)
        .map_err(|e| format!("Failed to read {}: {e}", ticket_path.display()))?;
    let ticket: ConversationContext = serde_json::from_str(&raw)
        .map_err(|e| format!("Invalid ticket file {}: {e}", ticket_path.display()))?;

    let tools = Arc::new(support_registry(Arc::new(StubBackend::new())));

    if dry_run {
        return preview(&config, &ticket, tools.names());
    }

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set DESKPILOT_API_KEY or ANTHROPIC_API_KEY, or add api_key to");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let router = deskpilot_providers::router::build_from_config(&config);
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not available", config.default_provider))?;

    let agent = SupportAgent::from_config(&config, provider, tools)?;

    eprint!("  Working on ticket {}...", ticket.ticket_id);
    let resolution = agent.handle(&ticket).await;
    eprint!("\r                                        \r");

    info!(
        ticket = %resolution.ticket_id,
        outcome = %resolution.outcome,
        iterations = resolution.iteration_count,
        "Ticket handled"
    );
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

/// Pre-flight guard rails plus the assembled prompt, without a model call.
fn preview(
    config: &AppConfig,
    ticket: &ConversationContext,
    tool_names: Vec<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = GuardRailEngine::new(&config.guardrails)?;
    let verdict = engine.check_inbound(&ticket.ticket_text, ticket.automated_responses_sent);

    let base = config
        .agent
        .system_prompt_override
        .as_deref()
        .unwrap_or(prompt::SUPPORT_SYSTEM_PROMPT);
    let system_prompt = prompt::system_prompt(base, ticket.admin_instructions.as_deref());

    let preview = serde_json::json!({
        "ticket_id": ticket.ticket_id,
        "pre_flight": verdict,
        "would_call_model": verdict.is_allowed(),
        "model": config.default_model,
        "max_iterations": config.agent.max_iterations,
        "tools": tool_names,
        "system_prompt": system_prompt,
        "messages": prompt::initial_messages(ticket),
    });
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}
