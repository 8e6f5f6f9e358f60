//! `deskpilot classify` — Recompute the outcome of a stored record.

use std::path::Path;

use deskpilot_agent::{TicketResolution, classify, escalation_target};
use deskpilot_core::record::ToolCallRecord;
use serde::Deserialize;

/// Either a bare record list or a full stored resolution.
#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Records(Vec<ToolCallRecord>),
    Resolution(Box<TicketResolution>),
}

pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let stored: Stored = serde_json::from_str(&raw)
        .map_err(|e| format!("Invalid record file {}: {e}", path.display()))?;

    let (outcome, target, count) = match &stored {
        Stored::Records(records) => (classify(records), escalation_target(records), records.len()),
        Stored::Resolution(resolution) => {
            let (outcome, target) = resolution.reclassify();
            if outcome != resolution.outcome || target != resolution.escalation_target {
                eprintln!(
                    "  ⚠️  Stored outcome ({}) differs from recomputed outcome ({outcome})",
                    resolution.outcome
                );
            }
            (outcome, target, resolution.tool_call_records.len())
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "outcome": outcome,
            "escalation_target": target,
            "tool_calls": count,
        }))?
    );
    Ok(())
}
