//! Guard-rail evaluation engine.
//!
//! The engine runs the rules in precedence order against a [`GuardRailInput`]
//! and returns the [`GuardRailVerdict`] of the first rule that fires. It is
//! read-only with respect to the conversation: it never invokes tools.

use crate::GuardRailError;
use crate::model::{Confidence, Decision, GuardRailVerdict, RuleId};
use crate::patterns::{self, contains_phrase, normalize};
use chrono::{DateTime, Utc};
use deskpilot_config::GuardRailConfig;
use deskpilot_core::catalog;
use deskpilot_core::record::ToolCallRecord;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// What the rules are evaluated against.
///
/// Without a draft only the inbound rules apply; rules that inspect a drafted
/// answer are skipped.
#[derive(Debug, Clone, Copy)]
pub struct GuardRailInput<'a> {
    pub customer_text: &'a str,
    pub automated_responses_sent: u32,
    pub draft: Option<&'a str>,
    pub records: &'a [ToolCallRecord],
}

impl<'a> GuardRailInput<'a> {
    /// Pre-flight input: the inbound message and the response counter.
    pub fn inbound(customer_text: &'a str, automated_responses_sent: u32) -> Self {
        Self {
            customer_text,
            automated_responses_sent,
            draft: None,
            records: &[],
        }
    }

    /// Attach the model's drafted answer and the tool-call record.
    pub fn with_draft(mut self, draft: &'a str, records: &'a [ToolCallRecord]) -> Self {
        self.draft = Some(draft);
        self.records = records;
        self
    }
}

/// An entry in the guard-rail evaluation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardRailLogEntry {
    pub rule_id: RuleId,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Maximum log entries kept in memory.
const MAX_GUARD_RAIL_LOG: usize = 5_000;

/// The guard-rail engine.
///
/// Patterns are compiled once at construction; evaluation is deterministic
/// and safe to share between concurrent conversations.
pub struct GuardRailEngine {
    human_patterns: Vec<Regex>,
    blocked_patterns: Vec<(String, Regex)>,
    hedge_phrases: Vec<String>,
    max_automated_responses: u32,
    deflection_message: String,
    forwarded_message: String,
    log: RwLock<Vec<GuardRailLogEntry>>,
}

impl GuardRailEngine {
    /// Build the engine from configuration, compiling built-in and extra patterns.
    pub fn new(config: &GuardRailConfig) -> Result<Self, GuardRailError> {
        let human_patterns = patterns::HUMAN_REQUEST_PATTERNS
            .iter()
            .copied()
            .chain(config.extra_human_patterns.iter().map(String::as_str))
            .map(compile)
            .collect::<Result<Vec<_>, _>>()?;

        let mut blocked_patterns = Vec::new();
        for (category, pattern) in patterns::BLOCKED_CONTENT_PATTERNS {
            blocked_patterns.push((category.to_string(), compile(pattern)?));
        }
        for pattern in &config.extra_blocked_patterns {
            blocked_patterns.push(("custom".to_string(), compile(pattern)?));
        }

        let hedge_phrases = if config.hedge_phrases.is_empty() {
            patterns::DEFAULT_HEDGE_PHRASES
                .iter()
                .map(|p| p.to_string())
                .collect()
        } else {
            config.hedge_phrases.clone()
        };

        Ok(Self {
            human_patterns,
            blocked_patterns,
            hedge_phrases,
            max_automated_responses: config.max_automated_responses,
            deflection_message: config
                .deflection_message
                .clone()
                .unwrap_or_else(|| patterns::DEFAULT_DEFLECTION_MESSAGE.to_string()),
            forwarded_message: config
                .forwarded_message
                .clone()
                .unwrap_or_else(|| patterns::DEFAULT_FORWARDED_MESSAGE.to_string()),
            log: RwLock::new(Vec::new()),
        })
    }

    /// Evaluate every applicable rule in precedence order; first match wins.
    pub fn evaluate(&self, input: &GuardRailInput<'_>) -> GuardRailVerdict {
        for rule in RuleId::ALL {
            if rule.needs_draft() && input.draft.is_none() {
                continue;
            }
            if let Some((verdict, detail)) = self.check_rule(rule, input) {
                self.record(&verdict, rule, detail);
                return verdict;
            }
        }
        GuardRailVerdict::allow()
    }

    /// Pre-flight check on an inbound customer message.
    pub fn check_inbound(&self, customer_text: &str, automated_responses_sent: u32) -> GuardRailVerdict {
        self.evaluate(&GuardRailInput::inbound(customer_text, automated_responses_sent))
    }

    /// Screen one outgoing reply before it is sent.
    ///
    /// Blocked content first, then the response ceiling. `responses_sent`
    /// counts every automated reply already sent, including earlier ones in
    /// the current run.
    pub fn check_outgoing(&self, message: &str, responses_sent: u32) -> GuardRailVerdict {
        let input = GuardRailInput::inbound("", responses_sent).with_draft(message, &[]);
        for rule in [RuleId::BlockedContent, RuleId::ResponseCeiling] {
            if let Some((verdict, detail)) = self.check_rule(rule, &input) {
                self.record(&verdict, rule, detail);
                return verdict;
            }
        }
        GuardRailVerdict::allow()
    }

    /// Post-run check on the model's final draft and the run's tool calls.
    pub fn check_draft(
        &self,
        customer_text: &str,
        automated_responses_sent: u32,
        draft: &str,
        records: &[ToolCallRecord],
    ) -> GuardRailVerdict {
        self.evaluate(
            &GuardRailInput::inbound(customer_text, automated_responses_sent)
                .with_draft(draft, records),
        )
    }

    pub fn is_human_request(&self, text: &str) -> bool {
        let normalized = normalize(text);
        self.human_patterns.iter().any(|re| re.is_match(&normalized))
    }

    /// The category of the first blocked pattern `text` matches.
    pub fn blocked_category(&self, text: &str) -> Option<&str> {
        let normalized = normalize(text);
        self.blocked_patterns
            .iter()
            .find(|(_, re)| re.is_match(&normalized))
            .map(|(category, _)| category.as_str())
    }

    /// Grade a drafted answer.
    pub fn confidence(&self, draft: &str, records: &[ToolCallRecord]) -> Confidence {
        if records
            .iter()
            .any(|r| !r.is_error() && catalog::is_terminal(&r.name))
        {
            return Confidence::Decisive;
        }

        let normalized = normalize(draft);
        if normalized.is_empty()
            || self
                .hedge_phrases
                .iter()
                .any(|phrase| contains_phrase(&normalized, phrase))
        {
            Confidence::Speculative
        } else {
            Confidence::Tentative
        }
    }

    pub fn max_automated_responses(&self) -> u32 {
        self.max_automated_responses
    }

    pub fn deflection_message(&self) -> &str {
        &self.deflection_message
    }

    pub fn forwarded_message(&self) -> &str {
        &self.forwarded_message
    }

    /// Get the evaluation log.
    pub fn log(&self) -> Vec<GuardRailLogEntry> {
        self.log.read().map(|log| log.clone()).unwrap_or_default()
    }

    // ── Internal ───────────────────────────────────────────────────

    fn check_rule(
        &self,
        rule: RuleId,
        input: &GuardRailInput<'_>,
    ) -> Option<(GuardRailVerdict, Option<String>)> {
        match rule {
            RuleId::HumanRequest => self.is_human_request(input.customer_text).then(|| {
                (
                    GuardRailVerdict::fired(rule, Decision::Escalate, &self.forwarded_message),
                    None,
                )
            }),
            RuleId::BlockedContent => {
                let category = self.blocked_category(input.draft?)?;
                Some((self.blocked_verdict(), Some(category.to_string())))
            }
            RuleId::ResponseCeiling => (input.automated_responses_sent
                >= self.max_automated_responses)
                .then(|| {
                    (
                        GuardRailVerdict::fired(rule, Decision::Escalate, &self.forwarded_message),
                        Some(format!(
                            "{} of {} automated responses sent",
                            input.automated_responses_sent, self.max_automated_responses
                        )),
                    )
                }),
            RuleId::LowConfidence => {
                let confidence = self.confidence(input.draft?, input.records);
                (confidence == Confidence::Speculative).then(|| {
                    (
                        GuardRailVerdict::fired(rule, Decision::Escalate, &self.forwarded_message),
                        None,
                    )
                })
            }
        }
    }

    fn blocked_verdict(&self) -> GuardRailVerdict {
        GuardRailVerdict::fired(RuleId::BlockedContent, Decision::Block, &self.deflection_message)
    }

    fn record(&self, verdict: &GuardRailVerdict, rule: RuleId, detail: Option<String>) {
        match verdict.decision {
            Decision::Block => warn!(rule = %rule, detail = ?detail, "Guard rail BLOCKED draft"),
            Decision::Escalate => info!(rule = %rule, detail = ?detail, "Guard rail forced escalation"),
            Decision::Allow => debug!(rule = %rule, "Guard rail allowed"),
        }

        let entry = GuardRailLogEntry {
            rule_id: rule,
            decision: verdict.decision,
            detail,
            timestamp: Utc::now(),
        };
        if let Ok(mut log) = self.log.write() {
            if log.len() >= MAX_GUARD_RAIL_LOG {
                log.drain(..MAX_GUARD_RAIL_LOG / 10);
            }
            log.push(entry);
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, GuardRailError> {
    Regex::new(pattern).map_err(|e| GuardRailError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
