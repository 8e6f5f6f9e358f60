//! The seam between support tools and the systems they act on.
//!
//! Tool bodies own their side effects, but they perform them through a
//! [`SupportBackend`] so the data store, ticket system and engineering queue
//! can be swapped for the deterministic [`StubBackend`] in tests and dry runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deskpilot_core::outcome::EscalationTarget;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

/// Health of a customer's integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Active,
    Expired,
    Error,
    Disconnected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub integration: String,
    pub status: ConnectionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownIssue {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub workaround: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReauthLink {
    pub integration: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Lenient parse of model-supplied priority text.
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("low") => Self::Low,
            Some("high") => Self::High,
            Some("urgent") | Some("critical") => Self::Urgent,
            _ => Self::Normal,
        }
    }
}

/// A request to hand a ticket to a queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRequest {
    pub ticket_id: String,
    pub customer_id: String,
    pub target: EscalationTarget,
    pub reason: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// A reply to post on a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerReply {
    pub ticket_id: String,
    pub message: String,
    pub close_ticket: bool,
}

#[async_trait]
pub trait SupportBackend: Send + Sync {
    async fn connection_status(
        &self,
        customer_id: &str,
        integration: Option<&str>,
    ) -> Result<Vec<ConnectionStatus>, BackendError>;

    async fn known_issues(
        &self,
        query: &str,
        error_code: Option<&str>,
    ) -> Result<Vec<KnownIssue>, BackendError>;

    async fn trigger_reauth(
        &self,
        customer_id: &str,
        integration: &str,
    ) -> Result<ReauthLink, BackendError>;

    /// Returns a reference for the created escalation.
    async fn escalate(&self, request: EscalationRequest) -> Result<String, BackendError>;

    async fn send_reply(&self, reply: CustomerReply) -> Result<(), BackendError>;
}

/// A side effect the stub backend has performed.
#[derive(Debug, Clone)]
pub enum SideEffect {
    Reauth { customer_id: String, integration: String },
    Escalation(EscalationRequest),
    Reply(CustomerReply),
}

/// Deterministic in-memory backend.
///
/// Connection states are seeded per integration (unknown integrations are
/// `active`), known issues are matched by keyword or error code, and every
/// side effect is recorded for inspection.
pub struct StubBackend {
    connections: HashMap<String, ConnectionState>,
    issues: Vec<KnownIssue>,
    effects: Mutex<Vec<SideEffect>>,
    unavailable: bool,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            issues: default_issues(),
            effects: Mutex::new(Vec::new()),
            unavailable: false,
        }
    }

    pub fn with_connection(mut self, integration: &str, state: ConnectionState) -> Self {
        self.connections.insert(integration.to_string(), state);
        self
    }

    pub fn with_issue(mut self, issue: KnownIssue) -> Self {
        self.issues.push(issue);
        self
    }

    /// Make every call fail with `BackendError::Unavailable`.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Side effects performed so far, in order.
    pub fn effects(&self) -> Vec<SideEffect> {
        self.effects.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), BackendError> {
        if self.unavailable {
            Err(BackendError::Unavailable("stub backend marked unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn record(&self, effect: SideEffect) {
        if let Ok(mut effects) = self.effects.lock() {
            effects.push(effect);
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn default_issues() -> Vec<KnownIssue> {
    vec![
        KnownIssue {
            id: "KI-101".into(),
            title: "Bank feed sync delayed after token rotation".into(),
            error_code: Some("SYNC_TIMEOUT".into()),
            workaround: "Sync resumes automatically within 2 hours.".into(),
        },
        KnownIssue {
            id: "KI-117".into(),
            title: "Expired OAuth token blocks invoice import".into(),
            error_code: Some("AUTH_EXPIRED".into()),
            workaround: "Reconnect the integration through the reauthorisation link.".into(),
        },
    ]
}

#[async_trait]
impl SupportBackend for StubBackend {
    async fn connection_status(
        &self,
        _customer_id: &str,
        integration: Option<&str>,
    ) -> Result<Vec<ConnectionStatus>, BackendError> {
        self.check_available()?;

        let status_of = |name: &str, state: ConnectionState| ConnectionStatus {
            integration: name.to_string(),
            status: state,
            last_sync: (state == ConnectionState::Active).then(Utc::now),
            last_error: match state {
                ConnectionState::Expired => Some("AUTH_EXPIRED".into()),
                ConnectionState::Error => Some("SYNC_TIMEOUT".into()),
                _ => None,
            },
        };

        Ok(match integration {
            Some(name) => vec![status_of(
                name,
                self.connections
                    .get(name)
                    .copied()
                    .unwrap_or(ConnectionState::Active),
            )],
            None => {
                let mut all: Vec<_> = self
                    .connections
                    .iter()
                    .map(|(name, state)| status_of(name, *state))
                    .collect();
                all.sort_by(|a, b| a.integration.cmp(&b.integration));
                all
            }
        })
    }

    async fn known_issues(
        &self,
        query: &str,
        error_code: Option<&str>,
    ) -> Result<Vec<KnownIssue>, BackendError> {
        self.check_available()?;
        let q = query.to_lowercase();
        Ok(self
            .issues
            .iter()
            .filter(|issue| {
                let code_match = matches!(
                    (error_code, issue.error_code.as_deref()),
                    (Some(wanted), Some(have)) if wanted.eq_ignore_ascii_case(have)
                );
                let text_match = !q.is_empty()
                    && q.split_whitespace()
                        .filter(|w| w.len() > 3)
                        .any(|w| issue.title.to_lowercase().contains(w));
                code_match || text_match
            })
            .cloned()
            .collect())
    }

    async fn trigger_reauth(
        &self,
        customer_id: &str,
        integration: &str,
    ) -> Result<ReauthLink, BackendError> {
        self.check_available()?;
        self.record(SideEffect::Reauth {
            customer_id: customer_id.to_string(),
            integration: integration.to_string(),
        });
        Ok(ReauthLink {
            integration: integration.to_string(),
            url: format!("https://app.example.com/connect/{integration}?customer={customer_id}"),
        })
    }

    async fn escalate(&self, request: EscalationRequest) -> Result<String, BackendError> {
        self.check_available()?;
        let reference = format!("ESC-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
        self.record(SideEffect::Escalation(request));
        Ok(reference)
    }

    async fn send_reply(&self, reply: CustomerReply) -> Result<(), BackendError> {
        self.check_available()?;
        self.record(SideEffect::Reply(reply));
        Ok(())
    }
}
