//! Conversation context — everything the agent knows about an inbound ticket.

use serde::{Deserialize, Serialize};
use crate::message::Message;

/// Built once per inbound ticket event by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    pub ticket_id: String,

    pub customer_id: String,

    /// The customer's own words
    pub ticket_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    /// Earlier turns of this conversation, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prior_messages: Vec<Message>,

    /// Extra instructions from an administrator, appended to the system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_instructions: Option<String>,

    /// Automated replies already sent on this ticket
    #[serde(default)]
    pub automated_responses_sent: u32,
}

impl ConversationContext {
    pub fn new(
        ticket_id: impl Into<String>,
        customer_id: impl Into<String>,
        ticket_text: impl Into<String>,
    ) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            customer_id: customer_id.into(),
            ticket_text: ticket_text.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_prior_messages(mut self, messages: Vec<Message>) -> Self {
        self.prior_messages = messages;
        self
    }

    pub fn with_admin_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.admin_instructions = Some(instructions.into());
        self
    }

    pub fn with_automated_responses_sent(mut self, count: u32) -> Self {
        self.automated_responses_sent = count;
        self
    }
}
