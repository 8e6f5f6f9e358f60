//! Support system prompt and initial message assembly.

use deskpilot_core::message::{ContentBlock, Message, MessageContent, Role};
use deskpilot_core::ticket::ConversationContext;

/// Built-in system prompt for the support agent.
pub const SUPPORT_SYSTEM_PROMPT: &str = "\
You are the first-line support agent for an accounting platform that connects \
to banks and bookkeeping integrations. You handle one ticket at a time.

Work through the ticket with the tools available:
- Use check_connection_status when the ticket mentions sync problems, missing \
transactions or failing imports.
- Use lookup_known_issues to see whether the problem is already known.
- Use trigger_reauth when a connection has expired, and include the link in your reply.
- Use respond_to_customer to answer. Only set close_ticket to true when the \
problem is fully solved.
- Use escalate_to_devops for platform bugs or integration failures you cannot fix.
- Use escalate_to_admin for billing, account changes, or anything you are unsure about.

Rules:
- Reply in the language the customer wrote in.
- Never promise refunds, delete accounts, share credentials or payment data, \
or commit to release dates.
- Do not guess. If you cannot determine the cause, escalate.
- When you are finished, end with a short plain-text summary of what you did.";

/// The system prompt with administrator instructions appended.
pub fn system_prompt(base: &str, admin_instructions: Option<&str>) -> String {
    match admin_instructions.map(str::trim).filter(|s| !s.is_empty()) {
        Some(extra) => format!("{base}\n\n## Administrator instructions\n{extra}"),
        None => base.to_string(),
    }
}

/// Prior messages followed by the ticket as a user turn.
///
/// Roles keep alternating: a trailing user turn absorbs the ticket, and a
/// trailing assistant turn with unanswered tool requests is dropped.
pub fn initial_messages(ctx: &ConversationContext) -> Vec<Message> {
    let mut header = format!("Ticket: {}\nCustomer: {}", ctx.ticket_id, ctx.customer_id);
    if let Some(category) = &ctx.category {
        header.push_str(&format!("\nCategory: {category}"));
    }
    if let Some(code) = &ctx.error_code {
        header.push_str(&format!("\nError code: {code}"));
    }

    let ticket = format!("{header}\n\n{}", ctx.ticket_text);

    let mut messages = ctx.prior_messages.clone();
    if messages
        .last()
        .is_some_and(|m| m.role == Role::Assistant && !m.tool_uses().is_empty())
    {
        messages.pop();
    }

    match messages.last_mut() {
        Some(last) if last.role == Role::User => append_text(last, ticket),
        _ => messages.push(Message::user(ticket)),
    }
    messages
}

fn append_text(message: &mut Message, text: String) {
    match &mut message.content {
        MessageContent::Text(existing) => {
            existing.push_str("\n\n");
            existing.push_str(&text);
        }
        MessageContent::Blocks(blocks) => blocks.push(ContentBlock::Text { text }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_instructions_are_appended() {
        let prompt = system_prompt("Base", Some("  Be brief.  "));
        assert!(prompt.starts_with("Base"));
        assert!(prompt.ends_with("## Administrator instructions\nBe brief."));
        assert_eq!(system_prompt("Base", Some("   ")), "Base");
        assert_eq!(system_prompt("Base", None), "Base");
    }

    #[test]
    fn ticket_becomes_last_user_message() {
        let ctx = ConversationContext::new("T-7", "C-3", "Mijn bankkoppeling werkt niet")
            .with_category("integrations")
            .with_error_code("AUTH_EXPIRED")
            .with_prior_messages(vec![Message::user("Eerder bericht"), Message::assistant("Antwoord")]);

        let messages = initial_messages(&ctx);
        assert_eq!(messages.len(), 3);
        let last = messages[2].text();
        assert!(last.contains("Ticket: T-7"));
        assert!(last.contains("Error code: AUTH_EXPIRED"));
        assert!(last.ends_with("Mijn bankkoppeling werkt niet"));
    }

    #[test]
    fn trailing_user_turn_absorbs_the_ticket() {
        let ctx = ConversationContext::new("T-8", "C-3", "Nog steeds kapot")
            .with_prior_messages(vec![
                Message::user("Hallo"),
                Message::assistant("Waarmee kan ik helpen?"),
                Message::user("Mijn import faalt"),
            ]);

        let messages = initial_messages(&ctx);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::User);
        let last = messages[2].text();
        assert!(last.starts_with("Mijn import faalt"));
        assert!(last.contains("Ticket: T-8"));
        assert!(last.ends_with("Nog steeds kapot"));
    }

    #[test]
    fn unanswered_tool_request_is_dropped() {
        let dangling = Message::assistant_blocks(vec![ContentBlock::ToolUse {
            id: "toolu_9".into(),
            name: "check_connection_status".into(),
            input: serde_json::json!({}),
        }]);
        let ctx = ConversationContext::new("T-9", "C-3", "Hallo?")
            .with_prior_messages(vec![Message::user("Sync hangt"), dangling]);

        let messages = initial_messages(&ctx);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert!(messages[0].tool_uses().is_empty());
        assert!(messages[0].text().starts_with("Sync hangt"));
        assert!(messages[0].text().ends_with("Hallo?"));
    }

    #[test]
    fn trailing_tool_results_get_a_text_block() {
        let ctx = ConversationContext::new("T-10", "C-3", "En nu?").with_prior_messages(vec![
            Message::user("Sync hangt"),
            Message::assistant_blocks(vec![ContentBlock::ToolUse {
                id: "toolu_1".into(),
                name: "check_connection_status".into(),
                input: serde_json::json!({}),
            }]),
            Message::tool_results(vec![ContentBlock::ToolResult {
                tool_use_id: "toolu_1".into(),
                content: "{}".into(),
                is_error: false,
            }]),
        ]);

        let messages = initial_messages(&ctx);
        assert_eq!(messages.len(), 3);
        match &messages[2].content {
            MessageContent::Blocks(blocks) => {
                assert!(matches!(blocks[0], ContentBlock::ToolResult { .. }));
                assert!(matches!(&blocks[1], ContentBlock::Text { text } if text.ends_with("En nu?")));
            }
            MessageContent::Text(_) => panic!("expected blocks"),
        }
    }

    #[test]
    fn prompt_names_every_tool() {
        for tool in [
            "check_connection_status",
            "lookup_known_issues",
            "trigger_reauth",
            "respond_to_customer",
            "escalate_to_devops",
            "escalate_to_admin",
        ] {
            assert!(SUPPORT_SYSTEM_PROMPT.contains(tool), "{tool} missing");
        }
    }
}
