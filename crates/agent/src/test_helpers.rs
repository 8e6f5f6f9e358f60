//! Shared test helpers for driver and support-agent tests.

use deskpilot_core::error::ProviderError;
use deskpilot_core::message::ContentBlock;
use deskpilot_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` pops the next entry. When the script runs out the
/// last entry is repeated if `repeat_last` is set, otherwise the call panics.
/// Every request is captured for inspection.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    last: Mutex<Option<Result<ProviderResponse, ProviderError>>>,
    repeat_last: bool,
    delay: Option<Duration>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::from_results(responses.into_iter().map(Ok).collect())
    }

    pub fn from_results(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            repeat_last: false,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that returns the same response forever.
    pub fn repeating(response: ProviderResponse) -> Self {
        let mut provider = Self::new(vec![response]);
        provider.repeat_last = true;
        provider
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(entry) => {
                *self.last.lock().unwrap() = Some(entry.clone());
                entry
            }
            None if self.repeat_last => self
                .last
                .lock()
                .unwrap()
                .clone()
                .expect("repeating provider needs one response"),
            None => panic!("ScriptedProvider: no more responses (call #{})", self.call_count()),
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

/// A final text answer (no tool calls).
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        stop_reason: StopReason::EndTurn,
        content: vec![ContentBlock::Text { text: text.into() }],
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// A turn requesting the given tool calls.
pub fn tool_response(calls: Vec<ContentBlock>) -> ProviderResponse {
    ProviderResponse {
        stop_reason: StopReason::ToolUse,
        content: calls,
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// One tool-use block.
pub fn tool_call(id: &str, name: &str, input: serde_json::Value) -> ContentBlock {
    ContentBlock::ToolUse {
        id: id.into(),
        name: name.into(),
        input,
    }
}
