//! Shared test doubles

use async_trait::async_trait;
use datasight_ai::{Completion, Content, LlmProvider, Model, Request, StopReason, Usage};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Provider that replays scripted results and records every request
#[derive(Default)]
pub(crate) struct MockProvider {
    responses: Mutex<VecDeque<datasight_ai::Result<Completion>>>,
    requests: Mutex<Vec<Request>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub(crate) fn new(responses: Vec<datasight_ai::Result<Completion>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    pub(crate) fn last_request(&self) -> Option<Request> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, request: &Request) -> datasight_ai::Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(text_completion("done", 0, 0)))
    }
}

pub(crate) fn test_model() -> Model {
    Model {
        id: "test-model".into(),
        name: "Test".into(),
        base_url: "http://localhost".into(),
        max_tokens: 8_192,
    }
}

pub(crate) fn text_completion(text: &str, input: u32, output: u32) -> Completion {
    Completion {
        content: vec![Content::text(text)],
        usage: Usage { input, output },
        stop_reason: Some(StopReason::Stop),
        model: Some("test-model".into()),
    }
}

pub(crate) fn tool_completion(arguments: serde_json::Value, input: u32, output: u32) -> Completion {
    Completion {
        content: vec![Content::tool_call("toolu_test", crate::schema::TOOL_NAME, arguments)],
        usage: Usage { input, output },
        stop_reason: Some(StopReason::ToolUse),
        model: Some("test-model".into()),
    }
}
