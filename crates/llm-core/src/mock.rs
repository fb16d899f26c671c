//! Queue-based fake provider for unit tests.
//!
//! Each `prompt` pops the next scripted reply; an empty queue answers with a
//! protocol error. Capability flags default to "everything supported".

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::stream;
use tokio_util::sync::CancellationToken;

use crate::error::{LlmError, Result};
use crate::message::Message;
use crate::provider::{Options, Provider, TextStream};

/// `LlmError` is not `Clone`, so scripted failures are kept in this form
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    Transport(String),
    Config(String),
}

pub struct MockProvider {
    replies: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    conversations: Mutex<Vec<Vec<Message>>>,
    streaming: bool,
    structured_output: bool,
    tools: bool,
    cancel_after_call: Option<CancellationToken>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            conversations: Mutex::new(Vec::new()),
            streaming: true,
            structured_output: true,
            tools: true,
            cancel_after_call: None,
        }
    }

    pub const fn with_streaming(mut self, supported: bool) -> Self {
        self.streaming = supported;
        self
    }

    pub const fn with_structured_output(mut self, supported: bool) -> Self {
        self.structured_output = supported;
        self
    }

    pub const fn with_tools(mut self, supported: bool) -> Self {
        self.tools = supported;
        self
    }

    /// Cancel `token` as soon as the first call returns
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_after_call = Some(token);
        self
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(MockReply::Text(text.to_string()))
    }

    pub fn fail(self, message: &str) -> Self {
        self.push(MockReply::Transport(message.to_string()))
    }

    pub fn fail_times(self, times: usize) -> Self {
        (0..times).fold(self, |mock, i| mock.fail(&format!("transient failure {}", i + 1)))
    }

    pub fn config_error(self, message: &str) -> Self {
        self.push(MockReply::Config(message.to_string()))
    }

    fn push(self, reply: MockReply) -> Self {
        self.replies
            .lock()
            .expect("mock queue poisoned")
            .push_back(reply);
        self
    }

    /// Number of provider calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Conversations received, one per call
    pub fn conversations(&self) -> Vec<Vec<Message>> {
        self.conversations
            .lock()
            .expect("mock conversations poisoned")
            .clone()
    }

    fn next(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.conversations
            .lock()
            .expect("mock conversations poisoned")
            .push(messages.to_vec());

        let reply = self
            .replies
            .lock()
            .expect("mock queue poisoned")
            .pop_front();

        if let Some(token) = &self.cancel_after_call {
            token.cancel();
        }

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Transport(message)) => Err(LlmError::transport(message)),
            Some(MockReply::Config(message)) => Err(LlmError::Config(message)),
            None => Err(LlmError::Protocol("mock reply queue exhausted".into())),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn supports_structured_output(&self) -> bool {
        self.structured_output
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }

    fn supports_tools(&self) -> bool {
        self.tools
    }

    async fn prompt(&self, _model: &str, messages: &[Message], _options: &Options) -> Result<String> {
        self.next(messages)
    }

    async fn stream(
        &self,
        _model: &str,
        messages: &[Message],
        _options: &Options,
    ) -> Result<TextStream> {
        let text = self.next(messages)?;
        let deltas: Vec<String> = text
            .split_inclusive(' ')
            .map(str::to_string)
            .collect();
        Ok(Box::pin(stream::iter(deltas)))
    }
}
