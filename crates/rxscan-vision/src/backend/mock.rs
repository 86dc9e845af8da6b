//! Scripted backend for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::VisionBackend;
use crate::{Result, VisionError, VisionRequest, VisionResponse};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Answer with this text.
    Text(String),
    /// Fail with this error.
    Fail(VisionError),
}

/// A backend that replays a queue of canned replies.
///
/// Once the queue is exhausted the last reply is repeated.
pub struct MockBackend {
    model: String,
    replies: Mutex<VecDeque<MockReply>>,
    last: Mutex<Option<MockReply>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockBackend {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            replies: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a text answer.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_reply(MockReply::Text(text.into()))
    }

    /// Queue a failure.
    pub fn with_error(self, error: VisionError) -> Self {
        self.with_reply(MockReply::Fail(error))
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(reply);
        }
        self
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `generate` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> MockReply {
        let popped = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(reply) = popped {
            *last = Some(reply.clone());
            return reply;
        }
        last.clone()
            .unwrap_or_else(|| MockReply::Fail(VisionError::EmptyResponse("no scripted reply".into())))
    }
}

#[async_trait]
impl VisionBackend for MockBackend {
    async fn generate(&self, _request: &VisionRequest) -> Result<VisionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_reply() {
            MockReply::Text(text) => Ok(VisionResponse {
                text,
                model: self.model.clone(),
                latency_ms: self.delay.map(|d| d.as_millis() as u64).unwrap_or(0),
            }),
            MockReply::Fail(error) => Err(error),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
