use super::{BackendError, ModelBackend};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type Responder = Arc<dyn Fn(&str) -> Result<String, BackendError> + Send + Sync>;

/// In-memory backend for tests.
///
/// Responses are either queued ([`MockBackend::push_response`], returned in FIFO order) or
/// computed from the prompt ([`MockBackend::with_responder`]). Queued responses win while any
/// remain. Every prompt received is recorded.
///
/// # Example
/// ```ignore
/// let backend = MockBackend::new();
/// backend.push_response(Ok("```sql\nSELECT 1 FROM DUAL;\n```".to_string()));
/// let text = backend.generate("prompt").await?;
/// assert_eq!(backend.prompts(), vec!["prompt".to_string()]);
/// ```
#[derive(Clone, Default)]
pub struct MockBackend {
    queued: Arc<Mutex<VecDeque<Result<String, BackendError>>>>,
    responder: Option<Responder>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that answers every prompt by calling `responder`.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, BackendError> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Arc::new(responder)),
            ..Self::default()
        }
    }

    /// Queue a response for the next unanswered call.
    pub fn push_response(&self, response: Result<String, BackendError>) {
        self.queued.lock().push_back(response);
    }

    /// All prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        self.prompts.lock().push(prompt.to_string());

        if let Some(response) = self.queued.lock().pop_front() {
            return response;
        }

        match &self.responder {
            Some(responder) => responder(prompt),
            None => Err(BackendError::Transport("No mock response configured".to_string())),
        }
    }
}
