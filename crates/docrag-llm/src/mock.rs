//! Test-only mock provider with deterministic embeddings.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{Completer, Embedder, EmbedderId};

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    /// Prompt and temperature of every `complete` call.
    calls: Arc<Mutex<Vec<(String, f32)>>>,
    embed_calls: Arc<AtomicUsize>,
    pub default_response: String,
    pub model: String,
    pub dimension: usize,
    pub fail_chat: bool,
    /// Embedding calls numbered from this value on fail.
    pub fail_embed_after: Option<usize>,
    pub context_window: Option<usize>,
    /// Milliseconds to sleep before returning a response.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            embed_calls: Arc::new(AtomicUsize::new(0)),
            default_response: "mock response".into(),
            model: "mock-embed".into(),
            dimension: 256,
            fail_chat: false,
            fail_embed_after: None,
            context_window: None,
            delay_ms: 0,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            fail_embed_after: Some(0),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    #[must_use]
    pub fn with_context_window(mut self, tokens: usize) -> Self {
        self.context_window = Some(tokens);
        self
    }

    #[must_use]
    pub fn fail_embed_after(mut self, calls: usize) -> Self {
        self.fail_embed_after = Some(calls);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Prompts received by `complete`, oldest first.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(prompt, _)| prompt.clone())
            .collect()
    }

    /// Temperatures passed to `complete`, oldest first.
    #[must_use]
    pub fn temperatures(&self) -> Vec<f32> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }
}

impl Completer for MockProvider {
    fn context_window(&self) -> Option<usize> {
        self.context_window
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_owned(), temperature));
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

impl Embedder for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let call = self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail_embed_after.is_some_and(|n| call >= n) {
            return Err(LlmError::Other("mock embed error".into()));
        }
        Ok(hashed_bag_of_words(text, self.dimension))
    }

    fn embedder_id(&self) -> EmbedderId {
        EmbedderId::new("mock", self.model.clone())
    }
}

/// L2-normalized term-count vector with each lowercase word hashed into a bucket.
#[must_use]
pub fn hashed_bag_of_words(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dimension.max(1)];
    let buckets = vector.len() as u64;
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let hash = blake3::hash(word.to_lowercase().as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&hash.as_bytes()[..8]);
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (u64::from_le_bytes(prefix) % buckets) as usize;
        vector[bucket] += 1.0;
    }
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}
