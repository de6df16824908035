use ollama_rs::Ollama;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::models::ModelOptions;

use crate::error::LlmError;
use crate::provider::{Completer, Embedder, EmbedderId};

const DEFAULT_PORT: u16 = 11434;

/// Local Ollama server serving one chat model and one embedding model.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    chat_model: String,
    embedding_model: String,
    context_window: Option<usize>,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(base_url: &str, chat_model: String, embedding_model: String) -> Self {
        let (host, port) = split_endpoint(base_url);
        Self {
            client: Ollama::new(host, port),
            chat_model,
            embedding_model,
            context_window: None,
        }
    }

    pub fn set_context_window(&mut self, tokens: usize) {
        self.context_window = Some(tokens);
    }

    /// Ask the server for the chat model's context length and remember it.
    ///
    /// Returns the detected window, or `None` when the model does not report one.
    ///
    /// # Errors
    ///
    /// Returns an error if the `/api/show` request fails.
    pub async fn detect_context_window(&mut self) -> Result<Option<usize>, LlmError> {
        let info = self
            .client
            .show_model_info(self.chat_model.clone())
            .await
            .map_err(|e| LlmError::Other(format!("Ollama model info for {} failed: {e}", self.chat_model)))?;

        let reported = info.model_info.iter().find_map(|(key, value)| {
            key.ends_with(".context_length")
                .then(|| value.as_u64().and_then(|n| usize::try_from(n).ok()))
                .flatten()
        });
        let detected = reported.or_else(|| num_ctx_parameter(&info.parameters));
        if let Some(tokens) = detected {
            self.context_window = Some(tokens);
        }
        Ok(detected)
    }

    /// # Errors
    ///
    /// Returns an error if the server cannot be reached.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        self.client
            .list_local_models()
            .await
            .map(|_| ())
            .map_err(|e| LlmError::Other(format!("Ollama unreachable, is it running? {e}")))
    }
}

impl Completer for OllamaProvider {
    fn context_window(&self) -> Option<usize> {
        self.context_window
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let request =
            ChatMessageRequest::new(self.chat_model.clone(), vec![ChatMessage::user(prompt.to_owned())])
                .options(ModelOptions::default().temperature(temperature));

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| LlmError::Other(format!("Ollama chat failed: {e}")))?;
        Ok(response.message.content)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

impl Embedder for OllamaProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request =
            GenerateEmbeddingsRequest::new(self.embedding_model.clone(), EmbeddingsInput::from(text));

        self.client
            .generate_embeddings(request)
            .await
            .map_err(|e| LlmError::Other(format!("Ollama embedding failed: {e}")))?
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::EmptyResponse {
                provider: "ollama".into(),
            })
    }

    fn embedder_id(&self) -> EmbedderId {
        EmbedderId::new("ollama", self.embedding_model.clone())
    }
}

/// `num_ctx` from the Modelfile parameter block.
fn num_ctx_parameter(parameters: &str) -> Option<usize> {
    parameters.lines().find_map(|line| {
        line.trim()
            .strip_prefix("num_ctx")
            .and_then(|rest| rest.trim().parse().ok())
    })
}

/// Split `http://host:port` into the host part and port; `ollama-rs` takes them separately.
fn split_endpoint(base_url: &str) -> (String, u16) {
    let trimmed = base_url.trim_end_matches('/');
    trimmed
        .rsplit_once(':')
        .and_then(|(host, port)| Some((host.to_owned(), port.parse().ok()?)))
        .unwrap_or_else(|| (trimmed.to_owned(), DEFAULT_PORT))
}
