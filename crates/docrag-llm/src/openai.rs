use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{Completer, Embedder, EmbedderId};

/// Client for any OpenAI-compatible REST endpoint (OpenAI, Groq, vLLM, ...).
#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    provider_name: String,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    embedding_model: Option<String>,
    context_window: Option<usize>,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("provider_name", &self.provider_name)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiProvider {
    /// `provider_name` labels errors and is the provider half of the
    /// [`EmbedderId`]; `embedding_model` of `None` disables [`Embedder::embed`].
    #[must_use]
    pub fn new(
        provider_name: String,
        api_key: String,
        base_url: String,
        model: String,
        max_tokens: u32,
        embedding_model: Option<String>,
    ) -> Self {
        Self {
            client: crate::http::default_client(Duration::from_secs(60)),
            provider_name,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            model,
            max_tokens,
            embedding_model,
            context_window: None,
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_context_window(mut self, tokens: usize) -> Self {
        self.context_window = Some(tokens);
        self
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, LlmError> {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!(provider = %self.provider_name, endpoint, "API error {status}: {text}");
            return Err(LlmError::Api {
                provider: self.provider_name.clone(),
                status: status.as_u16(),
            });
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn empty_response(&self) -> LlmError {
        LlmError::EmptyResponse {
            provider: self.provider_name.clone(),
        }
    }
}

impl Completer for OpenAiProvider {
    fn context_window(&self) -> Option<usize> {
        self.context_window
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature,
        };
        let response: ChatResponse = self.post("chat/completions", &body).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| self.empty_response())
    }

    fn name(&self) -> &str {
        &self.provider_name
    }
}

impl Embedder for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let Some(model) = self.embedding_model.as_deref() else {
            return Err(LlmError::EmbedUnsupported {
                provider: self.provider_name.clone(),
            });
        };
        let response: EmbeddingResponse = self
            .post("embeddings", &EmbeddingRequest { input: text, model })
            .await?;
        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| self.empty_response())
    }

    fn embedder_id(&self) -> EmbedderId {
        EmbedderId::new(
            self.provider_name.clone(),
            self.embedding_model.clone().unwrap_or_default(),
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [UserMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
