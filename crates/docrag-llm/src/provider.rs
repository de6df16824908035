use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Identity of the embedding space a vector was produced in.
///
/// Two embedders with equal ids must produce comparable vectors; an index
/// built with one id cannot be queried with vectors from another.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbedderId {
    pub provider: String,
    pub model: String,
}

impl EmbedderId {
    #[must_use]
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for EmbedderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// Maps text to a fixed-dimension vector. Identical input yields identical output.
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or rejects the request.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    fn embedder_id(&self) -> EmbedderId;
}

/// Single-shot text completion.
pub trait Completer: Send + Sync {
    /// Complete `prompt` and return the raw model output.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable or the response is invalid.
    fn complete(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Input budget of the model in tokens, when known.
    fn context_window(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedder_id_display() {
        let id = EmbedderId::new("ollama", "all-minilm");
        assert_eq!(id.to_string(), "ollama:all-minilm");
    }

    #[test]
    fn embedder_id_equality_requires_both_fields() {
        let a = EmbedderId::new("ollama", "all-minilm");
        assert_eq!(a, EmbedderId::new("ollama", "all-minilm"));
        assert_ne!(a, EmbedderId::new("openai", "all-minilm"));
        assert_ne!(a, EmbedderId::new("ollama", "nomic-embed-text"));
    }

    #[test]
    fn embedder_id_serde_roundtrip() {
        let id = EmbedderId::new("openai", "text-embedding-3-small");
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.contains("\"provider\":\"openai\""));
        let back: EmbedderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
