#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;

use crate::error::LlmError;
use crate::provider::{Completer, Embedder, EmbedderId};

/// Runs `$expr` with `$p` bound to whichever backend the enum holds.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Ollama($p) => $expr,
            AnyProvider::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    Ollama(OllamaProvider),
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl AnyProvider {
    /// Probe the backend when it exposes a cheap reachability check.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable.
    pub async fn health_check(&self) -> Result<(), LlmError> {
        match self {
            Self::Ollama(p) => p.health_check().await,
            Self::OpenAi(_) => Ok(()),
            #[cfg(feature = "mock")]
            Self::Mock(_) => Ok(()),
        }
    }
}

impl Completer for AnyProvider {
    fn context_window(&self) -> Option<usize> {
        delegate_provider!(self, |p| p.context_window())
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        delegate_provider!(self, |p| p.complete(prompt, temperature).await)
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }
}

impl Embedder for AnyProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        delegate_provider!(self, |p| p.embed(text).await)
    }

    fn embedder_id(&self) -> EmbedderId {
        delegate_provider!(self, |p| p.embedder_id())
    }
}
