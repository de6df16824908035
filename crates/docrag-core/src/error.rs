use std::path::PathBuf;

use docrag_llm::{EmbedderId, LlmError};

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("no documents found: {0}")]
    NoDocumentsFound(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("index build failed: {0}")]
    IndexBuild(String),

    #[error("no index found at {}", .0.display())]
    IndexNotFound(PathBuf),

    #[error("index at {} is corrupt: {reason}", .path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("embedding provider mismatch: index built with {index}, query uses {query}")]
    EmbeddingProviderMismatch { index: String, query: String },

    #[error("context too large: ~{estimated} tokens exceeds limit of {limit}")]
    ContextTooLarge { estimated: usize, limit: usize },

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(#[from] LlmError),

    #[error("no index is loaded and building on demand is disabled")]
    NotIndexed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RagError {
    pub(crate) fn provider_mismatch(index: &EmbedderId, query: &EmbedderId) -> Self {
        Self::EmbeddingProviderMismatch {
            index: index.to_string(),
            query: query.to_string(),
        }
    }

    pub(crate) fn dimension_mismatch(index: usize, query: usize) -> Self {
        Self::EmbeddingProviderMismatch {
            index: format!("{index}-dimensional vectors"),
            query: format!("{query}-dimensional vectors"),
        }
    }
}

pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_names_both_embedders() {
        let err = RagError::provider_mismatch(
            &EmbedderId::new("ollama", "all-minilm"),
            &EmbedderId::new("openai", "text-embedding-3-small"),
        );
        let msg = err.to_string();
        assert!(msg.contains("ollama:all-minilm"));
        assert!(msg.contains("openai:text-embedding-3-small"));
    }

    #[test]
    fn llm_error_converts_to_provider_unavailable() {
        let err: RagError = LlmError::RateLimited.into();
        assert!(matches!(err, RagError::ProviderUnavailable(_)));
    }

    #[test]
    fn context_too_large_display() {
        let err = RagError::ContextTooLarge {
            estimated: 9000,
            limit: 8192,
        };
        assert_eq!(
            err.to_string(),
            "context too large: ~9000 tokens exceeds limit of 8192"
        );
    }
}
