use std::sync::Arc;
use std::time::Duration;

use docrag_llm::Embedder;

pub use crate::index::{RetrievalResult, RetrievedChunk};
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// Top-k cosine retrieval over one index with the embedder that built it.
pub struct Retriever<E> {
    index: Arc<VectorIndex>,
    embedder: Arc<E>,
    k: usize,
    timeout: Option<Duration>,
}

impl<E: Embedder> Retriever<E> {
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if `k == 0`, or
    /// [`RagError::EmbeddingProviderMismatch`] if `embedder` is not the one the
    /// index was built with.
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<E>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(RagError::Configuration("top_k must be at least 1".into()));
        }
        let query_id = embedder.embedder_id();
        if &query_id != index.embedder_id() {
            return Err(RagError::provider_mismatch(index.embedder_id(), &query_id));
        }
        Ok(Self {
            index,
            embedder,
            k,
            timeout: None,
        })
    }

    /// Bound each query embedding by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    #[must_use]
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// # Errors
    ///
    /// Returns [`RagError::ProviderUnavailable`] if embedding the query fails or
    /// times out, or [`RagError::EmbeddingProviderMismatch`] if the query vector
    /// has the wrong dimension.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let vector = crate::provider::embed(self.embedder.as_ref(), query, self.timeout).await?;
        let result = self.index.search(&vector, self.k)?;
        tracing::debug!(
            k = self.k,
            hits = result.len(),
            top_score = result.first().map(|r| r.score),
            "retrieved"
        );
        Ok(result)
    }
}
