//! Index lifecycle and question answering behind one explicit handle.
//!
//! [`RagEngine`] starts `Unindexed` and moves to `Indexed` when an index is
//! built or loaded. Queries clone the current `Arc<VectorIndex>` under a read
//! lock and keep that snapshot for their whole run; a reindex builds and
//! persists the new index before swapping it in under the write lock, so a
//! query sees either the old index or the new one.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docrag_llm::{Completer, Embedder, EmbedderId};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::config::{Config, UnindexedPolicy};
use crate::document::load_documents;
use crate::error::{RagError, Result};
use crate::grounding::is_outside_corpus;
use crate::index::{ChunkingParams, VectorIndex};
use crate::retriever::{RetrievalResult, Retriever};
use crate::splitter::{SplitterConfig, chunk_documents};
use crate::synthesizer::AnswerSynthesizer;

/// Overrides for a single reindex; unset fields use the configured values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReindexParams {
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub embedder: EmbedderId,
    pub chunking: ChunkingParams,
    pub persist_dir: PathBuf,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    /// Raw completion text.
    pub answer: String,
    pub retrieved: RetrievalResult,
    /// The answer is the "I don't know" sentinel.
    pub outside_corpus: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub indexed: bool,
    pub document_count: usize,
    pub chunk_count: usize,
    pub embedder: Option<EmbedderId>,
    pub chunking: Option<ChunkingParams>,
    pub created_at: Option<u64>,
    pub docs_dir: PathBuf,
    pub persist_dir: PathBuf,
}

enum IndexState {
    Unindexed,
    Indexed(Arc<VectorIndex>),
}

pub struct RagEngine<E, C> {
    config: Config,
    embedder: Arc<E>,
    completer: C,
    state: RwLock<IndexState>,
    build_lock: Mutex<()>,
}

impl<E: Embedder, C: Completer> RagEngine<E, C> {
    /// Create an engine with no index loaded.
    #[must_use]
    pub fn new(config: Config, embedder: E, completer: C) -> Self {
        Self {
            config,
            embedder: Arc::new(embedder),
            completer,
            state: RwLock::new(IndexState::Unindexed),
            build_lock: Mutex::new(()),
        }
    }

    /// Create an engine and load the index persisted under `index.persist_dir`.
    ///
    /// A missing index leaves the engine unindexed. With
    /// `index.rebuild_if_stale` (the default), an index whose chunks no longer
    /// match the documents directory is rebuilt before returning.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingProviderMismatch`] if the persisted index
    /// was built with a different embedder, [`RagError::IndexCorrupt`] if it
    /// cannot be read, or any reindex error when a stale index is rebuilt.
    pub async fn open(config: Config, embedder: E, completer: C) -> Result<Self> {
        let engine = Self::new(config, embedder, completer);
        let persist_dir = &engine.config.index.persist_dir;

        let index = match VectorIndex::load(persist_dir).await {
            Ok(index) => index,
            Err(RagError::IndexNotFound(_)) => {
                tracing::info!(dir = %persist_dir.display(), "no persisted index, starting unindexed");
                return Ok(engine);
            }
            Err(e) => return Err(e),
        };

        let current = engine.embedder.embedder_id();
        if index.embedder_id() != &current {
            return Err(RagError::provider_mismatch(index.embedder_id(), &current));
        }

        if engine.config.index.rebuild_if_stale && engine.stale_against_documents(&index).await? {
            tracing::info!("persisted index is stale, rebuilding");
            engine.reindex(ReindexParams::default()).await?;
        } else {
            *engine.state.write().await = IndexState::Indexed(Arc::new(index));
        }
        Ok(engine)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn is_indexed(&self) -> bool {
        matches!(*self.state.read().await, IndexState::Indexed(_))
    }

    /// Load, chunk, embed and persist the documents directory, then swap the
    /// new index in. Builds are serialized; queries keep running against the
    /// previous index until the swap.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] for invalid chunking parameters,
    /// [`RagError::NoDocumentsFound`] if there is nothing to index, or
    /// [`RagError::IndexBuild`] if embedding fails. The previous index stays
    /// active on error.
    pub async fn reindex(&self, params: ReindexParams) -> Result<IndexReport> {
        let _guard = self.build_lock.lock().await;
        self.reindex_locked(params).await
    }

    /// Answer `question` from the current index, retrieving `top_k` chunks
    /// (configured default when `None`).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotIndexed`] when unindexed under
    /// [`UnindexedPolicy::Fail`], any reindex error when building on demand,
    /// or any retrieval and synthesis error.
    pub async fn ask(&self, question: &str, top_k: Option<usize>) -> Result<AnswerRecord> {
        let index = self.current_or_build().await?;
        let k = top_k.unwrap_or(self.config.retrieval.top_k);

        let mut retriever = Retriever::new(index, Arc::clone(&self.embedder), k)?;
        if let Some(timeout) = self.config.embedding_timeout() {
            retriever = retriever.with_timeout(timeout);
        }

        let mut synthesizer = AnswerSynthesizer::new(&self.completer);
        if let Some(limit) = self.config.retrieval.context_budget_tokens {
            synthesizer = synthesizer.with_context_limit(limit);
        }
        if let Some(timeout) = self.config.llm_timeout() {
            synthesizer = synthesizer.with_timeout(timeout);
        }

        let (answer, retrieved) = synthesizer.answer(question, &retriever).await?;
        let outside_corpus = is_outside_corpus(&answer);
        tracing::info!(k, hits = retrieved.len(), outside_corpus, "question answered");
        Ok(AnswerRecord {
            answer,
            retrieved,
            outside_corpus,
        })
    }

    pub async fn status(&self) -> IndexStatus {
        let (indexed, manifest) = match &*self.state.read().await {
            IndexState::Unindexed => (false, None),
            IndexState::Indexed(index) => (true, Some(index.manifest().clone())),
        };
        IndexStatus {
            indexed,
            document_count: manifest.as_ref().map_or(0, |m| m.document_count),
            chunk_count: manifest.as_ref().map_or(0, |m| m.chunk_count),
            embedder: manifest.as_ref().map(|m| m.embedder.clone()),
            chunking: manifest.as_ref().and_then(|m| m.chunking),
            created_at: manifest.as_ref().map(|m| m.created_at),
            docs_dir: self.config.documents.dir.clone(),
            persist_dir: self.config.index.persist_dir.clone(),
        }
    }

    /// Whether the loaded index no longer matches the documents directory.
    /// `None` when unindexed.
    ///
    /// # Errors
    ///
    /// Returns an error if the documents directory cannot be read.
    pub async fn check_stale(&self) -> Result<Option<bool>> {
        let index = match &*self.state.read().await {
            IndexState::Unindexed => return Ok(None),
            IndexState::Indexed(index) => Arc::clone(index),
        };
        self.stale_against_documents(&index).await.map(Some)
    }

    async fn current_or_build(&self) -> Result<Arc<VectorIndex>> {
        if let IndexState::Indexed(index) = &*self.state.read().await {
            return Ok(Arc::clone(index));
        }

        match self.config.index.on_unindexed {
            UnindexedPolicy::Fail => Err(RagError::NotIndexed),
            UnindexedPolicy::Build => {
                let _guard = self.build_lock.lock().await;
                // A concurrent caller may have finished a build while we waited.
                if let IndexState::Indexed(index) = &*self.state.read().await {
                    return Ok(Arc::clone(index));
                }
                tracing::info!("no index loaded, building on demand");
                self.reindex_locked(ReindexParams::default()).await?;
                match &*self.state.read().await {
                    IndexState::Indexed(index) => Ok(Arc::clone(index)),
                    IndexState::Unindexed => Err(RagError::NotIndexed),
                }
            }
        }
    }

    async fn reindex_locked(&self, params: ReindexParams) -> Result<IndexReport> {
        let started = Instant::now();
        let splitter = SplitterConfig::new(
            params
                .chunk_size
                .unwrap_or(self.config.chunking.chunk_size),
            params
                .chunk_overlap
                .unwrap_or(self.config.chunking.chunk_overlap),
        );
        splitter.validate()?;

        let docs_dir = &self.config.documents.dir;
        let documents = load_documents(docs_dir, &self.config.loader_options()).await?;
        if documents.is_empty() {
            return Err(RagError::NoDocumentsFound(format!(
                "{} contains no supported files",
                docs_dir.display()
            )));
        }
        let chunks = chunk_documents(&documents, &splitter)?;

        let chunking = ChunkingParams {
            chunk_size: splitter.chunk_size,
            chunk_overlap: splitter.chunk_overlap,
        };
        let persist_dir = &self.config.index.persist_dir;
        let index = VectorIndex::build_with_timeout(
            chunks,
            self.embedder.as_ref(),
            persist_dir,
            Some(chunking),
            self.config.embedding_timeout(),
        )
        .await?;

        let report = IndexReport {
            documents: index.manifest().document_count,
            chunks: index.len(),
            dimension: index.dimension(),
            embedder: index.embedder_id().clone(),
            chunking,
            persist_dir: persist_dir.clone(),
            elapsed: started.elapsed(),
        };
        *self.state.write().await = IndexState::Indexed(Arc::new(index));
        tracing::info!(
            documents = report.documents,
            chunks = report.chunks,
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "reindex complete"
        );
        Ok(report)
    }

    async fn stale_against_documents(&self, index: &VectorIndex) -> Result<bool> {
        let splitter = index.manifest().chunking.map_or_else(
            || self.config.splitter_config(),
            |p| SplitterConfig::new(p.chunk_size, p.chunk_overlap),
        );
        let documents =
            load_documents(&self.config.documents.dir, &self.config.loader_options()).await?;
        let chunks = chunk_documents(&documents, &splitter)?;
        Ok(index.is_stale(&chunks))
    }
}
