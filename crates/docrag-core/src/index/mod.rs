//! Persisted vector index over embedded chunks.
//!
//! An index is built wholesale from a chunk list and written to
//! `<persist_dir>/index.json` by atomic rename, so readers of the file see
//! either the previous build or the new one. Once built it is immutable;
//! share it behind an `Arc` for concurrent searches.

mod persist;
mod store;

pub use persist::{FORMAT_VERSION, INDEX_FILE, corpus_fingerprint};
pub use store::cosine_similarity;

use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use docrag_llm::{Embedder, EmbedderId};
use serde::{Deserialize, Serialize};

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// Chunking parameters an index was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingParams {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub embedder: EmbedderId,
    pub dimension: usize,
    #[serde(default)]
    pub chunking: Option<ChunkingParams>,
    /// blake3 over every (source, chunk text) pair in build order.
    pub fingerprint: String,
    pub document_count: usize,
    pub chunk_count: usize,
    /// Unix seconds.
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedVector {
    pub vector: Vec<f32>,
    pub payload: Chunk,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ranked search hits, most similar first.
pub type RetrievalResult = Vec<RetrievedChunk>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    manifest: IndexManifest,
    entries: Vec<IndexedVector>,
}

impl VectorIndex {
    /// Embed every chunk and persist the result, replacing any earlier index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NoDocumentsFound`] for an empty chunk list,
    /// [`RagError::IndexBuild`] if any embedding fails or vector dimensions
    /// disagree or the index cannot be written under `persist_dir`. A failed
    /// write leaves any earlier index file untouched.
    pub async fn build<E: Embedder>(
        chunks: Vec<Chunk>,
        embedder: &E,
        persist_dir: &Path,
        chunking: Option<ChunkingParams>,
    ) -> Result<Self> {
        Self::build_with_timeout(chunks, embedder, persist_dir, chunking, None).await
    }

    /// Like [`VectorIndex::build`], bounding each embedding call by `timeout`.
    ///
    /// # Errors
    ///
    /// See [`VectorIndex::build`]; an elapsed deadline is an [`RagError::IndexBuild`].
    pub async fn build_with_timeout<E: Embedder>(
        chunks: Vec<Chunk>,
        embedder: &E,
        persist_dir: &Path,
        chunking: Option<ChunkingParams>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RagError::NoDocumentsFound("nothing to index".into()));
        }

        let embedder_id = embedder.embedder_id();
        tracing::info!(chunks = chunks.len(), embedder = %embedder_id, "building index");

        let mut dimension = None;
        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = crate::provider::embed(embedder, &chunk.text, timeout)
                .await
                .map_err(|e| {
                    RagError::IndexBuild(format!(
                        "embedding {}#{} failed: {e}",
                        chunk.metadata.source, chunk.metadata.chunk_id
                    ))
                })?;

            match dimension {
                None if vector.is_empty() => {
                    return Err(RagError::IndexBuild(
                        "embedder returned an empty vector".into(),
                    ));
                }
                None => dimension = Some(vector.len()),
                Some(dim) if dim != vector.len() => {
                    return Err(RagError::IndexBuild(format!(
                        "inconsistent embedding dimension: expected {dim}, got {}",
                        vector.len()
                    )));
                }
                Some(_) => {}
            }
            entries.push(IndexedVector {
                vector,
                payload: chunk,
            });
        }

        let payloads: Vec<&Chunk> = entries.iter().map(|e| &e.payload).collect();
        let document_count = payloads
            .iter()
            .map(|c| c.metadata.source.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            embedder: embedder_id,
            dimension: dimension.unwrap_or_default(),
            chunking,
            fingerprint: corpus_fingerprint(payloads),
            document_count,
            chunk_count: entries.len(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
        };

        let index = Self { manifest, entries };
        persist::write_atomic(persist_dir, &index)
            .await
            .map_err(|e| {
                RagError::IndexBuild(format!("persisting {}: {e}", persist_dir.display()))
            })?;
        tracing::info!(
            dir = %persist_dir.display(),
            chunks = index.len(),
            dimension = index.manifest.dimension,
            "index persisted"
        );
        Ok(index)
    }

    /// Reconstruct an index persisted by [`VectorIndex::build`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IndexNotFound`] if no index file exists, or
    /// [`RagError::IndexCorrupt`] if it cannot be read or fails validation.
    pub async fn load(persist_dir: &Path) -> Result<Self> {
        let index = persist::read_index(persist_dir).await?;
        tracing::debug!(
            dir = %persist_dir.display(),
            chunks = index.len(),
            embedder = %index.manifest.embedder,
            "index loaded"
        );
        Ok(index)
    }

    #[must_use]
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    #[must_use]
    pub fn embedder_id(&self) -> &EmbedderId {
        &self.manifest.embedder
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.manifest.dimension
    }

    #[must_use]
    pub fn entries(&self) -> &[IndexedVector] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `chunks` differ from the chunks this index was built from.
    #[must_use]
    pub fn is_stale(&self, chunks: &[Chunk]) -> bool {
        corpus_fingerprint(chunks) != self.manifest.fingerprint
    }
}
