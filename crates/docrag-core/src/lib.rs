//! Retrieval-augmented question answering over a local document set.
//!
//! Build phase: [`document::load_documents`] → [`splitter::chunk_documents`] →
//! [`index::VectorIndex::build`]. Query phase: [`retriever::Retriever`] →
//! [`synthesizer::AnswerSynthesizer`] → [`grounding::is_outside_corpus`].
//! [`engine::RagEngine`] ties both phases to an explicit index handle.

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod grounding;
pub mod index;
mod provider;
pub mod retriever;
pub mod splitter;
pub mod synthesizer;

pub use engine::{AnswerRecord, IndexReport, IndexStatus, RagEngine, ReindexParams};
pub use error::{RagError, Result};

use std::path::Path;
use std::sync::Arc;

use docrag_llm::{Completer, Embedder};

use crate::document::{Chunk, Document, LoaderOptions};
use crate::index::VectorIndex;
use crate::retriever::{RetrievalResult, Retriever};
use crate::splitter::SplitterConfig;
use crate::synthesizer::AnswerSynthesizer;

/// Read every supported file directly under `dir`.
///
/// # Errors
///
/// Returns an error if the directory is missing or cannot be read.
pub async fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    document::load_documents(dir, &LoaderOptions::default()).await
}

/// Split documents into overlapping chunks.
///
/// # Errors
///
/// Returns [`RagError::Configuration`] if `chunk_overlap >= chunk_size`.
pub fn chunk_documents(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>> {
    splitter::chunk_documents(
        documents,
        &SplitterConfig::new(chunk_size, chunk_overlap),
    )
}

/// Embed `chunks` and persist them under `persist_dir`, replacing any earlier index.
///
/// # Errors
///
/// Returns an error if `chunks` is empty, any embedding fails, or persisting fails.
pub async fn build_index<E: Embedder>(
    chunks: Vec<Chunk>,
    embedder: &E,
    persist_dir: &Path,
) -> Result<VectorIndex> {
    VectorIndex::build(chunks, embedder, persist_dir, None).await
}

/// Wrap an index with a fixed top-k similarity policy.
///
/// # Errors
///
/// Returns an error if `k == 0` or `embedder` differs from the one the index was built with.
pub fn get_retriever<E: Embedder>(
    index: Arc<VectorIndex>,
    embedder: Arc<E>,
    k: usize,
) -> Result<Retriever<E>> {
    Retriever::new(index, embedder, k)
}

/// Retrieve context for `question` and complete a grounded answer.
///
/// # Errors
///
/// Returns an error if retrieval or completion fails, or the context is too large.
pub async fn answer<E: Embedder, C: Completer>(
    question: &str,
    retriever: &Retriever<E>,
    completer: &C,
) -> Result<(String, RetrievalResult)> {
    AnswerSynthesizer::new(completer)
        .answer(question, retriever)
        .await
}
