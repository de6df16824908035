use super::{RetrievalResult, RetrievedChunk, VectorIndex};
use crate::error::{RagError, Result};

impl VectorIndex {
    /// The `k` entries most similar to `query` by cosine similarity.
    ///
    /// Ties keep insertion order. `k` larger than the index returns every entry.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingProviderMismatch`] if `query` has a
    /// different dimension than the indexed vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        if query.len() != self.manifest.dimension {
            return Err(RagError::dimension_mismatch(
                self.manifest.dimension,
                query.len(),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.vector)))
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| RetrievedChunk {
                chunk: self.entries[i].payload.clone(),
                score,
            })
            .collect())
    }
}

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
