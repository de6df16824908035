use std::io::Write;
use std::path::{Path, PathBuf};

use super::VectorIndex;
use crate::document::Chunk;
use crate::error::{RagError, Result};

pub const INDEX_FILE: &str = "index.json";
pub const FORMAT_VERSION: u32 = 1;

/// Hex blake3 digest over `(source, text)` of each chunk, in order.
#[must_use]
pub fn corpus_fingerprint<'a>(chunks: impl IntoIterator<Item = &'a Chunk>) -> String {
    let mut hasher = blake3::Hasher::new();
    for chunk in chunks {
        for field in [chunk.metadata.source.as_bytes(), chunk.text.as_bytes()] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Write to a temp file in `dir`, then rename over [`INDEX_FILE`].
pub(super) async fn write_atomic(dir: &Path, index: &VectorIndex) -> Result<()> {
    let bytes = serde_json::to_vec(index)?;
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dir.join(INDEX_FILE)).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| RagError::Io(std::io::Error::other(e)))?
}

pub(super) async fn read_index(dir: &Path) -> Result<VectorIndex> {
    let path = dir.join(INDEX_FILE);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RagError::IndexNotFound(dir.to_path_buf()));
        }
        Err(e) => return Err(corrupt(path, e.to_string())),
    };

    let index: VectorIndex =
        serde_json::from_slice(&bytes).map_err(|e| corrupt(path.clone(), e.to_string()))?;
    validate(&index).map_err(|reason| corrupt(path, reason))?;
    Ok(index)
}

fn validate(index: &VectorIndex) -> std::result::Result<(), String> {
    let manifest = &index.manifest;
    if manifest.format_version != FORMAT_VERSION {
        return Err(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            manifest.format_version
        ));
    }
    if manifest.chunk_count != index.entries.len() {
        return Err(format!(
            "manifest lists {} chunks but {} are stored",
            manifest.chunk_count,
            index.entries.len()
        ));
    }
    if let Some(entry) = index
        .entries
        .iter()
        .find(|e| e.vector.len() != manifest.dimension)
    {
        return Err(format!(
            "vector for {}#{} has dimension {}, expected {}",
            entry.payload.metadata.source,
            entry.payload.metadata.chunk_id,
            entry.vector.len(),
            manifest.dimension
        ));
    }
    Ok(())
}

fn corrupt(path: PathBuf, reason: String) -> RagError {
    RagError::IndexCorrupt { path, reason }
}

#[cfg(test)]
mod tests {
    use docrag_llm::mock::MockProvider;

    use super::super::tests::chunk;
    use super::*;

    async fn built(dir: &Path) -> VectorIndex {
        VectorIndex::build(
            vec![chunk("a.txt", 0, "alpha"), chunk("a.txt", 1, "beta")],
            &MockProvider::default(),
            dir,
            None,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn missing_index_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_index(dir.path()).await;
        assert!(matches!(result, Err(RagError::IndexNotFound(p)) if p == dir.path()));
    }

    #[tokio::test]
    async fn malformed_json_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), "{not json").unwrap();
        let result = read_index(dir.path()).await;
        assert!(matches!(result, Err(RagError::IndexCorrupt { .. })));
    }

    #[tokio::test]
    async fn unknown_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = built(dir.path()).await;
        index.manifest.format_version = FORMAT_VERSION + 1;
        write_atomic(dir.path(), &index).await.unwrap();

        let result = read_index(dir.path()).await;
        assert!(
            matches!(result, Err(RagError::IndexCorrupt { reason, .. }) if reason.contains("version"))
        );
    }

    #[tokio::test]
    async fn truncated_vector_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = built(dir.path()).await;
        index.entries[1].vector.pop();
        write_atomic(dir.path(), &index).await.unwrap();

        let result = read_index(dir.path()).await;
        assert!(
            matches!(result, Err(RagError::IndexCorrupt { reason, .. }) if reason.contains("a.txt#1"))
        );
    }

    #[tokio::test]
    async fn rewrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        built(dir.path()).await;
        built(dir.path()).await;

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![INDEX_FILE.to_owned()]);
    }

    #[tokio::test]
    async fn creates_missing_persist_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("db").join("index");
        built(&nested).await;
        assert!(nested.join(INDEX_FILE).exists());
    }

    #[test]
    fn fingerprint_is_order_and_boundary_sensitive() {
        let a = [chunk("x", 0, "ab"), chunk("x", 1, "c")];
        let b = [chunk("x", 0, "a"), chunk("x", 1, "bc")];
        let reversed = [chunk("x", 1, "c"), chunk("x", 0, "ab")];
        assert_eq!(corpus_fingerprint(&a), corpus_fingerprint(&a));
        assert_ne!(corpus_fingerprint(&a), corpus_fingerprint(&b));
        assert_ne!(corpus_fingerprint(&a), corpus_fingerprint(&reversed));
    }
}
