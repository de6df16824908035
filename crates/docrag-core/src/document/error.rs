use std::path::{Path, PathBuf};

/// Failure to read one file. [`super::load_documents`] logs these and moves on.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .0.display())]
    NotUtf8(PathBuf),

    #[error("{} is {size} bytes, over the {limit} byte limit", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[cfg(feature = "pdf")]
    #[error("failed to extract text from {}: {reason}", .path.display())]
    Pdf { path: PathBuf, reason: String },
}

impl DocumentError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
