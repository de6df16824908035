mod directory;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

use std::path::Path;

pub use directory::{LoaderOptions, load_documents};
#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

use super::DocumentError;

/// Reject `path` before reading it when its size exceeds `limit`.
async fn ensure_within_limit(path: &Path, limit: u64) -> Result<(), DocumentError> {
    let size = tokio::fs::metadata(path)
        .await
        .map_err(|e| DocumentError::io(path, e))?
        .len();
    if size > limit {
        return Err(DocumentError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    Ok(())
}
