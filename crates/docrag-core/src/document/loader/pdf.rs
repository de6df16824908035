use std::path::Path;

use super::ensure_within_limit;
use crate::document::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, LoadFuture};

/// Text layer of PDF files, extracted on the blocking pool.
#[derive(Debug, Clone)]
pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load<'a>(&'a self, path: &'a Path) -> LoadFuture<'a> {
        Box::pin(async move {
            ensure_within_limit(path, self.max_file_size).await?;

            let owned = path.to_path_buf();
            let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
                .await
                .map_err(|e| DocumentError::Pdf {
                    path: path.to_path_buf(),
                    reason: format!("extraction task failed: {e}"),
                })?;
            let text = extracted.map_err(|e| DocumentError::Pdf {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

            Ok(Document::new(text, path.display().to_string()).with_content_type("application/pdf"))
        })
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["pdf"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn garbage_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.pdf");
        std::fs::write(&file, "not a pdf").unwrap();

        let result = PdfLoader::default().load(&file).await;
        assert!(matches!(result, Err(DocumentError::Pdf { .. })));
    }

    #[tokio::test]
    async fn oversized_pdf_never_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.pdf");
        std::fs::write(&file, "%PDF-1.4").unwrap();

        let result = PdfLoader { max_file_size: 1 }.load(&file).await;
        assert!(matches!(result, Err(DocumentError::TooLarge { .. })));
    }
}
