use std::path::Path;

use super::ensure_within_limit;
use crate::document::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, LoadFuture};

/// UTF-8 plain text and Markdown.
#[derive(Debug, Clone)]
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let markdown = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"));
    if markdown {
        "text/markdown"
    } else {
        "text/plain"
    }
}

impl DocumentLoader for TextLoader {
    fn load<'a>(&'a self, path: &'a Path) -> LoadFuture<'a> {
        Box::pin(async move {
            ensure_within_limit(path, self.max_file_size).await?;
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| DocumentError::io(path, e))?;
            let text =
                String::from_utf8(bytes).map_err(|_| DocumentError::NotUtf8(path.to_path_buf()))?;
            Ok(Document::new(text, path.display().to_string())
                .with_content_type(content_type_for(path)))
        })
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["txt", "md", "markdown"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let file = dir.join(name);
        std::fs::write(&file, bytes).unwrap();
        file
    }

    #[tokio::test]
    async fn reads_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "notes.txt", b"The sky is blue.");

        let doc = TextLoader::default().load(&file).await.unwrap();
        assert_eq!(doc.text, "The sky is blue.");
        assert_eq!(doc.metadata.content_type, "text/plain");
        assert_eq!(doc.metadata.source, file.display().to_string());
    }

    #[tokio::test]
    async fn markdown_content_type_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "GUIDE.MD", b"# Title");

        let doc = TextLoader::default().load(&file).await.unwrap();
        assert_eq!(doc.metadata.content_type, "text/markdown");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let result = TextLoader::default()
            .load(Path::new("/nonexistent/file.txt"))
            .await;
        assert!(matches!(result, Err(DocumentError::Io { .. })));
    }

    #[tokio::test]
    async fn invalid_utf8_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "bin.txt", &[0xff, 0xfe, 0x00, 0xc3]);

        let result = TextLoader::default().load(&file).await;
        assert!(matches!(result, Err(DocumentError::NotUtf8(p)) if p == file));
    }

    #[tokio::test]
    async fn size_limit_checked_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "big.txt", b"xy");

        let result = TextLoader { max_file_size: 1 }.load(&file).await;
        assert!(matches!(
            result,
            Err(DocumentError::TooLarge {
                size: 2,
                limit: 1,
                ..
            })
        ));
    }
}
