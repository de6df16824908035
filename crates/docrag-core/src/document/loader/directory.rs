use std::path::{Path, PathBuf};

#[cfg(feature = "pdf")]
use super::PdfLoader;
use super::TextLoader;
use crate::document::{DEFAULT_MAX_FILE_SIZE, Document, DocumentLoader};
use crate::error::{RagError, Result};

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    pub max_file_size: u64,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Read every text and PDF file under `dir`, sorted by path.
///
/// Hidden files, unsupported extensions and files that fail to load are skipped.
/// An existing directory with no matching files yields an empty vector.
///
/// # Errors
///
/// Returns [`RagError::NoDocumentsFound`] if `dir` does not exist, or
/// [`RagError::Io`] if it cannot be accessed or is not a directory.
pub async fn load_documents(dir: &Path, options: &LoaderOptions) -> Result<Vec<Document>> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(RagError::Io(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("{} is not a directory", dir.display()),
            )));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RagError::NoDocumentsFound(format!(
                "{} does not exist",
                dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    }

    let text = TextLoader {
        max_file_size: options.max_file_size,
    };
    #[cfg(feature = "pdf")]
    let pdf = PdfLoader {
        max_file_size: options.max_file_size,
    };
    #[allow(unused_mut)]
    let mut loaders: Vec<&dyn DocumentLoader> = vec![&text];
    #[cfg(feature = "pdf")]
    loaders.push(&pdf);

    let mut documents = Vec::new();
    for path in discover_files(dir, options.recursive) {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let Some(loader) = ext.as_deref().and_then(|ext| {
            loaders
                .iter()
                .find(|l| l.extensions().contains(&ext))
        }) else {
            tracing::debug!(path = %path.display(), "skipping unsupported file");
            continue;
        };

        match loader.load(&path).await {
            Ok(doc) => documents.push(doc),
            Err(e) => tracing::warn!("skipping file: {e}"),
        }
    }

    tracing::info!(
        dir = %dir.display(),
        documents = documents.len(),
        "documents loaded"
    );
    Ok(documents)
}

fn discover_files(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut builder = ignore::WalkBuilder::new(dir);
    builder.standard_filters(false).hidden(true);
    if !recursive {
        builder.max_depth(Some(1));
    }

    let mut paths: Vec<PathBuf> = builder
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping directory entry: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .collect();
    paths.sort();
    paths
}
