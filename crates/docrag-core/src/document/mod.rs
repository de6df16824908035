pub mod error;
pub mod loader;
pub mod types;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub use error::DocumentError;
#[cfg(feature = "pdf")]
pub use loader::PdfLoader;
pub use loader::{LoaderOptions, TextLoader, load_documents};
pub use types::{Chunk, ChunkMetadata, Document, DocumentMetadata};

/// Files above this size (50 MiB) are skipped unless configured otherwise.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<Document, DocumentError>> + Send + 'a>>;

/// Turns one file of a known kind into a [`Document`].
pub trait DocumentLoader: Send + Sync {
    fn load<'a>(&'a self, path: &'a Path) -> LoadFuture<'a>;

    /// Lowercase file extensions this loader accepts, without the dot.
    fn extensions(&self) -> &'static [&'static str];
}
