//! Embedding and completion capabilities consumed by the retrieval pipeline.
//!
//! The pipeline only ever sees the [`Embedder`] and [`Completer`] traits; the
//! concrete backends (Ollama, OpenAI-compatible REST, test mocks) live behind
//! them and are selected at runtime through [`any::AnyProvider`].

pub mod any;
pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use error::LlmError;
pub use provider::{Completer, Embedder, EmbedderId};
