//! Provider calls bounded by an optional deadline.

use std::time::Duration;

use docrag_llm::{Completer, Embedder, LlmError};

pub(crate) async fn embed<E: Embedder>(
    embedder: &E,
    text: &str,
    timeout: Option<Duration>,
) -> Result<Vec<f32>, LlmError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, embedder.embed(text))
            .await
            .map_err(|_| LlmError::Timeout { after: limit })?,
        None => embedder.embed(text).await,
    }
}

pub(crate) async fn complete<C: Completer>(
    completer: &C,
    prompt: &str,
    temperature: f32,
    timeout: Option<Duration>,
) -> Result<String, LlmError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, completer.complete(prompt, temperature))
            .await
            .map_err(|_| LlmError::Timeout { after: limit })?,
        None => completer.complete(prompt, temperature).await,
    }
}
