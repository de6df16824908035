use std::time::Duration;

use docrag_llm::{Completer, Embedder};

use crate::error::{RagError, Result};
use crate::retriever::{RetrievalResult, Retriever};

/// Completions are requested at this temperature.
pub const ANSWER_TEMPERATURE: f32 = 0.0;

/// Concatenate chunk texts in rank order, separated by a blank line.
#[must_use]
pub fn build_context(retrieved: &RetrievalResult) -> String {
    retrieved
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[must_use]
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant.\n\
         Answer ONLY using the context below.\n\
         If the answer is not in the context, say \"I don't know\".\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question:\n\
         {question}"
    )
    .trim_end()
    .to_owned()
}

/// Estimate token count using chars/4 heuristic.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

pub struct AnswerSynthesizer<'a, C> {
    completer: &'a C,
    context_limit: Option<usize>,
    timeout: Option<Duration>,
}

impl<'a, C: Completer> AnswerSynthesizer<'a, C> {
    #[must_use]
    pub fn new(completer: &'a C) -> Self {
        Self {
            completer,
            context_limit: None,
            timeout: None,
        }
    }

    /// Token budget for the prompt, overriding the completer's context window.
    #[must_use]
    pub fn with_context_limit(mut self, tokens: usize) -> Self {
        self.context_limit = Some(tokens);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Retrieve context for `question` and ask the completer to answer from it.
    ///
    /// Returns the raw completion and the retrieved chunks in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ContextTooLarge`] if the prompt exceeds the token
    /// budget, or [`RagError::ProviderUnavailable`] if a provider call fails.
    pub async fn answer<E: Embedder>(
        &self,
        question: &str,
        retriever: &Retriever<E>,
    ) -> Result<(String, RetrievalResult)> {
        let retrieved = retriever.retrieve(question).await?;
        let prompt = build_prompt(&build_context(&retrieved), question);

        if let Some(limit) = self.context_limit.or_else(|| self.completer.context_window()) {
            let estimated = estimate_tokens(&prompt);
            if estimated > limit {
                return Err(RagError::ContextTooLarge { estimated, limit });
            }
        }

        let answer = crate::provider::complete(
            self.completer,
            &prompt,
            ANSWER_TEMPERATURE,
            self.timeout,
        )
        .await?;
        tracing::debug!(
            completer = self.completer.name(),
            chunks = retrieved.len(),
            "answer synthesized"
        );
        Ok((answer, retrieved))
    }
}
