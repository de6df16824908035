mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;
use std::time::Duration;

use crate::document::LoaderOptions;
use crate::error::{RagError, Result};
use crate::splitter::SplitterConfig;

impl Config {
    /// Load configuration from a TOML file with env var overrides, then validate.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or the
    /// resulting configuration is invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Self>(&content).map_err(|e| {
                RagError::Configuration(format!("failed to parse {}: {e}", path.display()))
            })?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.splitter_config().validate()?;
        if self.retrieval.top_k == 0 {
            return Err(RagError::Configuration(
                "retrieval.top_k must be at least 1".into(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(RagError::Configuration("llm.model must not be empty".into()));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(RagError::Configuration(
                "embedding.model must not be empty".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn splitter_config(&self) -> SplitterConfig {
        SplitterConfig::new(self.chunking.chunk_size, self.chunking.chunk_overlap)
    }

    #[must_use]
    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            recursive: self.documents.recursive,
            max_file_size: self.documents.max_file_size,
        }
    }

    /// `None` when `timeouts.llm_seconds` is 0.
    #[must_use]
    pub fn llm_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.timeouts.llm_seconds)
    }

    /// `None` when `timeouts.embedding_seconds` is 0.
    #[must_use]
    pub fn embedding_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.timeouts.embedding_seconds)
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
