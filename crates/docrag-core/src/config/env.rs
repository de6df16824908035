use std::path::PathBuf;

use super::{Config, ProviderKind, Secret, UnindexedPolicy};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_pipeline();
        self.apply_env_overrides_providers();
        self.apply_env_secrets();
    }

    fn apply_env_overrides_pipeline(&mut self) {
        if let Ok(v) = std::env::var("DOCRAG_DOCS_DIR") {
            self.documents.dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DOCRAG_DOCS_RECURSIVE")
            && let Ok(recursive) = v.parse::<bool>()
        {
            self.documents.recursive = recursive;
        }
        if let Ok(v) = std::env::var("DOCRAG_CHUNK_SIZE")
            && let Ok(size) = v.parse::<usize>()
        {
            self.chunking.chunk_size = size;
        }
        if let Ok(v) = std::env::var("DOCRAG_CHUNK_OVERLAP")
            && let Ok(overlap) = v.parse::<usize>()
        {
            self.chunking.chunk_overlap = overlap;
        }
        if let Ok(v) = std::env::var("DOCRAG_PERSIST_DIR") {
            self.index.persist_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("DOCRAG_ON_UNINDEXED") {
            match v.to_lowercase().as_str() {
                "build" => self.index.on_unindexed = UnindexedPolicy::Build,
                "fail" => self.index.on_unindexed = UnindexedPolicy::Fail,
                _ => tracing::warn!("ignoring invalid DOCRAG_ON_UNINDEXED value: {v}"),
            }
        }
        if let Ok(v) = std::env::var("DOCRAG_REBUILD_IF_STALE")
            && let Ok(rebuild) = v.parse::<bool>()
        {
            self.index.rebuild_if_stale = rebuild;
        }
        if let Ok(v) = std::env::var("DOCRAG_TOP_K")
            && let Ok(k) = v.parse::<usize>()
        {
            self.retrieval.top_k = k;
        }
        if let Ok(v) = std::env::var("DOCRAG_TIMEOUT_LLM")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.llm_seconds = secs;
        }
        if let Ok(v) = std::env::var("DOCRAG_TIMEOUT_EMBEDDING")
            && let Ok(secs) = v.parse::<u64>()
        {
            self.timeouts.embedding_seconds = secs;
        }
    }

    fn apply_env_overrides_providers(&mut self) {
        if let Ok(v) = std::env::var("DOCRAG_LLM_PROVIDER") {
            if let Some(kind) = parse_provider(&v) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid DOCRAG_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("DOCRAG_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCRAG_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DOCRAG_EMBEDDING_PROVIDER") {
            if let Some(kind) = parse_provider(&v) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid DOCRAG_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("DOCRAG_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCRAG_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
    }

    fn apply_env_secrets(&mut self) {
        if let Ok(v) = std::env::var("DOCRAG_LLM_API_KEY")
            && !v.is_empty()
        {
            self.secrets.llm_api_key = Some(Secret::new(v));
        }
        if let Ok(v) = std::env::var("DOCRAG_EMBEDDING_API_KEY")
            && !v.is_empty()
        {
            self.secrets.embedding_api_key = Some(Secret::new(v));
        }
    }
}

fn parse_provider(value: &str) -> Option<ProviderKind> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase())).ok()
}
