use std::io::Write;
use std::path::Path;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 18] = [
    "DOCRAG_DOCS_DIR",
    "DOCRAG_DOCS_RECURSIVE",
    "DOCRAG_CHUNK_SIZE",
    "DOCRAG_CHUNK_OVERLAP",
    "DOCRAG_PERSIST_DIR",
    "DOCRAG_ON_UNINDEXED",
    "DOCRAG_REBUILD_IF_STALE",
    "DOCRAG_TOP_K",
    "DOCRAG_TIMEOUT_LLM",
    "DOCRAG_TIMEOUT_EMBEDDING",
    "DOCRAG_LLM_PROVIDER",
    "DOCRAG_LLM_BASE_URL",
    "DOCRAG_LLM_MODEL",
    "DOCRAG_EMBEDDING_PROVIDER",
    "DOCRAG_EMBEDDING_BASE_URL",
    "DOCRAG_EMBEDDING_MODEL",
    "DOCRAG_LLM_API_KEY",
    "DOCRAG_EMBEDDING_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("docrag.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{body}").unwrap();
    path
}

#[test]
fn defaults_match_reference_pipeline() {
    let config = Config::default();
    assert_eq!(config.documents.dir, Path::new("docs"));
    assert!(!config.documents.recursive);
    assert_eq!(config.chunking.chunk_size, 1000);
    assert_eq!(config.chunking.chunk_overlap, 100);
    assert_eq!(config.index.persist_dir, Path::new("db"));
    assert_eq!(config.index.on_unindexed, UnindexedPolicy::Build);
    assert!(config.index.rebuild_if_stale);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.embedding.model, "all-minilm");
    assert_eq!(config.timeouts.llm_seconds, 120);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.retrieval.top_k, 3);
}

#[test]
#[serial]
fn parse_valid_toml() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[documents]
dir = "./corpus"
recursive = true

[chunking]
chunk_size = 500
chunk_overlap = 50

[index]
persist_dir = "./store"
on_unindexed = "fail"
rebuild_if_stale = false

[retrieval]
top_k = 5
context_budget_tokens = 4096

[llm]
provider = "openai"
name = "groq"
base_url = "https://api.groq.com/openai/v1"
model = "llama-3.1-8b-instant"

[embedding]
model = "nomic-embed-text"

[timeouts]
llm_seconds = 0
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.documents.dir, Path::new("./corpus"));
    assert!(config.documents.recursive);
    assert_eq!(config.chunking.chunk_size, 500);
    assert_eq!(config.index.on_unindexed, UnindexedPolicy::Fail);
    assert!(!config.index.rebuild_if_stale);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.retrieval.context_budget_tokens, Some(4096));
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.llm.name.as_deref(), Some("groq"));
    assert_eq!(config.embedding.provider, ProviderKind::Ollama);
    assert_eq!(config.embedding.model, "nomic-embed-text");
    assert!(config.llm_timeout().is_none());
    assert_eq!(
        config.embedding_timeout(),
        Some(std::time::Duration::from_secs(30))
    );
}

#[test]
#[serial]
fn partial_sections_keep_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[chunking]\nchunk_size = 300\n");

    let config = Config::load(&path).unwrap();
    assert_eq!(config.chunking.chunk_size, 300);
    assert_eq!(config.chunking.chunk_overlap, 100);
    assert_eq!(config.retrieval.top_k, 3);
}

#[test]
#[serial]
fn malformed_toml_is_configuration_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[chunking\nchunk_size = ");
    assert!(matches!(
        Config::load(&path),
        Err(RagError::Configuration(_))
    ));
}

#[test]
#[serial]
fn overlap_not_less_than_size_fails_validation() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "[chunking]\nchunk_size = 100\nchunk_overlap = 100\n",
    );
    assert!(matches!(
        Config::load(&path),
        Err(RagError::Configuration(_))
    ));
}

#[test]
fn zero_top_k_fails_validation() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    assert!(matches!(
        config.validate(),
        Err(RagError::Configuration(msg)) if msg.contains("top_k")
    ));
}

#[test]
fn empty_model_fails_validation() {
    let mut config = Config::default();
    config.embedding.model = "  ".into();
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[retrieval]\ntop_k = 5\n");

    unsafe {
        std::env::set_var("DOCRAG_TOP_K", "7");
        std::env::set_var("DOCRAG_DOCS_DIR", "/data/docs");
        std::env::set_var("DOCRAG_CHUNK_SIZE", "200");
        std::env::set_var("DOCRAG_CHUNK_OVERLAP", "20");
        std::env::set_var("DOCRAG_ON_UNINDEXED", "FAIL");
        std::env::set_var("DOCRAG_LLM_PROVIDER", "OpenAI");
        std::env::set_var("DOCRAG_EMBEDDING_MODEL", "mxbai-embed-large");
        std::env::set_var("DOCRAG_TIMEOUT_EMBEDDING", "5");
    }
    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.retrieval.top_k, 7);
    assert_eq!(config.documents.dir, Path::new("/data/docs"));
    assert_eq!(config.chunking.chunk_size, 200);
    assert_eq!(config.chunking.chunk_overlap, 20);
    assert_eq!(config.index.on_unindexed, UnindexedPolicy::Fail);
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.embedding.model, "mxbai-embed-large");
    assert_eq!(config.timeouts.embedding_seconds, 5);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("DOCRAG_TOP_K", "many");
        std::env::set_var("DOCRAG_LLM_PROVIDER", "carrier-pigeon");
        std::env::set_var("DOCRAG_ON_UNINDEXED", "maybe");
    }
    let mut config = Config::default();
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.index.on_unindexed, UnindexedPolicy::Build);
}

#[test]
#[serial]
fn api_keys_only_from_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[llm]\nprovider = \"openai\"\n");

    let without = Config::load(&path).unwrap();
    assert!(without.secrets.llm_api_key.is_none());

    unsafe {
        std::env::set_var("DOCRAG_LLM_API_KEY", "gsk-secret");
        std::env::set_var("DOCRAG_EMBEDDING_API_KEY", "");
    }
    let with = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(
        with.secrets.llm_api_key.as_ref().map(Secret::expose),
        Some("gsk-secret")
    );
    assert!(with.secrets.embedding_api_key.is_none());
}

#[test]
fn secret_is_redacted() {
    let secret = Secret::new("gsk-secret");
    assert_eq!(format!("{secret:?}"), "[REDACTED]");
    assert_eq!(secret.to_string(), "[REDACTED]");

    let secrets = ResolvedSecrets {
        llm_api_key: Some(secret),
        embedding_api_key: None,
    };
    assert!(!format!("{secrets:?}").contains("gsk-secret"));
}

#[test]
fn provider_kind_display() {
    assert_eq!(ProviderKind::Ollama.to_string(), "ollama");
    assert_eq!(ProviderKind::OpenAi.to_string(), "openai");
}

#[test]
fn splitter_and_loader_follow_config() {
    let mut config = Config::default();
    config.chunking.chunk_size = 64;
    config.chunking.chunk_overlap = 8;
    config.documents.recursive = true;

    let splitter = config.splitter_config();
    assert_eq!((splitter.chunk_size, splitter.chunk_overlap), (64, 8));
    assert!(config.loader_options().recursive);
}
