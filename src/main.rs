use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docrag_core::config::{Config, ProviderKind};
use docrag_core::{AnswerRecord, RagEngine, ReindexParams};
use docrag_llm::any::AnyProvider;
use docrag_llm::ollama::OllamaProvider;
use docrag_llm::openai::OpenAiProvider;
use docrag_llm::Completer;

const PREVIEW_CHARS: usize = 220;

#[derive(Debug, Parser)]
#[command(name = "docrag", version, about = "Answer questions from a local document set")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        long,
        global = true,
        env = "DOCRAG_CONFIG",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rebuild the index from the documents directory.
    Index {
        #[arg(long)]
        chunk_size: Option<usize>,
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Answer a question from the indexed documents.
    Ask {
        question: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show whether an index is loaded and whether it is stale.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    let completer = create_completer(&config)?;
    let embedder = create_embedder(&config)?;
    health_check(&completer).await;

    match cli.command {
        Command::Index {
            chunk_size,
            chunk_overlap,
        } => {
            let engine = RagEngine::new(config, embedder, completer);
            let report = engine
                .reindex(ReindexParams {
                    chunk_size,
                    chunk_overlap,
                })
                .await
                .context("indexing failed")?;
            println!(
                "indexed {} documents into {} chunks ({}-dim, {}) at {} in {:.1}s",
                report.documents,
                report.chunks,
                report.dimension,
                report.embedder,
                report.persist_dir.display(),
                report.elapsed.as_secs_f64()
            );
        }
        Command::Ask { question, top_k } => {
            let engine = RagEngine::open(config, embedder, detect_context_window(completer).await)
                .await
                .context("failed to open index")?;
            let record = engine
                .ask(&question, top_k)
                .await
                .context("failed to answer question")?;
            print!("{}", render_answer(&record));
        }
        Command::Status => {
            let engine = RagEngine::open(config, embedder, completer)
                .await
                .context("failed to open index")?;
            let status = engine.status().await;
            println!("documents dir: {}", status.docs_dir.display());
            println!("index dir:     {}", status.persist_dir.display());
            if !status.indexed {
                println!("indexed:       no");
                return Ok(());
            }
            println!("indexed:       yes");
            println!("documents:     {}", status.document_count);
            println!("chunks:        {}", status.chunk_count);
            if let Some(embedder) = &status.embedder {
                println!("embedder:      {embedder}");
            }
            if let Some(chunking) = status.chunking {
                println!(
                    "chunking:      size {} overlap {}",
                    chunking.chunk_size, chunking.chunk_overlap
                );
            }
            let stale = engine
                .check_stale()
                .await
                .context("failed to compare index with documents")?;
            println!(
                "stale:         {}",
                if stale == Some(true) { "yes" } else { "no" }
            );
        }
    }

    Ok(())
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn create_completer(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    match llm.provider {
        ProviderKind::Ollama => {
            let mut provider =
                OllamaProvider::new(&llm.base_url, llm.model.clone(), config.embedding.model.clone());
            if let Some(ctx) = llm.context_window {
                provider.set_context_window(ctx);
            }
            Ok(AnyProvider::Ollama(provider))
        }
        ProviderKind::OpenAi => {
            let api_key = config
                .secrets
                .llm_api_key
                .as_ref()
                .context("DOCRAG_LLM_API_KEY required for openai llm provider")?
                .expose()
                .to_owned();
            let mut provider = OpenAiProvider::new(
                llm.name.clone().unwrap_or_else(|| "openai".into()),
                api_key,
                llm.base_url.clone(),
                llm.model.clone(),
                llm.max_tokens,
                None,
            );
            if let Some(ctx) = llm.context_window {
                provider = provider.with_context_window(ctx);
            }
            Ok(AnyProvider::OpenAi(provider))
        }
    }
}

fn create_embedder(config: &Config) -> anyhow::Result<AnyProvider> {
    let embedding = &config.embedding;
    match embedding.provider {
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &embedding.base_url,
            config.llm.model.clone(),
            embedding.model.clone(),
        ))),
        ProviderKind::OpenAi => {
            let api_key = config
                .secrets
                .embedding_api_key
                .as_ref()
                .context("DOCRAG_EMBEDDING_API_KEY required for openai embedding provider")?
                .expose()
                .to_owned();
            Ok(AnyProvider::OpenAi(OpenAiProvider::new(
                embedding.name.clone().unwrap_or_else(|| "openai".into()),
                api_key,
                embedding.base_url.clone(),
                embedding.model.clone(),
                1,
                Some(embedding.model.clone()),
            )))
        }
    }
}

async fn health_check(provider: &AnyProvider) {
    match provider.health_check().await {
        Ok(()) => tracing::debug!("llm provider reachable"),
        Err(e) => tracing::warn!("llm health check failed: {e:#}"),
    }
}

async fn detect_context_window(mut provider: AnyProvider) -> AnyProvider {
    if let AnyProvider::Ollama(ref mut ollama) = provider
        && ollama.context_window().is_none()
    {
        match ollama.detect_context_window().await {
            Ok(Some(ctx)) => tracing::info!(context_window = ctx, "detected Ollama model context window"),
            Ok(None) => tracing::debug!("Ollama model reports no context window"),
            Err(e) => tracing::warn!("context window detection failed: {e}"),
        }
    }
    provider
}

fn render_answer(record: &AnswerRecord) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "{}", record.answer.trim());
    if record.outside_corpus {
        let _ = writeln!(
            out,
            "\nnote: the answer could not be found in the indexed documents"
        );
    }
    if !record.retrieved.is_empty() {
        let _ = writeln!(out, "\nretrieved:");
    }
    for (rank, hit) in record.retrieved.iter().enumerate() {
        let meta = &hit.chunk.metadata;
        let preview = hit.chunk.preview(PREVIEW_CHARS).replace('\n', " ");
        let _ = writeln!(
            out,
            "  {}. {}#{} (score {:.3})\n     {}",
            rank + 1,
            meta.source,
            meta.chunk_id,
            hit.score,
            preview.trim()
        );
    }
    out
}
