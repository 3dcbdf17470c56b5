//! Command-line front end for the IPC legal assistant.
//!
//! # Usage
//!
//! ```bash
//! # Build the index from ./docs into ./index
//! cargo run -p nyaya-cli -- ingest
//!
//! # Ask a question
//! GEMINI_API_KEY=xxx cargo run -p nyaya-cli -- ask "What is Section 302 IPC?"
//!
//! # Check whether the index loads
//! cargo run -p nyaya-cli -- status
//! ```
//!
//! Settings are read from `nyaya.toml` when present (or `--config <file>`); environment
//! variables and flags override them. Set `RUST_LOG` or pass `--verbose` for more logs.

mod provider;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nyaya::{
    AnswerFormatter, EmbeddingModel, IndexKind, IngestOutcome, LegalAssistant, Readiness,
    nyaya_core::llm::model::Parameters, nyaya_rag::IndexStage,
};
use tracing_subscriber::EnvFilter;

use crate::provider::{Embedder, GEMINI_KEY_VAR};
use crate::settings::{EmbeddingBackend, Settings};

#[derive(Parser, Debug)]
#[command(name = "nyaya", version, about = "Question answering over the Indian Penal Code")]
struct Args {
    /// Settings file. Defaults to ./nyaya.toml when it exists.
    #[arg(short, long, global = true, env = "NYAYA_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the persisted index.
    #[arg(long, global = true, env = "NYAYA_INDEX_DIR")]
    index_dir: Option<PathBuf>,

    /// Embedding backend.
    #[arg(long, global = true, env = "NYAYA_EMBEDDING")]
    embedding: Option<EmbeddingBackend>,

    /// ONNX model directory for the `ort` embedding backend.
    #[arg(long, global = true, env = "NYAYA_MODEL_DIR")]
    model_dir: Option<PathBuf>,

    /// Gemini API key.
    #[arg(long, global = true, env = GEMINI_KEY_VAR, hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, chunk and embed every PDF in a directory and write the index.
    Ingest {
        /// Directory scanned for PDFs.
        #[arg(long, env = "NYAYA_PDF_DIR")]
        pdf_dir: Option<PathBuf>,
        /// Maximum characters per chunk.
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Characters shared by consecutive chunks.
        #[arg(long)]
        chunk_overlap: Option<usize>,
        /// Build an approximate HNSW index instead of an exact one.
        #[arg(long)]
        hnsw: bool,
    },
    /// Answer one question.
    Ask {
        /// The question.
        question: String,
        /// Chunks retrieved per question.
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Gemini model answering the question.
        #[arg(short, long, env = "NYAYA_MODEL")]
        model: Option<String>,
        /// Seconds to wait for the answer. `0` waits indefinitely.
        #[arg(long)]
        timeout: Option<u64>,
        /// Answer from general knowledge when no index is available.
        #[arg(long)]
        ungrounded: bool,
    },
    /// Report whether the index loads.
    Status,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error:#}");
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut settings = Settings::load(args.config.as_deref())?;
    apply_global_overrides(&mut settings, &args);

    match args.command {
        Command::Ingest {
            pdf_dir,
            chunk_size,
            chunk_overlap,
            hnsw,
        } => {
            if let Some(dir) = pdf_dir {
                settings.pdf_dir = dir;
            }
            if let Some(size) = chunk_size {
                settings.rag.chunk_size = size;
            }
            if let Some(overlap) = chunk_overlap {
                settings.rag.chunk_overlap = overlap;
            }
            if hnsw {
                settings.set_index_kind(IndexKind::Hnsw);
            }
            settings.rag.validate()?;
            ingest(&settings).await
        }
        Command::Ask {
            question,
            top_k,
            model,
            timeout,
            ungrounded,
        } => {
            if let Some(k) = top_k {
                settings.rag.top_k = k;
            }
            if let Some(model) = model {
                settings.generation.model = model;
            }
            if let Some(secs) = timeout {
                settings.generation.timeout_secs = secs;
            }
            settings.rag.validate()?;
            ask(&settings, &question, ungrounded).await
        }
        Command::Status => status(&settings),
    }
}

fn apply_global_overrides(settings: &mut Settings, args: &Args) {
    if let Some(dir) = &args.index_dir {
        settings.index_dir.clone_from(dir);
    }
    if let Some(backend) = args.embedding {
        settings.embedding.backend = backend;
    }
    if let Some(dir) = &args.model_dir {
        settings.embedding.model_dir.clone_from(dir);
    }
    if args.gemini_api_key.is_some() {
        settings.gemini_api_key.clone_from(&args.gemini_api_key);
    }
}

async fn ingest(settings: &Settings) -> Result<ExitCode> {
    let embedder = Arc::new(Embedder::from_settings(settings)?);
    tracing::info!(
        model = embedder.model_id(),
        dim = embedder.dim(),
        "embedding with"
    );

    let outcome = nyaya::ingest(
        &settings.pdf_dir,
        &settings.index_dir,
        embedder,
        settings.rag.clone(),
        |progress| match progress.stage {
            IndexStage::Embedding => {
                tracing::info!(done = progress.processed, total = progress.total, "embedding");
            }
            IndexStage::Skipped { reason } => {
                tracing::warn!(document = ?progress.current, %reason, "skipped");
            }
            stage => tracing::debug!(?stage, document = ?progress.current, "progress"),
        },
    )
    .await
    .context("ingestion failed")?;

    match outcome {
        IngestOutcome::Written(report) => println!("{report}"),
        IngestOutcome::NothingToIngest { reason } => {
            tracing::warn!(%reason, "no index written");
            println!("Nothing to ingest: {reason}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn ask(settings: &Settings, question: &str, ungrounded: bool) -> Result<ExitCode> {
    let embedder = Arc::new(Embedder::from_settings(settings)?);
    let generation = &settings.generation;
    let mut formatter = AnswerFormatter::new(provider::generator(settings)?).with_parameters(
        Parameters::default()
            .temperature(generation.temperature)
            .max_tokens(generation.max_tokens),
    );
    if let Some(timeout) = generation.timeout() {
        // Leave the provider's own retries room to finish first.
        formatter = formatter.with_timeout(timeout + Duration::from_secs(5));
    }

    let mut assistant =
        LegalAssistant::open(&settings.index_dir, embedder, formatter, &settings.rag);
    if ungrounded {
        assistant = assistant.ungrounded();
    }
    let ready = assistant.readiness().is_ready();

    println!("{}", assistant.answer(question).await);
    Ok(if ready || ungrounded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn status(settings: &Settings) -> Result<ExitCode> {
    let embedder = Embedder::from_settings(settings)?;
    let readiness = match nyaya::KnowledgeIndex::open(&settings.index_dir, &embedder) {
        Ok(index) => Readiness::Ready {
            chunks: index.len(),
            model: index.manifest().embedding.model.clone(),
        },
        Err(error) => Readiness::Unavailable {
            reason: error.to_string(),
        },
    };
    println!("{readiness}");
    Ok(if readiness.is_ready() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
