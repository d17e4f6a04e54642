mod backend;
mod config;
mod server;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use legal_rag_core::{ingest_pdf, IngestionOptions};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Settings;
use crate::server::{router, AppState};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "legal-rag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the upload and chat HTTP API.
    Serve {
        /// Socket address to listen on.
        #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
        bind: String,
        /// Largest accepted request body, in bytes.
        #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
        max_upload_bytes: usize,
    },
    /// Index one PDF, replacing whatever was indexed before.
    Ingest {
        /// PDF file to index.
        #[arg(long)]
        file: PathBuf,
    },
    /// Answer one question against the indexed document and the web.
    Ask {
        /// Question to answer.
        #[arg(long)]
        question: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("legal_rag=info,legal_rag_core=info,tower_http=info")),
        )
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    let embedder = settings.embedder();
    let backend = settings.backend(embedder.dimensions());
    let orchestrator = settings.orchestrator(embedder);
    let chunk_log = settings.chunk_log();

    info!(
        version = app_version,
        backend = backend.name(),
        started_at = %Utc::now().to_rfc3339(),
        "legal-rag boot"
    );

    match cli.command {
        Command::Serve { bind, max_upload_bytes } => {
            tokio::fs::create_dir_all(&settings.uploads_dir)
                .await
                .with_context(|| format!("creating {}", settings.uploads_dir.display()))?;

            let session = backend.restore(&orchestrator, &chunk_log).await;
            let state = AppState::new(orchestrator, backend, session, settings.uploads_dir.clone(), chunk_log)?;
            let app = router(state, max_upload_bytes);

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("binding {bind}"))?;
            info!(addr = %bind, "listening");
            axum::serve(listener, app).await?;
        }
        Command::Ingest { file } => {
            let report = ingest_pdf(&file, &IngestionOptions::default())
                .with_context(|| format!("failed to extract text from {}", file.display()))?;
            chunk_log.write(&report.chunks)?;
            orchestrator
                .rebuild_index(backend.fresh().as_ref(), &report.chunks)
                .await?;

            println!(
                "Processed {} chunks from {} ({} pages) at {}",
                report.chunks.len(),
                file.display(),
                report.pages,
                Utc::now().to_rfc3339()
            );
        }
        Command::Ask { question } => {
            let session = backend.restore(&orchestrator, &chunk_log).await;
            let response = orchestrator.chat(&session, &question, &[]).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
