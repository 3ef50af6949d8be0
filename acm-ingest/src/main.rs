//! acm-ingest - Audio Chunk Metadata ingestion service
//!
//! Accepts audio chunks over `POST /upload` and `GET /ws`, derives their
//! metadata through the pipeline and serves it from `GET /chunks/:id` and
//! `GET /sessions/:user_id`.

use std::path::PathBuf;
use std::sync::Arc;

use acm_common::EventBus;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use acm_ingest::config::IngestConfig;
use acm_ingest::pipeline::PipelineEngine;
use acm_ingest::services::Ingestor;
use acm_ingest::store::MetadataStore;
use acm_ingest::transform::Transformer;
use acm_ingest::AppState;

/// Command-line arguments for acm-ingest
#[derive(Parser, Debug)]
#[command(name = "acm-ingest")]
#[command(about = "Audio chunk metadata ingestion service")]
#[command(version)]
struct Args {
    /// Path to acm-ingest.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "ACM_INGEST_PORT")]
    port: Option<u16>,

    /// Interface to bind (overrides config file)
    #[arg(short, long, env = "ACM_INGEST_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        IngestConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting acm-ingest (Audio Chunk Metadata) service");
    info!(
        "Version: {} ({}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("ACM_GIT_HASH"),
        env!("ACM_BUILD_TIMESTAMP")
    );

    let addr = config.socket_addr().context("Invalid listen address")?;

    let cancel = CancellationToken::new();
    let event_bus = EventBus::new(config.events.capacity);

    let engine = Arc::new(
        PipelineEngine::new(
            config.pipeline_config(),
            Transformer::placeholder(),
            cancel.clone(),
            event_bus.clone(),
        )
        .context("Failed to create pipeline")?,
    );
    engine.start();

    let store = Arc::new(MetadataStore::new());
    let ingestor = Ingestor::new(Arc::clone(&engine), store);
    let state = AppState::new(ingestor, event_bus);

    let app = acm_ingest::build_router(state, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let shutdown_token = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_token.cancel();
        })
        .await
        .context("Server error")?;

    let abandoned = engine.shutdown().await;
    info!(abandoned, "Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
