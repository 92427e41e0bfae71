//! Short-form ingestion CLI.
//!
//! Drives a single URL from submission (or resumption) to a terminal
//! state, printing progress as it goes.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clipnote_extract_client::ExtractClient;
use clipnote_ingest::{IngestConfig, IngestOrchestrator, IngestPhase};
use clipnote_storage::ResourceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("clipnote=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let raw_url = std::env::args()
        .nth(1)
        .context("usage: clipnote-ingest <video-url>")?;

    let client = Arc::new(ExtractClient::from_env().context("extraction client setup failed")?);
    let store = Arc::new(ResourceClient::from_env().context("storage client setup failed")?);
    let config = IngestConfig::from_env();

    let orchestrator = IngestOrchestrator::new(client, store, config);
    let mut handle = orchestrator.ingest(&raw_url);

    let mut updates = handle.updates();
    let printer = tokio::spawn(async move {
        loop {
            let snapshot = updates.borrow_and_update().clone();
            match snapshot.phase {
                IngestPhase::Polling => {
                    info!(
                        status = snapshot.status.map(|s| s.to_string()).unwrap_or_default(),
                        step = snapshot.current_step.as_deref().unwrap_or(""),
                        progress = snapshot.progress,
                        "processing"
                    );
                }
                phase => {
                    info!(phase = ?phase, "state changed");
                }
            }
            if let Some(notice) = &snapshot.notice {
                info!("{}", notice);
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    });

    // Ctrl-C stops observing only; the submitted job keeps running
    // server-side and a later run resumes it via recovery.
    let settled = tokio::select! {
        settled = handle.settled() => settled,
        _ = tokio::signal::ctrl_c() => {
            printer.abort();
            info!("Interrupted; the job keeps running and will be resumed on the next run");
            return Ok(());
        }
    };
    printer.abort();

    match settled.phase {
        IngestPhase::Completed => {
            info!(
                resource_id = settled
                    .resource_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                "Done"
            );
            Ok(())
        }
        IngestPhase::AlreadyProcessed => {
            info!("This video was already processed");
            Ok(())
        }
        phase => {
            let message = settled
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| format!("ended in {:?}", phase));
            bail!("ingestion did not complete: {}", message);
        }
    }
}
