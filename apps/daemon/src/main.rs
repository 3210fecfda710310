//! # gistpipe
//!
//! Mirrors the gists of configured GitHub users into Pipedrive activities.
//!
//! ## Usage
//! ```bash
//! # Run with the platform config file
//! gistpipe
//!
//! # Explicit config, debug logging
//! RUST_LOG=gistpipe_sync=debug gistpipe --config ./gistpipe.toml
//! ```
//!
//! ## Startup Sequence
//! ```text
//! 1. tracing subscriber (RUST_LOG, default "info")
//! 2. config: file → env overrides → validate   (exit 1 on failure)
//! 3. HTTP clients, payload sink, orchestrator
//! 4. SyncScheduler spawned on its own task
//! 5. lookup server until SIGINT / SIGTERM
//! 6. scheduler shutdown, wait for the running cycle
//! ```

mod server;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gistpipe_core::Clock;
use gistpipe_sync::{
    build_client, DiscardSink, FilePayloadSink, GistpipeConfig, GithubClient, PayloadSink,
    PipedriveClient, SyncOrchestrator, SyncResult, SyncScheduler, SystemClock,
};

use crate::server::AppState;

#[derive(Debug, Parser)]
#[command(name = "gistpipe", version, about = "Mirror GitHub gists into Pipedrive")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "GISTPIPE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting gistpipe");

    // Load configuration
    let config = exit_on_config_error(GistpipeConfig::load(cli.config))?;
    let initial_state = exit_on_config_error(config.initial_state())?;
    info!(
        source = %config.source.base_url,
        destination = %config.destination.base_url,
        entities = initial_state.entities.len(),
        interval_secs = config.schedule.interval_secs,
        "Configuration loaded"
    );

    // Wire the sync engine
    let http = exit_on_config_error(build_client(&config.http))?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let sink: Arc<dyn PayloadSink> = match &config.storage.payload_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Persisting fetched payloads");
            Arc::new(FilePayloadSink::new(dir, clock.clone()))
        }
        None => Arc::new(DiscardSink),
    };

    let orchestrator = Arc::new(SyncOrchestrator::new(
        Arc::new(GithubClient::new(
            http.clone(),
            &config.source.base_url,
            &config.source.token,
        )),
        Arc::new(PipedriveClient::new(
            http,
            &config.destination.base_url,
            &config.destination.api_token,
        )),
        sink,
        clock,
    ));
    let state = Arc::new(Mutex::new(initial_state));

    let (scheduler, handle) =
        SyncScheduler::new(orchestrator.clone(), state.clone(), &config.schedule);
    let scheduler_task = tokio::spawn(scheduler.run());

    // Serve lookups until a shutdown signal arrives
    if config.server.enabled {
        let app = server::router(Arc::new(AppState {
            orchestrator,
            state,
            scheduler: handle.clone(),
        }));

        let bind_addr = config.server.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(addr = %bind_addr, "Lookup server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    if let Err(e) = handle.shutdown().await {
        error!(error = %e, "Failed to stop scheduler");
    }
    scheduler_task.await?;

    info!("Shutdown complete");
    Ok(())
}

/// Stops the process with exit code 1 on configuration errors; any other
/// error is handed back to the caller.
fn exit_on_config_error<T>(result: SyncResult<T>) -> SyncResult<T> {
    match result {
        Err(e) if e.is_config_error() => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
        other => other,
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
