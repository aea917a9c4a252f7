//! Live Scoreboard Binary
//!
//! Starts the scoreboard API, SSE streams and health server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin live-scoreboard
//! ```
//!
//! # Environment Variables
//!
//! - `SCOREBOARD_HTTP_PORT`: API and SSE port (default: 5000)
//! - `SCOREBOARD_HEALTH_PORT`: Health check and metrics port (default: 8083)
//! - `SCOREBOARD_ENABLE_CORS`: Permissive CORS on the API (default: true)
//! - `SCOREBOARD_SINK_CAPACITY`: Frames buffered per subscriber (default: 64)
//! - `SCOREBOARD_KEEP_ALIVE_SECS`: SSE keep-alive interval (default: 15)
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: Service name (default: live-scoreboard)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use live_scoreboard::infrastructure::health::{HealthServer, HealthServerState};
use live_scoreboard::infrastructure::{http, telemetry};
use live_scoreboard::{ScoreboardConfig, ScoreboardService, create_router, init_metrics};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let telemetry_guard = telemetry::init().context("failed to initialize telemetry")?;

    tracing::info!(
        span_export = telemetry_guard.is_exporting(),
        "Starting Live Scoreboard"
    );

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics().context("failed to install metrics recorder")?;

    let config = ScoreboardConfig::from_env().context("invalid configuration")?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();
    let scoreboard = Arc::new(ScoreboardService::new());

    // Health server
    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&scoreboard),
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        Arc::clone(&health_state),
        shutdown_token.clone(),
    );
    let health_task = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    // API server
    let listener = http::bind(config.server.http_port)
        .await
        .context("failed to start API server")?;
    let router = create_router(Arc::clone(&scoreboard), &config, shutdown_token.clone());
    let api_shutdown = shutdown_token.clone();

    tracing::info!(port = config.server.http_port, "API server listening");
    health_state.set_ready(true);

    let api_task = tokio::spawn(async move {
        if let Err(e) = http::serve(listener, router, api_shutdown).await {
            tracing::error!(error = %e, "API server error");
        }
    });

    tracing::info!("Live scoreboard ready");

    await_shutdown(shutdown_token).await;
    health_state.set_ready(false);

    let drained = tokio::time::timeout(SHUTDOWN_TIMEOUT, async {
        let _ = tokio::join!(api_task, health_task);
    })
    .await;
    if drained.is_err() {
        tracing::warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Servers did not stop in time"
        );
    }

    tracing::info!("Live scoreboard stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &ScoreboardConfig) {
    tracing::info!(
        http_port = config.server.http_port,
        health_port = config.server.health_port,
        enable_cors = config.server.enable_cors,
        sink_capacity = config.stream.sink_capacity,
        keep_alive_secs = config.stream.keep_alive_interval.as_secs(),
        "Configuration loaded"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C handler failed");
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
                tracing::error!(error = %e, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
