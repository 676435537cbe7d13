//! Task Tracker API
//!
//! Serves the bundled task dataset through a paginated, filterable task list
//! and two dashboard analytics views.
//!
//! # Environment Variables
//!
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `3000`)
//! - `TASKS_DATA_PATH`: Dataset JSON file (default: the bundled dataset)
//! - `DEFAULT_PAGE_SIZE`: Default `limit` for `/tasks` (default: `10`)
//! - `MAX_PAGE_SIZE`: Upper clamp for `limit` (default: `100`)
//! - `RUST_LOG`: Logging level (e.g., `debug`, `task_tracker_api=debug`)
//! - `LOG_FORMAT`: `json` for JSON log lines, anything else for plain text

use std::env;
use std::process::ExitCode;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_tracker_api::api::{AppState, router};
use task_tracker_api::infrastructure::{ConfigurationError, ServerConfig, StoreError};

/// Failures that stop the server before or while serving.
#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("failed to load task store: {0}")]
    Store(#[from] StoreError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match serve().await {
        Ok(()) => {
            tracing::info!("Server shutdown complete");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(%error, "Server stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_tracker_api=debug,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

async fn serve() -> Result<(), StartupError> {
    tracing::info!("Starting Task Tracker API");

    let config = ServerConfig::from_env()?;
    tracing::info!(
        data_path = ?config.data_path,
        default_page_size = config.page_size.default_page_size,
        max_page_size = config.page_size.max_page_size,
        "Server configuration loaded"
    );

    let store = config.load_store()?;
    tracing::info!(tasks = store.len(), "Task store loaded");

    let listener = TcpListener::bind(config.socket_address()?).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening");

    let application = router(AppState::with_page_size(store, config.page_size));
    axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let received = tokio::select! {
        () = interrupt() => "SIGINT",
        () = terminate() => "SIGTERM",
    };
    tracing::info!(signal = received, "Shutting down");
}

async fn interrupt() {
    if let Err(error) = signal::ctrl_c().await {
        tracing::warn!(%error, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(error) => {
            tracing::warn!(%error, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
