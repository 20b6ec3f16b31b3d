//! Backend of a dental clinic: patient self-service booking and the staff back office.
//!
//!
//!
//! # General Infrastructure
//! - Patients use the mobile app, staff use the admin panel, both talk to `/api`
//! - Admin endpoints live under `/api/admin` and require a staff token
//! - Live updates go out over one WebSocket at `/ws`, clients join rooms after connecting
//! - Redis holds every document, one hash per collection
//!
//!
//!
//! # Booking
//!
//! One slot is one doctor at one date and time, in clinic local time (`CLINIC_UTC_OFFSET_HOURS`).
//!
//! - Dates travel as `DD/MM/YYYY`, times as `HH:MM`
//! - A slot in the past is refused
//! - A slot held by any appointment that is not cancelled is refused
//! - The check and the write happen under one lock, so two requests cannot take the same slot
//!
//!
//!
//! # Notes
//!
//! ## Redis as a document store
//! Collections are small, so listings read the whole hash and filter in process. This keeps
//! every query in Rust instead of spread over secondary indexes. If appointments ever reach the
//! hundreds of thousands, an index per doctor and date is the first thing to add.
//!
//! ## Realtime
//! Notifications are fire and forget. A request never fails because nobody is listening.
//!
//!
//!
//! # Setup
//!
//! Run the server (seeds on startup).
//! ```sh
//! RUST_LOG=info cargo run -p backend
//! ```
//!
//! Seed only.
//! ```sh
//! cargo run -p backend -- seed
//! ```
//!
//! Smoke test a running server.
//! ```sh
//! cargo run -p tester -- http://localhost:8001
//! ```
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod booking;
pub mod config;
pub mod database;
pub mod documents;
pub mod error;
pub mod financial;
pub mod pdf;
pub mod realtime;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use config::Config;
use error::AppError;
use state::State;

pub fn init_tracing() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
}

pub async fn start_server() -> Result<(), AppError> {
    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config).await?;
    seed::seed(&state).await?;

    info!("Starting server...");
    let app = routes::router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.map_err(AppError::internal)?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::internal)?;

    info!("Server shut down");
    Ok(())
}

/// Writes the starter catalog, templates and admin account, then exits.
pub async fn seed_only() -> Result<(), AppError> {
    let state = State::new(Config::load()?).await?;

    seed::seed(&state).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
