//! REST API over one physical model.
//!
//! Provides three endpoints:
//! - `GET /model`: plant parameters and derived loss coefficients
//! - `POST /simulate`: trace and report for a decision vector
//! - `POST /evaluate`: objective and constraint status for a decision vector

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::model::PhysicalModel;

pub use types::{EvaluateRequest, SimulateRequest};

/// Largest grid a single request may ask for.
pub const MAX_SAMPLES: usize = 1_000_000;

/// Immutable application state shared across all request handlers.
///
/// The model is read-only, so concurrent requests simulate without locks.
#[derive(Debug)]
pub struct AppState {
    /// Plant every request is simulated against.
    pub model: PhysicalModel,
    /// Grid size used when a request does not name one.
    pub default_samples: usize,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/model", get(handlers::get_model))
        .route("/simulate", post(handlers::post_simulate))
        .route("/evaluate", post(handlers::post_evaluate))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind to `addr` or the
/// server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
