//! Read-only REST API over a loaded peak handler.
//!
//! Provides two GET endpoints:
//! - `/state` returns every derived value at the handler's current instant
//! - `/peaks` lists loaded peaks with optional date range filtering

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::peak::{Clock, PeakHandler};

pub use types::{AnchorView, ErrorResponse, PeakView, PeaksQuery, StateResponse, WindowView};

/// Application state shared across all request handlers.
///
/// Built once after events are loaded and wrapped in `Arc`. Handlers only
/// read it, so no lock is needed.
pub struct AppState<C: Clock> {
    pub handler: PeakHandler<C>,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn router<C>(state: Arc<AppState<C>>) -> Router
where
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route("/state", get(handlers::get_state::<C>))
        .route("/peaks", get(handlers::get_peaks::<C>))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind to `addr` or the
/// server fails.
pub async fn serve<C>(state: Arc<AppState<C>>, addr: SocketAddr) -> io::Result<()>
where
    C: Clock + Send + Sync + 'static,
{
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
