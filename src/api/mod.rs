//! HTTP trigger surface
//!
//! Lets an upstream transport (or an operator with `curl`) deliver trigger
//! payloads over HTTP. Each request runs the pipeline once and answers with the
//! run's status code and JSON body.

use crate::{Pipeline, Result};
use axum::{
    Router,
    routing::{get, post},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub mod routes;
pub mod state;

pub use state::AppState;

/// Create the router
///
/// # Routes
///
/// - `POST /events` - Run the pipeline for the request body
/// - `GET /health` - Health check
pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    let state = AppState::new(pipeline);

    Router::new()
        .route("/events", post(routes::submit_event))
        .route("/health", get(routes::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the trigger surface until `shutdown` resolves
///
/// # Example
///
/// ```no_run
/// use submission_intake::{Config, Pipeline};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::from_env()?;
/// let pipeline = Arc::new(Pipeline::from_config(&config).await?);
///
/// submission_intake::api::start_api_server(
///     pipeline,
///     config.api.bind_address,
///     submission_intake::shutdown_signal(),
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server<F>(
    pipeline: Arc<Pipeline>,
    bind_address: SocketAddr,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::info!(address = %bind_address, "starting trigger server");

    let app = create_router(pipeline);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().map_err(crate::error::Error::Io)?,
        "trigger server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("trigger server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
