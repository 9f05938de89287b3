//! HTTP transport
//!
//! The transport is a thin carrier: one POST route accepting the opaque
//! request body and returning the response body, or the classified error
//! code and message. All protocol logic lives in the validator; the
//! synchronous core (including a blocked `watch_poll`) runs on the
//! blocking pool so it never stalls the runtime.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::validator::CommandValidator;

/// Transport-level error wrapper mapping protocol codes to HTTP statuses.
struct ApiError(SyncError);

impl From<SyncError> for ApiError {
    fn from(error: SyncError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        warn!(status = status.as_u16(), "{}", self.0);
        (status, self.0.to_string()).into_response()
    }
}

/// Builds the single-route protocol router.
pub fn router(validator: Arc<CommandValidator>) -> Router {
    Router::new()
        .route("/", post(handle_command))
        .with_state(validator)
}

async fn handle_command(
    State(validator): State<Arc<CommandValidator>>,
    body: String,
) -> Result<String, ApiError> {
    let response = tokio::task::spawn_blocking(move || validator.handle(&body))
        .await
        .map_err(|e| SyncError::internal(format!("handler task failed: {e}")))??;
    Ok(response)
}

/// Binds the listener and serves until Ctrl-C.
pub async fn serve(bind: &str, validator: Arc<CommandValidator>) -> SyncResult<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(validator))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
