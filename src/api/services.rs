use axum::{
    Json,
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::{error::ApiError, models::{HealthResponse, ServiceInfo}, state::AppState};

/// Informational root endpoint (GET /)
pub async fn index() -> impl IntoResponse {
    Json(ServiceInfo {
        status: "ok".to_string(),
        service: "clipshare file server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health check endpoint (GET /health)
///
/// Reports the downloads directory, how many clips are stored, and the
/// current presence line so monitoring sees the same text as the chat
/// surface.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let downloads_dir = state.store.root().to_path_buf();
    let downloads_dir_exists = tokio::fs::try_exists(&downloads_dir).await.unwrap_or(false);

    let response = HealthResponse {
        status: "healthy".to_string(),
        downloads_dir: downloads_dir.display().to_string(),
        downloads_dir_exists,
        file_count: state.store.file_count().await,
        presence: state.status.current(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Clip retrieval endpoint (GET /{filename})
///
/// The name is validated against the store's published-name shape before
/// any filesystem access; range and conditional request semantics come
/// from `ServeFile`.
pub async fn serve_clip(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let path = state
        .store
        .resolve(&filename)
        .ok_or_else(|| ApiError::InvalidName(filename.clone()))?;

    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(ApiError::NotFound(filename));
    }

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(err) => Err(ApiError::Internal(err.to_string())),
    }
}
