use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use log::{debug, info};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::errors::DocError;
use crate::types::{AppState, FileInfo, FilesResponse, UploadedFile};

/// Build the HTTP router for the upload service
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/upload", post(handle_upload))
        .route("/files", get(handle_files))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Liveness probe
pub async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Accept up to `max_upload_files` multipart file parts and store them
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FilesResponse>), DocError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            debug!("Ignoring non-file form field {:?}", field.name());
            continue;
        };
        let data = field.bytes().await?;
        debug!("Received part '{}', {} bytes", filename, data.len());
        uploads.push(UploadedFile {
            filename,
            data: data.to_vec(),
        });
    }
    info!("Upload request with {} file(s)", uploads.len());

    let service = state.uploads.clone();
    let stored = tokio::task::spawn_blocking(move || service.store_all(uploads)).await??;

    let files = stored.into_iter().map(FileInfo::from).collect();
    Ok((StatusCode::CREATED, Json(FilesResponse { files })))
}

/// List every file in the shared directory
pub async fn handle_files(State(state): State<AppState>) -> Result<Json<FilesResponse>, DocError> {
    let files = state
        .files
        .list_files()?
        .into_iter()
        .map(FileInfo::from)
        .collect();
    Ok(Json(FilesResponse { files }))
}
