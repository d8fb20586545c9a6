use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    api::storage::{StorageError, StoredFile},
    app_error::{AppError, StdResponse},
    app_state::AppState,
};

pub fn routes_with_openapi(max_bytes: usize) -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/upload",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(upload_file))
            .layer(DefaultBodyLimit::max(max_bytes)),
    )
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Original file name; only its last path component is kept.
    pub filename: Option<String>,
}

/// Store a raw request body as a public file, e.g. a product image.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Uploaded file successfully", body = StdResponse<StoredFile, String>),
        (status = 400, description = "Missing filename or empty body", body = StdResponse<(), String>),
        (status = 413, description = "File too large")
    )
)]
async fn upload_file(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let filename = query
        .filename
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Filename and body are required".into()))?;
    if body.is_empty() {
        return Err(AppError::BadRequest("Filename and body are required".into()));
    }

    let stored = state
        .storage
        .put(&filename, &body)
        .await
        .map_err(|err| match err {
            StorageError::InvalidFilename => AppError::BadRequest(err.to_string()),
            StorageError::Io(_) => AppError::Other(err.into()),
        })?;

    info!("Stored upload {} ({} bytes)", stored.pathname, body.len());

    Ok(StdResponse {
        data: Some(stored),
        message: Some("Uploaded file successfully"),
    })
}
