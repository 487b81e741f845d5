// src/http/handlers.rs

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value, json};
use tokio_util::io::ReaderStream;

use crate::staging::{StagedFile, StagingReceipt, UploadSpool};
use crate::supervisor::RunStatus;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Multipart field carrying the table definition.
pub const FIELD_DEFINITION: &str = "create_sql";
/// Multipart field carrying data files; repeated.
pub const FIELD_DATA_FILES: &str = "ibd_files[]";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    message: &'static str,
    #[serde(flatten)]
    receipt: StagingReceipt,
}

/// `POST /upload`
///
/// Streams each file part into an upload spool on disk, then replaces the
/// staged input set. Parts without a file name (an empty file input in a
/// browser form) count as absent.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut spool = UploadSpool::beside(state.staging.dir())?;
    let mut definition = None;
    let mut data_files = Vec::new();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();

        let is_definition = field_name == FIELD_DEFINITION;
        let is_data = field_name == FIELD_DATA_FILES || field_name == "ibd_files";
        if !is_definition && !is_data {
            tracing::debug!(field = %field_name, "ignoring unknown multipart field");
            continue;
        }
        if file_name.is_empty() {
            continue;
        }

        let staged = spool_field(&mut spool, &mut field, file_name).await?;

        if is_definition {
            definition = Some(staged);
        } else {
            data_files.push(staged);
        }
    }

    tracing::info!(
        has_definition = definition.is_some(),
        data_files = data_files.len(),
        "upload received"
    );

    let receipt = state.staging.replace_inputs(definition, data_files).await?;
    drop(spool);

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully",
        receipt,
    }))
}

async fn spool_field(
    spool: &mut UploadSpool,
    field: &mut Field<'_>,
    file_name: String,
) -> ApiResult<StagedFile> {
    let mut part = spool.create().await?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        part.write_chunk(&chunk).await?;
    }
    let (path, bytes) = part.finish().await?;
    tracing::debug!(file = %file_name, bytes, "upload part spooled");
    Ok(StagedFile::spooled(file_name, path))
}

/// `POST /start_recovery`
pub async fn start_recovery(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let run_id = state.supervisor.start().await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Recovery process started",
            "run_id": run_id,
        })),
    ))
}

/// `GET /download_backup`
///
/// Streams the newest backup as an attachment.
pub async fn download_backup(State(state): State<AppState>) -> ApiResult<Response> {
    let (artifact, file) = state.locator.open_latest().await?;
    tracing::info!(file = %artifact.name, size = artifact.size, "serving backup");

    let body = Body::from_stream(ReaderStream::new(file));
    let disposition = format!("attachment; filename=\"{}\"", artifact.name);

    Ok((
        [
            (header::CONTENT_TYPE, "application/sql".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> Json<RunStatus> {
    Json(state.supervisor.status())
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
