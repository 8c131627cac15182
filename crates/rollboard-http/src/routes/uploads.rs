//! File upload routes.

use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, State};
use axum::Json;
use rollboard_core::event_bus::names;
use rollboard_core::{DashboardError, TvUrlEntry};
use serde::Serialize;
use serde_json::json;

use super::DeletedResponse;
use crate::error::ApiResult;
use crate::state::SharedState;

/// Multipart field carrying the file.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub entry: TvUrlEntry,
}

/// POST /api/upload
pub async fn upload(
    State(state): State<Arc<SharedState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let ctx = &state.context;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| DashboardError::validation("Uploaded file has no name"))?;
        let bytes = field.bytes().await?;

        let entry = ctx.uploads.store(&file_name, &bytes)?;
        ctx.event_bus
            .emit(names::TV_URLS_CHANGED, &json!({ "uploaded": &entry.url }));
        return Ok(Json(UploadResponse { status: "ok", entry }));
    }

    Err(DashboardError::validation(format!("Missing multipart field: {FILE_FIELD}")).into())
}

/// DELETE /api/upload/{filename}
pub async fn delete_upload(
    State(state): State<Arc<SharedState>>,
    Path(filename): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let ctx = &state.context;
    let removed = ctx.uploads.delete(&filename)?;
    ctx.event_bus
        .emit(names::TV_URLS_CHANGED, &json!({ "deleted": filename, "removed": removed }));
    Ok(Json(DeletedResponse::removed(removed)))
}
