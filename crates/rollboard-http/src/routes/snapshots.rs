//! Draft/publish routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use rollboard_core::event_bus::names;
use rollboard_core::{DraftStatus, Snapshot};
use serde_json::{json, Value};

use super::StatusResponse;
use crate::error::ApiResult;
use crate::state::SharedState;

/// GET /api/data
pub async fn get_published(State(state): State<Arc<SharedState>>) -> Json<Snapshot> {
    Json(state.context.snapshots.load_published())
}

/// GET /api/draft
pub async fn get_draft(State(state): State<Arc<SharedState>>) -> Json<Snapshot> {
    Json(state.context.snapshots.load_draft())
}

/// POST /api/save
pub async fn save_draft(
    State(state): State<Arc<SharedState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(body) = body?;
    let ctx = &state.context;

    let saved = ctx.snapshots.save_draft_value(body)?;
    ctx.event_bus.emit(
        names::DRAFT_SAVED,
        &json!({ "groups": saved.groups.len(), "logs": saved.logs.len() }),
    );
    Ok(Json(StatusResponse::ok()))
}

/// POST /api/publish
pub async fn publish(State(state): State<Arc<SharedState>>) -> ApiResult<Json<StatusResponse>> {
    let ctx = &state.context;
    let changed = ctx.snapshots.publish()?;
    ctx.event_bus
        .emit(names::DRAFT_PUBLISHED, &json!({ "changed": changed }));
    Ok(Json(StatusResponse::ok()))
}

/// POST /api/discard
pub async fn discard(State(state): State<Arc<SharedState>>) -> ApiResult<Json<StatusResponse>> {
    let ctx = &state.context;
    let changed = ctx.snapshots.discard()?;
    ctx.event_bus
        .emit(names::DRAFT_DISCARDED, &json!({ "changed": changed }));
    Ok(Json(StatusResponse::ok()))
}

/// GET /api/draft-status
pub async fn draft_status(State(state): State<Arc<SharedState>>) -> Json<DraftStatus> {
    Json(state.context.snapshots.status())
}
