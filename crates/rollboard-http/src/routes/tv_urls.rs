//! TV display URL routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use rollboard_core::event_bus::names;
use rollboard_core::TvUrlEntry;
use serde_json::json;

use super::StatusResponse;
use crate::error::ApiResult;
use crate::state::SharedState;

/// GET /api/tv-urls
pub async fn list_tv_urls(State(state): State<Arc<SharedState>>) -> Json<Vec<TvUrlEntry>> {
    Json(state.context.tv_urls.list())
}

/// POST /api/tv-urls
pub async fn replace_tv_urls(
    State(state): State<Arc<SharedState>>,
    body: Result<Json<Vec<TvUrlEntry>>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(entries) = body?;
    let ctx = &state.context;
    let count = entries.len();

    ctx.tv_urls.replace_all(entries)?;
    ctx.event_bus
        .emit(names::TV_URLS_CHANGED, &json!({ "count": count }));
    Ok(Json(StatusResponse::ok()))
}
