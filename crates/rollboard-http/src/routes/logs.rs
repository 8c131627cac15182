//! Activity log routes.
//!
//! All routes address the published snapshot unless `?snapshot=draft` is
//! given.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use rollboard_core::event_bus::names;
use rollboard_core::{LogEntry, SnapshotKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::DeletedResponse;
use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotQuery {
    #[serde(default)]
    pub snapshot: SnapshotKind,
}

fn target(query: Result<Query<SnapshotQuery>, QueryRejection>) -> ApiResult<SnapshotKind> {
    let Query(query) = query?;
    Ok(query.snapshot)
}

#[derive(Debug, Serialize)]
pub struct AppendResponse {
    pub status: &'static str,
    pub log: LogEntry,
}

/// GET /api/logs
pub async fn list_logs(
    State(state): State<Arc<SharedState>>,
    query: Result<Query<SnapshotQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<LogEntry>>> {
    let kind = target(query)?;
    Ok(Json(state.context.logs.list(kind)))
}

/// POST /api/logs
pub async fn append_log(
    State(state): State<Arc<SharedState>>,
    query: Result<Query<SnapshotQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<AppendResponse>> {
    let kind = target(query)?;
    let Json(body) = body?;
    let ctx = &state.context;

    let log = ctx.logs.append_value(kind, body)?;
    ctx.event_bus
        .emit(names::LOGS_APPENDED, &json!({ "snapshot": kind, "log": &log }));
    Ok(Json(AppendResponse { status: "ok", log }))
}

/// DELETE /api/logs/{key}
///
/// `key` is a timestamp if any entry carries it, otherwise a group name.
pub async fn delete_by_key(
    State(state): State<Arc<SharedState>>,
    Path(key): Path<String>,
    query: Result<Query<SnapshotQuery>, QueryRejection>,
) -> ApiResult<Json<DeletedResponse>> {
    let kind = target(query)?;
    let ctx = &state.context;

    let deletion = ctx.logs.delete_by_key(kind, &key)?;
    ctx.event_bus.emit(
        names::LOGS_DELETED,
        &json!({ "snapshot": kind, "key": key, "by": deletion.by, "removed": deletion.removed }),
    );
    Ok(Json(DeletedResponse {
        by: Some(deletion.by),
        ..DeletedResponse::removed(deletion.removed)
    }))
}

/// DELETE /api/logs/{group}/{date}
pub async fn delete_by_group_and_date(
    State(state): State<Arc<SharedState>>,
    Path((group, date)): Path<(String, String)>,
    query: Result<Query<SnapshotQuery>, QueryRejection>,
) -> ApiResult<Json<DeletedResponse>> {
    let kind = target(query)?;
    let ctx = &state.context;

    let removed = ctx.logs.delete_by_group_and_date(kind, &group, &date)?;
    ctx.event_bus.emit(
        names::LOGS_DELETED,
        &json!({ "snapshot": kind, "group": group, "date": date, "removed": removed }),
    );
    Ok(Json(DeletedResponse::removed(removed)))
}
