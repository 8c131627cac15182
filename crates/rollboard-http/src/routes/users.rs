//! User account routes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use rollboard_core::event_bus::names;
use rollboard_core::{User, UserUpdate};
use serde::Serialize;
use serde_json::json;

use super::StatusResponse;
use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub status: &'static str,
    pub user: User,
}

/// GET /api/users
pub async fn list_users(State(state): State<Arc<SharedState>>) -> Json<Vec<User>> {
    Json(state.context.users.list())
}

/// PUT /api/users
pub async fn replace_users(
    State(state): State<Arc<SharedState>>,
    body: Result<Json<Vec<User>>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(users) = body?;
    let ctx = &state.context;
    let count = users.len();

    ctx.users.replace_all(users)?;
    ctx.event_bus.emit(names::USERS_CHANGED, &json!({ "count": count }));
    Ok(Json(StatusResponse::ok()))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<Arc<SharedState>>,
    body: Result<Json<User>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(user) = body?;
    let ctx = &state.context;

    let user = ctx.users.create(user)?;
    ctx.event_bus
        .emit(names::USERS_CHANGED, &json!({ "created": &user.username }));
    Ok(Json(UserResponse { status: "ok", user }))
}

/// PUT /api/users/{username}
pub async fn update_user(
    State(state): State<Arc<SharedState>>,
    Path(username): Path<String>,
    body: Result<Json<UserUpdate>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(changes) = body?;
    let ctx = &state.context;

    let user = ctx.users.update(&username, changes)?;
    ctx.event_bus
        .emit(names::USERS_CHANGED, &json!({ "updated": username }));
    Ok(Json(UserResponse { status: "ok", user }))
}

/// DELETE /api/users/{username}
pub async fn delete_user(
    State(state): State<Arc<SharedState>>,
    Path(username): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let ctx = &state.context;
    ctx.users.delete(&username)?;
    ctx.event_bus
        .emit(names::USERS_CHANGED, &json!({ "deleted": username }));
    Ok(Json(StatusResponse::deleted()))
}
