//! HTTP server for the rollboard dashboard.
//!
//! Exposes the snapshot, log, user, TV URL and upload operations of
//! `rollboard-core` over REST, streams change events over WebSocket, and
//! serves uploaded files plus an optional static front-end.

pub mod error;
pub mod routes;
mod state;
mod websocket;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use rollboard_core::RollboardContext;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub use state::SharedState;

/// Room for multipart framing on top of the configured upload limit.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Build the application router.
///
/// When `static_dir` is given, unmatched paths are served from it.
pub fn router(context: Arc<RollboardContext>, static_dir: Option<PathBuf>) -> Router {
    let uploads_dir = context.uploads.dir().to_path_buf();
    let body_limit = context.uploads.max_bytes().saturating_add(BODY_LIMIT_SLACK);
    let state = Arc::new(SharedState::new(context));

    let mut app = Router::new()
        .route("/api/data", get(routes::snapshots::get_published))
        .route("/api/draft", get(routes::snapshots::get_draft))
        .route("/api/save", post(routes::snapshots::save_draft))
        .route("/api/publish", post(routes::snapshots::publish))
        .route("/api/discard", post(routes::snapshots::discard))
        .route("/api/draft-status", get(routes::snapshots::draft_status))
        .route(
            "/api/logs",
            get(routes::logs::list_logs).post(routes::logs::append_log),
        )
        .route("/api/logs/{key}", delete(routes::logs::delete_by_key))
        .route(
            "/api/logs/{group}/{date}",
            delete(routes::logs::delete_by_group_and_date),
        )
        .route(
            "/api/users",
            get(routes::users::list_users)
                .put(routes::users::replace_users)
                .post(routes::users::create_user),
        )
        .route(
            "/api/users/{username}",
            put(routes::users::update_user).delete(routes::users::delete_user),
        )
        .route(
            "/api/tv-urls",
            get(routes::tv_urls::list_tv_urls).post(routes::tv_urls::replace_tv_urls),
        )
        .route("/api/upload", post(routes::uploads::upload))
        .route(
            "/api/upload/{filename}",
            delete(routes::uploads::delete_upload),
        )
        .route("/ws/events", get(websocket::ws_handler))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(
    context: Arc<RollboardContext>,
    addr: SocketAddr,
    static_dir: Option<PathBuf>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(context, static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        log::error!("Failed to bind HTTP server to {}: {}", addr, e);
        e
    })?;

    log::info!("HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            log::info!("HTTP server shutting down");
        })
        .await
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rollboard_core::StoreConfig;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn server_starts_and_stops() {
        let dir = TempDir::new().unwrap();
        let context = Arc::new(RollboardContext::new(StoreConfig::new(dir.path())));
        let (tx, rx) = oneshot::channel::<()>();

        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let server = tokio::spawn(serve(context, addr, None, async {
            rx.await.ok();
        }));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
