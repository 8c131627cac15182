//! HTTP route handlers.
//!
//! | Area | Module |
//! |------|--------|
//! | `/api/data`, `/api/draft`, `/api/save`, `/api/publish`, `/api/discard`, `/api/draft-status` | [`snapshots`] |
//! | `/api/logs/...` | [`logs`] |
//! | `/api/users/...` | [`users`] |
//! | `/api/tv-urls` | [`tv_urls`] |
//! | `/api/upload/...` | [`uploads`] |
//!
//! Handlers stay thin: parse, call into `rollboard-core`, emit a change
//! event, answer.

pub mod logs;
pub mod snapshots;
pub mod tv_urls;
pub mod uploads;
pub mod users;

use rollboard_core::DeletedBy;
use serde::Serialize;

/// `{ "status": "ok" }`
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    pub fn deleted() -> Self {
        Self { status: "deleted" }
    }
}

/// `{ "status": "deleted", "removed": n }`, plus `by` for key deletions.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub status: &'static str,
    pub removed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<DeletedBy>,
}

impl DeletedResponse {
    pub fn removed(removed: usize) -> Self {
        Self {
            status: "deleted",
            removed,
            by: None,
        }
    }
}
