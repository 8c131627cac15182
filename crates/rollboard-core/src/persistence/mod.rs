//! Persistence layer for snapshots, users, TV URLs and uploads.
//!
//! # Overview
//!
//! Every piece of state is a whole JSON document on disk:
//!
//! - **Snapshots** - published and draft copies of groups and logs
//! - **Users** - dashboard accounts
//! - **TV URLs** - what the displays cycle through
//! - **Uploads** - files referenced from TV URL entries
//!
//! # File Locations
//!
//! All paths come from [`StoreConfig`](crate::config::StoreConfig):
//!
//! ```text
//! {data_dir}/
//! ├── data.json        # Published snapshot
//! ├── draft.json       # Draft snapshot
//! ├── users.json       # Accounts
//! ├── tv-urls.json     # Display entries
//! └── uploads/
//!     └── <uuid>.pdf   # Uploaded files
//! ```
//!
//! # Design Principles
//!
//! ## Whole-document access
//!
//! Each request reads the full document, changes it in memory, and writes it
//! back. There is no incremental patching.
//!
//! ## Atomic Writes
//!
//! All save operations use write-then-rename (see [`document`]).
//!
//! ## Forgiving Reads
//!
//! A missing or corrupt file reads as the empty document instead of failing.

pub mod document;
pub mod tv_urls;
pub mod types;
pub mod uploads;
pub mod users;

pub use document::{DocumentGuard, JsonDocument};
pub use tv_urls::TvUrlStore;
pub use types::*;
pub use uploads::{public_url, UploadStore, UPLOADS_URL_PREFIX};
pub use users::{UserStore, PROTECTED_USERNAME};
