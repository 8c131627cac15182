//! # rollboard-core
//!
//! Core business logic for Rollboard, a shared-state backend for group
//! attendance dashboards.
//!
//! This crate is framework-agnostic; the HTTP server in `rollboard-http` is a
//! thin layer over it.
//!
//! ## Key Concepts
//!
//! - **Snapshot**: groups plus activity logs, stored as one JSON document
//! - **Draft / Published**: administrators edit the draft, displays read the
//!   published copy; `publish` and `discard` move whole snapshots between them
//! - **Log lifecycle**: append-only activity log with group- and date-scoped
//!   cleanup rules

pub mod config;
pub mod context;
pub mod draft;
pub mod error;
pub mod event_bus;
pub mod logs;
pub mod persistence;

// Re-export commonly used types
pub use config::StoreConfig;
pub use context::RollboardContext;
pub use draft::{DraftPublishController, DraftStatus, SnapshotKind};
pub use error::{DashboardError, Result, StoreError};
pub use event_bus::EventBus;
pub use logs::{DeletedBy, KeyDeletion, LogManager};
pub use persistence::{LogEntry, Snapshot, TvUrlEntry, User, UserUpdate};
