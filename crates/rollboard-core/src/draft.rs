//! Draft/publish workflow over two snapshot documents.
//!
//! Administrators edit `draft`; displays read `published`. The two copies only
//! ever move as wholes:
//!
//! ```text
//!   save_draft(x)          publish()              discard()
//!   x ──────────▶ draft    draft ─────▶ published  published ─────▶ draft
//! ```
//!
//! Until the first save, the draft reads as a copy of published. Reading
//! never writes the draft file.
//!
//! # Locking
//!
//! Operations that touch both documents take the draft lock before the
//! published lock. Everything in the crate follows that order.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::persistence::{JsonDocument, Snapshot};

/// Which snapshot an operation addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    #[default]
    Published,
    Draft,
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotKind::Published => write!(f, "published"),
            SnapshotKind::Draft => write!(f, "draft"),
        }
    }
}

/// Result of [`DraftPublishController::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftStatus {
    pub has_changes: bool,
}

pub struct DraftPublishController {
    draft: JsonDocument<Snapshot>,
    published: JsonDocument<Snapshot>,
}

impl DraftPublishController {
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_paths(config.draft_path(), config.published_path())
    }

    pub fn with_paths(draft: impl Into<PathBuf>, published: impl Into<PathBuf>) -> Self {
        Self {
            draft: JsonDocument::new(draft),
            published: JsonDocument::new(published),
        }
    }

    pub fn load_published(&self) -> Snapshot {
        self.published.load_or_default()
    }

    /// The draft, or a copy of published when no usable draft exists.
    pub fn load_draft(&self) -> Snapshot {
        self.draft
            .try_load()
            .unwrap_or_else(|| self.load_published())
    }

    pub fn load(&self, kind: SnapshotKind) -> Snapshot {
        match kind {
            SnapshotKind::Published => self.load_published(),
            SnapshotKind::Draft => self.load_draft(),
        }
    }

    /// Validate a request body and replace the draft with it.
    pub fn save_draft_value(&self, body: Value) -> Result<Snapshot> {
        let snapshot = Snapshot::from_value(body)?;
        self.save_draft(&snapshot)?;
        Ok(snapshot)
    }

    /// Replace the draft. No merging with the previous draft.
    pub fn save_draft(&self, snapshot: &Snapshot) -> Result<()> {
        self.draft.save(snapshot)?;
        log::info!(
            "Saved draft ({} groups, {} logs)",
            snapshot.groups.len(),
            snapshot.logs.len()
        );
        Ok(())
    }

    /// Copy the draft over published.
    ///
    /// Returns whether the published content changed. Publishing an already
    /// published draft leaves the file untouched.
    pub fn publish(&self) -> Result<bool> {
        let draft = self.draft.lock();
        let published = self.published.lock();

        let current_published = published.try_load();
        let current_draft = draft
            .try_load()
            .unwrap_or_else(|| current_published.clone().unwrap_or_default());

        if current_published.as_ref() == Some(&current_draft) {
            log::debug!("Publish skipped: draft already published");
            return Ok(false);
        }

        published.save(&current_draft)?;
        log::info!(
            "Published draft ({} groups, {} logs)",
            current_draft.groups.len(),
            current_draft.logs.len()
        );
        Ok(true)
    }

    /// Copy published over the draft, dropping unpublished edits.
    ///
    /// Returns whether the draft file changed.
    pub fn discard(&self) -> Result<bool> {
        let draft = self.draft.lock();
        let published = self.published.lock();

        let current_published = published.load_or_default();
        if draft.try_load().as_ref() == Some(&current_published) {
            log::debug!("Discard skipped: draft matches published");
            return Ok(false);
        }

        draft.save(&current_published)?;
        log::info!("Discarded draft changes");
        Ok(true)
    }

    /// Structural comparison of draft and published.
    pub fn status(&self) -> DraftStatus {
        DraftStatus {
            has_changes: self.load_draft() != self.load_published(),
        }
    }

    /// Read-modify-write one snapshot under its writer lock.
    ///
    /// A draft that does not exist yet starts from the published copy.
    pub fn update<R, F>(&self, kind: SnapshotKind, apply: F) -> Result<R>
    where
        F: FnOnce(&mut Snapshot) -> Result<R>,
    {
        match kind {
            SnapshotKind::Published => self.published.update(apply),
            SnapshotKind::Draft => {
                let draft = self.draft.lock();
                let mut snapshot = draft.try_load().unwrap_or_else(|| self.load_published());
                let out = apply(&mut snapshot)?;
                draft.save(&snapshot)?;
                Ok(out)
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
