//! Uploaded display files.
//!
//! Files are stored as `<uuid>.<ext>` in the uploads directory and registered
//! as TV URL entries pointing at `/uploads/<stored name>`. Deletion only
//! accepts bare file names, so a request can never reach outside the uploads
//! directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Map;
use uuid::Uuid;

use super::document::write_atomic;
use super::tv_urls::TvUrlStore;
use super::types::TvUrlEntry;
use crate::config::StoreConfig;
use crate::error::{DashboardError, Result};

/// URL prefix under which uploads are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
    allowed_extensions: Vec<String>,
    tv_urls: Arc<TvUrlStore>,
}

impl UploadStore {
    pub fn new(config: &StoreConfig, tv_urls: Arc<TvUrlStore>) -> Self {
        Self {
            dir: config.uploads_path().to_path_buf(),
            max_bytes: config.upload_limit(),
            allowed_extensions: config.upload_extensions().to_vec(),
            tv_urls,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Store a file and register it as a TV URL entry.
    ///
    /// If registration fails the stored file is removed again.
    pub fn store(&self, original_name: &str, bytes: &[u8]) -> Result<TvUrlEntry> {
        if bytes.len() > self.max_bytes {
            return Err(DashboardError::PayloadTooLarge(format!(
                "File is {} bytes; the limit is {} bytes",
                bytes.len(),
                self.max_bytes
            )));
        }

        let original_name = base_name(original_name)
            .ok_or_else(|| DashboardError::validation("Uploaded file has no name"))?;
        let extension = self.checked_extension(original_name)?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
        let stored_path = self.dir.join(&stored_name);
        write_atomic(&stored_path, bytes)?;

        let display_name = Path::new(original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(original_name)
            .to_string();

        let entry = TvUrlEntry {
            name: display_name,
            url: public_url(&stored_name),
            kind: extension,
            original_name: Some(original_name.to_string()),
            uploaded_at: Some(Utc::now().to_rfc3339()),
            extra: Map::new(),
        };

        if let Err(e) = self.tv_urls.push(entry.clone()) {
            let _ = fs::remove_file(&stored_path);
            return Err(e);
        }

        log::info!(
            "Stored upload {} as {} ({} bytes)",
            original_name,
            stored_name,
            bytes.len()
        );
        Ok(entry)
    }

    /// Delete a stored file and every TV URL entry pointing at it.
    ///
    /// Entries go first: if the TV URL list cannot be written the file stays,
    /// so no entry is ever left pointing at a missing file. Returns the number
    /// of TV URL entries removed.
    pub fn delete(&self, stored_name: &str) -> Result<usize> {
        validate_stored_name(stored_name)?;

        let path = self.dir.join(stored_name);
        if !path.is_file() {
            return Err(DashboardError::not_found(format!(
                "Upload not found: {stored_name}"
            )));
        }

        let removed = self.tv_urls.remove_by_url(&public_url(stored_name))?;
        fs::remove_file(&path)?;
        log::info!("Deleted upload {} ({} TV entries)", stored_name, removed);
        Ok(removed)
    }

    fn checked_extension(&self, file_name: &str) -> Result<String> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if extension.is_empty() || !self.allowed_extensions.contains(&extension) {
            return Err(DashboardError::validation(format!(
                "File type not allowed: {file_name} (allowed: {})",
                self.allowed_extensions.join(", ")
            )));
        }
        Ok(extension)
    }
}

pub fn public_url(stored_name: &str) -> String {
    format!("{UPLOADS_URL_PREFIX}/{stored_name}")
}

/// Last path component of a client-supplied name, tolerating both separators.
fn base_name(name: &str) -> Option<&str> {
    name.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != "." && *n != "..")
}

fn validate_stored_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.contains('\0')
        || name.starts_with('.');

    if invalid {
        return Err(DashboardError::validation(format!("Invalid file name: {name}")));
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn stores(limit: usize) -> (tempfile::TempDir, Arc<TvUrlStore>, UploadStore) {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path()).max_upload_bytes(limit);
        let tv_urls = Arc::new(TvUrlStore::new(config.tv_urls_path()));
        let uploads = UploadStore::new(&config, Arc::clone(&tv_urls));
        (dir, tv_urls, uploads)
    }

    #[test]
    fn store_writes_file_and_registers_entry() {
        let (_dir, tv_urls, uploads) = stores(1024);

        let entry = uploads.store("Weekly Menu.PDF", b"%PDF-1.4").unwrap();

        assert_eq!(entry.name, "Weekly Menu");
        assert_eq!(entry.kind, "pdf");
        assert_eq!(entry.original_name.as_deref(), Some("Weekly Menu.PDF"));
        assert!(entry.url.starts_with("/uploads/"));
        assert!(entry.url.ends_with(".pdf"));
        assert!(entry.uploaded_at.is_some());

        let stored_name = entry.url.trim_start_matches("/uploads/");
        assert_eq!(fs::read(uploads.dir().join(stored_name)).unwrap(), b"%PDF-1.4");
        assert_eq!(tv_urls.list(), vec![entry]);
    }

    #[test]
    fn stored_names_do_not_collide() {
        let (_dir, _tv_urls, uploads) = stores(1024);
        let a = uploads.store("same.pdf", b"a").unwrap();
        let b = uploads.store("same.pdf", b"b").unwrap();
        assert_ne!(a.url, b.url);
    }

    #[test]
    fn store_strips_client_directories() {
        let (_dir, _tv_urls, uploads) = stores(1024);
        let entry = uploads.store("C:\\Users\\me\\..\\menu.pdf", b"x").unwrap();
        assert_eq!(entry.original_name.as_deref(), Some("menu.pdf"));
    }

    #[test]
    fn store_rejects_large_files() {
        let (_dir, tv_urls, uploads) = stores(4);
        let err = uploads.store("big.pdf", b"12345").unwrap_err();
        assert!(matches!(err, DashboardError::PayloadTooLarge(_)));
        assert!(tv_urls.list().is_empty());
    }

    #[test]
    fn store_rejects_disallowed_extensions() {
        let (_dir, _tv_urls, uploads) = stores(1024);
        for name in ["script.sh", "noextension", "archive.pdf.exe"] {
            let err = uploads.store(name, b"x").unwrap_err();
            assert!(matches!(err, DashboardError::Validation(_)), "{name}");
        }
    }

    #[test]
    fn delete_removes_file_and_entries() {
        let (_dir, tv_urls, uploads) = stores(1024);
        let entry = uploads.store("menu.pdf", b"x").unwrap();
        let stored_name = entry.url.trim_start_matches("/uploads/").to_string();

        assert_eq!(uploads.delete(&stored_name).unwrap(), 1);
        assert!(!uploads.dir().join(&stored_name).exists());
        assert!(tv_urls.list().is_empty());

        let err = uploads.delete(&stored_name).unwrap_err();
        assert!(matches!(err, DashboardError::NotFound(_)));
    }

    #[test]
    fn failed_entry_removal_keeps_file() {
        let (dir, tv_urls, uploads) = stores(1024);
        let entry = uploads.store("menu.pdf", b"x").unwrap();
        let stored_name = entry.url.trim_start_matches("/uploads/").to_string();

        // A directory in place of tv-urls.json makes the next save fail.
        let tv_path = dir.path().join("tv-urls.json");
        fs::remove_file(&tv_path).unwrap();
        fs::create_dir(&tv_path).unwrap();

        let err = uploads.delete(&stored_name).unwrap_err();
        assert!(matches!(err, DashboardError::Storage(_)));
        assert!(uploads.dir().join(&stored_name).is_file());
        assert!(tv_urls.list().is_empty());
    }

    #[test]
    fn delete_rejects_traversal() {
        let (_dir, _tv_urls, uploads) = stores(1024);
        for name in ["../users.json", "..", "a/b.pdf", "a\\b.pdf", "", ".hidden"] {
            let err = uploads.delete(name).unwrap_err();
            assert!(matches!(err, DashboardError::Validation(_)), "{name}");
        }
    }
}
