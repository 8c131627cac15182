//! A single JSON document on disk.
//!
//! # Reads
//!
//! Loading never fails. A missing file, an unreadable file, or malformed JSON
//! all resolve to the caller's default (corruption is logged at `warn`).
//!
//! # Writes
//!
//! Saves use write-then-rename:
//!
//! 1. Write to `file.json.tmp` and sync it
//! 2. Rename to `file.json` (atomic on Unix)
//!
//! A reader therefore sees either the old document or the new one, never a
//! partial write. The containing directory is created on first save.
//!
//! # Serialization
//!
//! Each document owns a mutex. [`JsonDocument::update`] and
//! [`JsonDocument::lock`] hold it for the whole read-modify-write cycle, so
//! two mutations of the same document never interleave. Different documents
//! have different mutexes and do not block each other.

use std::fs::{self, File};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Typed handle to a JSON file with a per-document writer lock.
pub struct JsonDocument<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the document, or `None` if it is missing or unusable.
    pub fn try_load(&self) -> Option<T> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Failed to read {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(document) => Some(document),
            Err(e) => {
                log::warn!("Ignoring malformed {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn load_or(&self, default: T) -> T {
        self.try_load().unwrap_or(default)
    }

    pub fn load_or_default(&self) -> T
    where
        T: Default,
    {
        self.try_load().unwrap_or_default()
    }

    /// Replace the document on disk.
    pub fn save(&self, document: &T) -> Result<(), StoreError> {
        self.lock().save(document)
    }

    /// Take the writer lock for a multi-step transaction.
    pub fn lock(&self) -> DocumentGuard<'_, T> {
        // Saves are atomic, so a poisoned lock guards no torn state.
        let guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        DocumentGuard {
            document: self,
            _guard: guard,
        }
    }

    /// Read-modify-write under the writer lock.
    ///
    /// `apply` works on an in-memory copy. Nothing is written if it returns an
    /// error, and a failed save leaves the previous file in place.
    pub fn update<R, E, F>(&self, apply: F) -> Result<R, E>
    where
        T: Default,
        E: From<StoreError>,
        F: FnOnce(&mut T) -> Result<R, E>,
    {
        let guard = self.lock();
        let mut document = guard.load_or_default();
        let out = apply(&mut document)?;
        guard.save(&document)?;
        Ok(out)
    }
}

/// Proof that the caller holds a document's writer lock.
pub struct DocumentGuard<'a, T> {
    document: &'a JsonDocument<T>,
    _guard: MutexGuard<'a, ()>,
}

impl<T> DocumentGuard<'_, T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn try_load(&self) -> Option<T> {
        self.document.try_load()
    }

    pub fn load_or_default(&self) -> T
    where
        T: Default,
    {
        self.document.try_load().unwrap_or_default()
    }

    pub fn save(&self, document: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(document)?;
        write_atomic(&self.document.path, json.as_bytes())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `path` via a synced temp file and a rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let temp_path = temp_path_for(path);
    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });

    if let Err(e) = written.and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
