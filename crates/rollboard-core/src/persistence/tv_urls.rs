//! TV display URL list persistence (`tv-urls.json`).

use std::path::PathBuf;

use super::document::JsonDocument;
use super::types::TvUrlEntry;
use crate::error::Result;

pub struct TvUrlStore {
    document: JsonDocument<Vec<TvUrlEntry>>,
}

impl TvUrlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    pub fn list(&self) -> Vec<TvUrlEntry> {
        self.document.load_or_default()
    }

    pub fn replace_all(&self, entries: Vec<TvUrlEntry>) -> Result<()> {
        self.document.save(&entries)?;
        log::info!("Replaced TV URL list ({} entries)", entries.len());
        Ok(())
    }

    /// Append one entry (used when registering uploads).
    pub fn push(&self, entry: TvUrlEntry) -> Result<()> {
        self.document.update(|entries| {
            entries.push(entry);
            Ok(())
        })
    }

    /// Remove every entry pointing at `url`. Returns the number removed.
    pub fn remove_by_url(&self, url: &str) -> Result<usize> {
        self.document.update(|entries| {
            let before = entries.len();
            entries.retain(|e| e.url != url);
            Ok(before - entries.len())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use tempfile::tempdir;

    fn entry(name: &str, url: &str) -> TvUrlEntry {
        TvUrlEntry {
            name: name.to_string(),
            url: url.to_string(),
            kind: "url".to_string(),
            original_name: None,
            uploaded_at: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn replace_push_and_remove() {
        let dir = tempdir().unwrap();
        let store = TvUrlStore::new(dir.path().join("tv-urls.json"));
        assert!(store.list().is_empty());

        store
            .replace_all(vec![entry("Lobby", "https://example.com/lobby")])
            .unwrap();
        store.push(entry("Menu", "/uploads/menu.pdf")).unwrap();
        store.push(entry("Menu copy", "/uploads/menu.pdf")).unwrap();
        assert_eq!(store.list().len(), 3);

        assert_eq!(store.remove_by_url("/uploads/menu.pdf").unwrap(), 2);
        assert_eq!(store.remove_by_url("/uploads/menu.pdf").unwrap(), 0);

        let left = store.list();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "Lobby");
    }
}
