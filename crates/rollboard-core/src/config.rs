//! Store configuration.
//!
//! Every file location is derived from a `StoreConfig` handed to the context
//! at construction. Nothing in the crate reads paths from globals.

use std::path::{Path, PathBuf};

/// Default upload size limit (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Where documents live and how uploads are restricted.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    data_dir: PathBuf,
    uploads_dir: PathBuf,
    published_file: String,
    draft_file: String,
    users_file: String,
    tv_urls_file: String,
    max_upload_bytes: usize,
    allowed_upload_extensions: Vec<String>,
}

impl StoreConfig {
    /// Configuration with default document names under `data_dir`.
    ///
    /// Uploads go to `{data_dir}/uploads` unless overridden.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            uploads_dir: data_dir.join("uploads"),
            data_dir,
            published_file: "data.json".to_string(),
            draft_file: "draft.json".to_string(),
            users_file: "users.json".to_string(),
            tv_urls_file: "tv-urls.json".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_upload_extensions: vec!["pdf".to_string()],
        }
    }

    pub fn uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = dir.into();
        self
    }

    pub fn published_file(mut self, name: impl Into<String>) -> Self {
        self.published_file = name.into();
        self
    }

    pub fn draft_file(mut self, name: impl Into<String>) -> Self {
        self.draft_file = name.into();
        self
    }

    pub fn users_file(mut self, name: impl Into<String>) -> Self {
        self.users_file = name.into();
        self
    }

    pub fn tv_urls_file(mut self, name: impl Into<String>) -> Self {
        self.tv_urls_file = name.into();
        self
    }

    pub fn max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// Replace the extension allowlist. Entries are matched case-insensitively
    /// and may be given with or without a leading dot.
    pub fn allowed_upload_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_upload_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn uploads_path(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn published_path(&self) -> PathBuf {
        self.data_dir.join(&self.published_file)
    }

    pub fn draft_path(&self) -> PathBuf {
        self.data_dir.join(&self.draft_file)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    pub fn tv_urls_path(&self) -> PathBuf {
        self.data_dir.join(&self.tv_urls_file)
    }

    pub fn upload_limit(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn upload_extensions(&self) -> &[String] {
        &self.allowed_upload_extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_live_under_data_dir() {
        let config = StoreConfig::new("/srv/rollboard");
        assert_eq!(config.published_path(), PathBuf::from("/srv/rollboard/data.json"));
        assert_eq!(config.draft_path(), PathBuf::from("/srv/rollboard/draft.json"));
        assert_eq!(config.users_path(), PathBuf::from("/srv/rollboard/users.json"));
        assert_eq!(config.tv_urls_path(), PathBuf::from("/srv/rollboard/tv-urls.json"));
        assert_eq!(config.uploads_path(), Path::new("/srv/rollboard/uploads"));
        assert_eq!(config.upload_limit(), DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.upload_extensions(), ["pdf".to_string()]);
    }

    #[test]
    fn overrides_apply() {
        let config = StoreConfig::new("/data")
            .uploads_dir("/var/uploads")
            .published_file("live.json")
            .max_upload_bytes(1024)
            .allowed_upload_extensions([".PDF", "png", ""]);

        assert_eq!(config.published_path(), PathBuf::from("/data/live.json"));
        assert_eq!(config.uploads_path(), Path::new("/var/uploads"));
        assert_eq!(config.upload_limit(), 1024);
        assert_eq!(config.upload_extensions(), ["pdf".to_string(), "png".to_string()]);
    }
}
