use std::{
    io::Write as _,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

use crate::foundation::error::{BoothError, BoothResult};

pub const DEFAULT_PUBLIC_PATH: &str = "/static/outputs";
pub const DEFAULT_FILENAME_PREFIX: &str = "photostrip";

/// Where a stored artifact ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredOutput {
    pub path: PathBuf,
    pub file_name: String,
    /// Absolute address, suitable for a QR code.
    pub address: String,
    /// Server-relative path.
    pub public_path: String,
}

/// Output directory shared by all compositions.
///
/// Files are staged in a temporary file inside the directory and moved into place with
/// no-clobber semantics, so a failed or concurrent write never exposes a partial file.
#[derive(Clone, Debug)]
pub struct OutputStore {
    dir: PathBuf,
    public_base_url: String,
    public_path: String,
    filename_prefix: String,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
            public_path: DEFAULT_PUBLIC_PATH.to_owned(),
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_owned(),
        }
    }

    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = public_path.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{prefix}-{unix_millis}-{uuid}.jpg`
    pub fn unique_name(&self, created_at: DateTime<Utc>) -> String {
        format!(
            "{}-{}-{}.jpg",
            self.filename_prefix,
            created_at.timestamp_millis(),
            uuid::Uuid::new_v4().simple()
        )
    }

    pub fn address_of(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.public_base_url.trim_end_matches('/'))
    }

    pub fn public_path_of(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.public_path.trim_end_matches('/'))
    }

    pub fn persist(&self, bytes: &[u8], created_at: DateTime<Utc>) -> BoothResult<StoredOutput> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            BoothError::io(format!("create output directory '{}'", self.dir.display()), e)
        })?;

        let file_name = self.unique_name(created_at);
        let path = self.dir.join(&file_name);

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| BoothError::io(format!("stage output in '{}'", self.dir.display()), e))?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| BoothError::io(format!("write output '{}'", path.display()), e))?;
        tmp.persist_noclobber(&path)
            .map_err(|e| BoothError::io(format!("publish output '{}'", path.display()), e.error))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "output persisted");
        Ok(StoredOutput {
            address: self.address_of(&file_name),
            public_path: self.public_path_of(&file_name),
            path,
            file_name,
        })
    }
}
