//! Snapshot Store - Atomic JSON Persistence
//!
//! Saves snapshots as pretty JSON using atomic writes (write to a tmp
//! file, then rename). The file on disk is always either the old or the
//! new version, never a partial write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Atomic JSON snapshot store rooted at a data directory.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store in the given data directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Save a snapshot atomically (tmp → rename).
    #[instrument(skip(self, value))]
    pub async fn save<T: Serialize + Sync>(&self, name: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("Failed to serialize snapshot")?;

        let path = self.path(name);
        let tmp_path = self.path(&format!("{name}.tmp"));

        fs::write(&tmp_path, &json)
            .await
            .context("Failed to write tmp snapshot file")?;
        fs::rename(&tmp_path, &path)
            .await
            .context("Failed to rename snapshot file")?;

        debug!(path = %path.display(), bytes = json.len(), "Snapshot saved");
        Ok(())
    }

    /// Load a snapshot.
    ///
    /// Returns `None` if the file does not exist (first startup).
    #[instrument(skip(self))]
    pub async fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            info!(path = %path.display(), "No snapshot found, starting fresh");
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        debug!(path = %path.display(), "Snapshot loaded");
        Ok(Some(value))
    }
}
