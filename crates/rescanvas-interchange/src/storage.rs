//! Durable snapshot storage
//!
//! [`SnapshotStore`] holds one snapshot under one fixed key and overwrites
//! it wholesale on every save.

use chrono::NaiveDate;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::snapshot::{export_file_name, GraphSnapshot};

/// Single-slot snapshot storage
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Overwrite the stored snapshot
    async fn save(&self, snapshot: &GraphSnapshot) -> Result<(), StorageError>;

    /// Read the stored snapshot, if any
    async fn load(&self) -> Result<Option<GraphSnapshot>, StorageError>;
}

/// Snapshot stored as a JSON file
///
/// Saves write a sibling temp file and rename it over the target, so a
/// crash mid-save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Create store backed by `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, snapshot: &GraphSnapshot) -> Result<(), StorageError> {
        let text = snapshot.to_json()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io_error(parent, e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, text)
            .await
            .map_err(|e| StorageError::io_error(&temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| StorageError::io_error(&self.path, e))?;

        debug!(path = %self.path.display(), nodes = snapshot.nodes.len(), "snapshot written");
        Ok(())
    }

    async fn load(&self) -> Result<Option<GraphSnapshot>, StorageError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io_error(&self.path, e)),
        };
        Ok(Some(GraphSnapshot::from_json(&text)?))
    }
}

/// Snapshot held in memory as encoded text
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored text
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

#[async_trait::async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, snapshot: &GraphSnapshot) -> Result<(), StorageError> {
        let text = snapshot.to_json()?;
        *self.slot.lock() = Some(text);
        Ok(())
    }

    async fn load(&self) -> Result<Option<GraphSnapshot>, StorageError> {
        let text = self.slot.lock().clone();
        text.map(|t| GraphSnapshot::from_json(&t))
            .transpose()
            .map_err(StorageError::from)
    }
}

/// Write a snapshot as a dated export file in `dir`
///
/// Returns the path written.
///
/// # Errors
/// Returns `StorageError` if encoding or the write fails
pub async fn write_export(
    dir: impl AsRef<Path>,
    prefix: &str,
    date: NaiveDate,
    snapshot: &GraphSnapshot,
) -> Result<PathBuf, StorageError> {
    let path = dir.as_ref().join(export_file_name(prefix, date));
    FileSnapshotStore::new(&path).save(snapshot).await?;
    info!(path = %path.display(), "snapshot exported");
    Ok(path)
}
