//! JSON file storage implementation
//!
//! This module provides a JSON-document implementation of the Storage trait.

use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::TopologyStore;
use std::path::{Path, PathBuf};

/// Topology document stored as one pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Creates a storage handle; nothing is read or written yet
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the topology document
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> StorageResult<Option<TopologyStore>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let topology: TopologyStore = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} nodes from {}",
            topology.len(),
            self.path.display()
        );
        Ok(Some(topology))
    }

    fn save(&self, topology: &TopologyStore) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write-then-rename so an interrupt never leaves a truncated document
        let temp = self.temp_path();
        let json = serde_json::to_string_pretty(topology)?;
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;

        tracing::debug!(
            "Saved {} nodes to {}",
            topology.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Loads a snapshot that must exist (e.g. one named for merging)
///
/// # Returns
///
/// * `Ok(TopologyStore)` - The snapshot
/// * `Err(StorageError::NotFound)` - No file at `path`
pub fn load_snapshot(path: &Path) -> StorageResult<TopologyStore> {
    JsonFileStorage::new(path)
        .load()?
        .ok_or_else(|| StorageError::NotFound(path.display().to_string()))
}
