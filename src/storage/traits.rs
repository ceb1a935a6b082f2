//! Storage traits and error types
//!
//! This module defines the trait interface for topology storage backends and
//! associated error types.

use crate::storage::TopologyStore;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for topology document backends
///
/// The document is always handled whole: load, merge in memory, rewrite.
/// A single crawler process at a time is assumed.
pub trait Storage {
    /// Loads the persisted topology
    ///
    /// # Returns
    ///
    /// * `Ok(Some(TopologyStore))` - A previous snapshot exists
    /// * `Ok(None)` - Nothing has been persisted yet
    /// * `Err(StorageError)` - The snapshot exists but could not be read
    fn load(&self) -> StorageResult<Option<TopologyStore>>;

    /// Replaces the persisted topology with `topology`
    fn save(&self, topology: &TopologyStore) -> StorageResult<()>;

    /// Where the document lives
    fn location(&self) -> &Path;
}
