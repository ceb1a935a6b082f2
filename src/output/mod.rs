//! Output module for exporting crawl results
//!
//! This module handles:
//! - Exporting the connection list as CSV
//! - Computing and printing topology statistics

mod csv;
pub mod stats;

pub use csv::{format_connections_csv, write_connections_csv};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::storage::{Storage, StorageError, TopologyStore};
use std::path::Path;

/// Writes the full export: topology document plus connection CSV
///
/// # Arguments
///
/// * `storage` - The topology document backend
/// * `topology` - The topology to export
/// * `csv_path` - Path of the flattened connection export
///
/// # Returns
///
/// * `Ok(())` - Both files written
/// * `Err(StorageError)` - Either write failed
pub fn export_all(
    storage: &dyn Storage,
    topology: &TopologyStore,
    csv_path: &Path,
) -> Result<(), StorageError> {
    storage.save(topology)?;
    write_connections_csv(topology, csv_path)?;
    tracing::debug!(
        "Exported {} nodes and {} connections",
        topology.len(),
        topology.connections().len()
    );
    Ok(())
}
