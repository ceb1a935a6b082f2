//! Crawler module for node discovery and traversal
//!
//! This module contains the core crawling logic, including:
//! - The priority traversal queue with cycle, duplicate and staleness checks
//! - Per-node visits over multi-hop console sessions
//! - Crawl modes and resume from a previous snapshot
//! - Overall crawl coordination

mod coordinator;
mod scheduler;

pub use coordinator::{Coordinator, CrawlOptions, CrawlSummary};
pub use scheduler::{EnqueueRejection, PathfindingQueue, TraversalCandidate};

use crate::config::Config;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the previous snapshot, if any
/// 2. Seed the traversal queue
/// 3. Visit nodes one at a time, best route first
/// 4. Checkpoint the topology after every visit
/// 5. Export on completion or Ctrl-C
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `options` - Command-line overrides
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl finished or was interrupted and exported
/// * `Err(NodemapError)` - Crawl could not run
pub async fn crawl(config: Config, options: CrawlOptions) -> crate::Result<CrawlSummary> {
    let mut coordinator = Coordinator::new(config, options)?;
    coordinator.run().await
}
