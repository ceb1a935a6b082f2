//! Statistics generation from a topology snapshot
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from a loaded topology.

use crate::storage::TopologyStore;
use std::collections::BTreeMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of node records
    pub total_nodes: usize,

    /// Nodes with a completed visit
    pub visited_nodes: usize,

    /// Nodes whose visit was cut short
    pub partial_nodes: usize,

    /// Nodes only known as someone's neighbor
    pub stub_nodes: usize,

    /// Directed, reciprocally confirmed connections
    pub total_connections: usize,

    /// Connections flagged intermittent
    pub intermittent_connections: usize,

    /// Directed links with at least one recorded failure
    pub intermittent_links: usize,

    /// Node count per hop distance
    pub nodes_by_hops: BTreeMap<u32, usize>,

    /// Nodes with any location field
    pub located_nodes: usize,

    /// Most common applications and how many nodes offer them
    pub applications: Vec<(String, usize)>,
}

/// Computes statistics for a topology
///
/// # Arguments
///
/// * `topology` - The topology to summarize
///
/// # Returns
///
/// The computed statistics
pub fn load_statistics(topology: &TopologyStore) -> CrawlStatistics {
    let mut stats = CrawlStatistics {
        total_nodes: topology.len(),
        total_connections: topology.connections().len(),
        intermittent_links: topology.intermittent().len(),
        ..Default::default()
    };

    let mut applications: BTreeMap<String, usize> = BTreeMap::new();

    for record in topology.records() {
        if record.is_complete() {
            stats.visited_nodes += 1;
        } else if record.partial {
            stats.partial_nodes += 1;
        } else {
            stats.stub_nodes += 1;
        }

        if let Some(hops) = record.hop_distance {
            *stats.nodes_by_hops.entry(hops).or_insert(0) += 1;
        }
        if record.gridsquare.is_some() || record.city.is_some() {
            stats.located_nodes += 1;
        }
        for app in &record.applications {
            *applications.entry(app.clone()).or_insert(0) += 1;
        }
    }

    stats.intermittent_connections = topology
        .connections()
        .iter()
        .filter(|c| c.intermittent)
        .count();

    let mut applications: Vec<_> = applications.into_iter().collect();
    applications.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    stats.applications = applications;

    stats
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `topology` - The topology the statistics came from (for run metadata)
pub fn print_statistics(stats: &CrawlStatistics, topology: &TopologyStore) {
    println!("=== Crawl Statistics ===\n");

    let meta = &topology.metadata;
    println!("Run:");
    if let Some(started) = meta.started_at {
        println!("  Started: {}", started.to_rfc3339());
    }
    if let Some(finished) = meta.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    println!("  Status: {}", meta.status.as_str());
    if let Some(mode) = &meta.mode {
        println!("  Mode: {}", mode);
    }
    if let Some(local) = &meta.local_node {
        println!("  Local node: {}", local);
    }
    println!();

    println!("Overview:");
    println!("  Total nodes: {}", stats.total_nodes);
    println!("  Visited: {}", stats.visited_nodes);
    println!("  Partial: {}", stats.partial_nodes);
    println!("  Stubs: {}", stats.stub_nodes);
    println!("  Nodes with location: {}", stats.located_nodes);
    println!(
        "  Connections: {} ({} intermittent)",
        stats.total_connections, stats.intermittent_connections
    );
    println!("  Links with failures: {}", stats.intermittent_links);
    println!();

    if !stats.nodes_by_hops.is_empty() {
        println!("Nodes by Hop Distance:");
        for (hops, count) in &stats.nodes_by_hops {
            println!("  {}: {}", hops, count);
        }
        println!();
    }

    if !stats.applications.is_empty() {
        println!("Applications:");
        for (app, count) in stats.applications.iter().take(10) {
            println!("  {}: {}", app, count);
        }
        println!();
    }

    let coverage = if stats.total_nodes > 0 {
        (stats.visited_nodes as f64 / stats.total_nodes as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Coverage: {:.1}% ({} / {} nodes visited)",
        coverage, stats.visited_nodes, stats.total_nodes
    );
}
