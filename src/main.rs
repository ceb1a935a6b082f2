//! Nodemap main entry point
//!
//! This is the command-line interface for the Nodemap packet-radio network mapper.

use anyhow::Context;
use clap::Parser;
use nodemap::config::{load_config_with_hash, Config, CrawlMode};
use nodemap::crawler::{crawl, CrawlOptions};
use nodemap::output::{export_all, load_statistics, print_statistics};
use nodemap::storage::{load_snapshot, JsonFileStorage, Storage, TopologyStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Nodemap: a packet-radio node network mapper
///
/// Nodemap logs into the local node's console and walks the network hop by
/// hop, reading each node's ports, alias table, route table and heard lists.
/// The result is a topology document and a CSV list of connections.
#[derive(Parser, Debug)]
#[command(name = "nodemap")]
#[command(version = "1.0.0")]
#[command(about = "A packet-radio node network mapper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl mode (overrides the config file)
    #[arg(long, value_enum)]
    mode: Option<CrawlMode>,

    /// Continue from the unexplored neighbors of the existing topology
    #[arg(long)]
    resume: bool,

    /// Start the crawl at this node instead of the local node
    #[arg(long, value_name = "CALLSIGN")]
    start: Option<String>,

    /// Maximum hop distance (overrides the config file)
    #[arg(long, value_name = "N")]
    max_hops: Option<u32>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "merge", "dedup"])]
    dry_run: bool,

    /// Show statistics from the topology document and exit
    #[arg(long, conflicts_with_all = ["dry_run", "merge", "dedup"])]
    stats: bool,

    /// Merge other topology documents into ours and exit
    #[arg(long, value_name = "FILE", num_args = 1.., conflicts_with_all = ["dry_run", "stats"])]
    merge: Vec<PathBuf>,

    /// Collapse SSID variants of the same callsign and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    dedup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli)
    } else if cli.stats {
        handle_stats(&config)
    } else if !cli.merge.is_empty() || cli.dedup {
        handle_maintenance(&config, &cli.merge, cli.dedup)
    } else {
        let options = CrawlOptions {
            mode: cli.mode,
            resume: cli.resume,
            start: cli.start,
            max_hops: cli.max_hops,
            config_hash: Some(config_hash),
        };
        handle_crawl(config, options).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("nodemap=info,warn"),
            1 => EnvFilter::new("nodemap=debug,info"),
            2 => EnvFilter::new("nodemap=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    println!("=== Nodemap Dry Run ===\n");

    println!("Local Node:");
    println!("  Callsign: {}", config.node.callsign);
    println!("  Console: {}:{}", config.node.host, config.node.port);
    println!("  User: {}", config.node.username);

    let mode = cli.mode.unwrap_or(config.crawler.mode);
    let start = cli.start.as_ref().or(config.crawler.start.as_ref());
    println!("\nCrawler Configuration:");
    println!("  Mode: {}", mode);
    println!("  Max hops: {}", cli.max_hops.unwrap_or(config.crawler.max_hops));
    println!("  Start node: {}", start.unwrap_or(&config.node.callsign));
    println!("  Resume: {}", cli.resume);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay);
    println!("  Heard entries stale after: {}s", config.crawler.heard_stale_after);

    let t = &config.timeouts;
    println!("\nTimeouts:");
    println!(
        "  Connect: {}ms + {}ms/hop (ceiling {}ms)",
        t.connect_base, t.connect_per_hop, t.connect_ceiling
    );
    println!("  Command: {}ms", t.command);
    println!("  Visit: {}ms + {}ms/hop", t.visit_base, t.visit_per_hop);
    println!("  Stable after {} x {}ms quiet polls", t.stable_polls, t.poll_interval);

    println!("\nOutput:");
    println!("  Topology: {}", config.output.topology_path);
    println!("  Connections: {}", config.output.connections_csv_path);

    let path = Path::new(&config.output.topology_path);
    if path.exists() {
        let snapshot = load_snapshot(path)?;
        println!(
            "\nExisting snapshot: {} nodes ({} unexplored neighbors recorded)",
            snapshot.len(),
            snapshot
                .records()
                .map(|r| r.unexplored_neighbors.len())
                .sum::<usize>()
        );
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --stats mode: shows statistics from the topology document
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.output.topology_path);
    println!("Topology: {}\n", path.display());

    let topology = load_snapshot(path)
        .with_context(|| format!("cannot read topology from {}", path.display()))?;
    let stats = load_statistics(&topology);
    print_statistics(&stats, &topology);

    Ok(())
}

/// Handles --merge and --dedup: offline maintenance of the topology document
fn handle_maintenance(config: &Config, others: &[PathBuf], dedup: bool) -> anyhow::Result<()> {
    let storage = JsonFileStorage::new(&config.output.topology_path);
    let mut topology = storage.load()?.unwrap_or_else(TopologyStore::new);
    let before = topology.len();

    for other in others {
        let snapshot = load_snapshot(other)
            .with_context(|| format!("cannot read topology from {}", other.display()))?;
        tracing::info!("Merging {} nodes from {}", snapshot.len(), other.display());
        topology.merge_external(&snapshot);
    }

    if dedup {
        let removed = topology.dedup_ssid_variants();
        for key in &removed {
            tracing::info!("Removed SSID variant {}", key);
        }
        println!("✓ Removed {} duplicate SSID variants", removed.len());
    }

    topology.refresh_counts();
    export_all(
        &storage,
        &topology,
        Path::new(&config.output.connections_csv_path),
    )?;

    println!(
        "✓ Topology now has {} nodes (was {}), {} connections",
        topology.len(),
        before,
        topology.connections().len()
    );
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, options: CrawlOptions) -> anyhow::Result<()> {
    if options.resume {
        tracing::info!("Resuming from {}", config.output.topology_path);
    }

    match crawl(config, options).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl {}: {} visited, {} partial, {} failed, {} skipped",
                if summary.interrupted { "interrupted" } else { "completed" },
                summary.visited,
                summary.partial,
                summary.failed,
                summary.skipped
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
