use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for Nodemap
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub node: NodeConfig,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    pub output: OutputConfig,
}

/// Local node console connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Host of the local node's telnet console
    pub host: String,

    /// TCP port of the local node's telnet console
    pub port: u16,

    /// Callsign-SSID of the local node
    pub callsign: String,

    /// Console login user name
    pub username: String,

    /// Console login password
    pub password: String,
}

/// How already-known nodes are treated during a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlMode {
    /// Skip nodes already fully visited; expand through their stored routes
    #[default]
    Update,
    /// Revisit every node, including ones in the previous snapshot
    Reaudit,
    /// Only visit nodes absent from the previous snapshot
    NewOnly,
}

impl CrawlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Reaudit => "reaudit",
            Self::NewOnly => "new-only",
        }
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum hop distance from the local node (explicit start node exempt)
    #[serde(rename = "max-hops")]
    pub max_hops: u32,

    /// Crawl mode
    #[serde(default)]
    pub mode: CrawlMode,

    /// Delay between consecutive node visits (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Heard entries older than this are treated as offline (seconds)
    #[serde(rename = "heard-stale-after", default = "default_heard_stale_after")]
    pub heard_stale_after: u64,

    /// Resolver freshness window for SSID observations (seconds)
    #[serde(rename = "ssid-freshness", default = "default_ssid_freshness")]
    pub ssid_freshness: u64,

    /// Optional explicit start node (defaults to the local node)
    #[serde(default)]
    pub start: Option<String>,
}

impl CrawlerConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay)
    }

    pub fn heard_stale_after(&self) -> Duration {
        Duration::from_secs(self.heard_stale_after)
    }

    pub fn ssid_freshness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ssid_freshness as i64)
    }
}

fn default_politeness_delay() -> u64 {
    2_000
}

fn default_heard_stale_after() -> u64 {
    86_400
}

fn default_ssid_freshness() -> u64 {
    7 * 86_400
}

/// Timing configuration for the radio transport (all milliseconds)
///
/// 1200 baud half-duplex links are slow; the defaults are deliberately long.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Base per-hop connect timeout
    #[serde(rename = "connect-base")]
    pub connect_base: u64,

    /// Extra connect time per remaining hop
    #[serde(rename = "connect-per-hop")]
    pub connect_per_hop: u64,

    /// Upper bound on any single connect timeout
    #[serde(rename = "connect-ceiling")]
    pub connect_ceiling: u64,

    /// Maximum wait for a single command response
    pub command: u64,

    /// Read polling interval
    #[serde(rename = "poll-interval")]
    pub poll_interval: u64,

    /// Consecutive quiet polls after which a response is considered complete
    #[serde(rename = "stable-polls")]
    pub stable_polls: u32,

    /// Base per-visit deadline
    #[serde(rename = "visit-base")]
    pub visit_base: u64,

    /// Extra visit time per hop
    #[serde(rename = "visit-per-hop")]
    pub visit_per_hop: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_base: 30_000,
            connect_per_hop: 15_000,
            connect_ceiling: 180_000,
            command: 60_000,
            poll_interval: 500,
            stable_polls: 4,
            visit_base: 180_000,
            visit_per_hop: 90_000,
        }
    }
}

impl TimeoutConfig {
    /// Per-visit deadline for a node `hops` hops away
    pub fn visit_budget(&self, hops: usize) -> Duration {
        let extra = self.visit_per_hop.saturating_mul(hops as u64);
        Duration::from_millis(self.visit_base.saturating_add(extra))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON topology document
    #[serde(rename = "topology-path")]
    pub topology_path: String,

    /// Path to the flattened connection CSV
    #[serde(rename = "connections-csv-path")]
    pub connections_csv_path: String,
}
