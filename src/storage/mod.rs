//! Storage module for persisting crawl data
//!
//! This module handles:
//! - Node records, connections and crawl metadata (the topology document)
//! - The in-memory topology graph with merge, variant resolution and
//!   reciprocal connection materialization
//! - Loading and saving the document as JSON

mod json;
mod topology;
mod traits;

pub use json::{load_snapshot, JsonFileStorage};
pub use topology::{MergeOutcome, TopologyStore};
pub use traits::{Storage, StorageError, StorageResult};

use crate::callsign::Callsign;
use crate::parser::{PortInfo, RouteEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One discovered node, keyed by its callsign-SSID
///
/// A record is a *stub* until the node is visited: it only says that some
/// other node listed it as a neighbor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub callsign: Callsign,

    #[serde(default)]
    pub primary_alias: Option<String>,

    #[serde(default)]
    pub other_aliases: BTreeSet<String>,

    /// Best-effort, from freeform INFO text
    #[serde(default)]
    pub gridsquare: Option<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub node_types: Vec<String>,

    /// Base callsigns of direct, unblocked route-table neighbors
    #[serde(default)]
    pub neighbors: BTreeSet<String>,

    /// Direct route quality per neighbor base callsign (0 = blocked)
    #[serde(default)]
    pub route_quality: BTreeMap<String, u32>,

    /// Radio port on this node per neighbor base callsign
    #[serde(default)]
    pub neighbor_ports: BTreeMap<String, u8>,

    /// Full route table as last read
    #[serde(default)]
    pub routes: Vec<RouteEntry>,

    /// Neighbors queued from this node but not yet known to be visited
    #[serde(default)]
    pub unexplored_neighbors: Vec<Callsign>,

    /// Neighbor base callsigns with at least one failed attempt from here
    #[serde(default)]
    pub intermittent_neighbors: BTreeSet<String>,

    #[serde(default)]
    pub hop_distance: Option<u32>,

    /// Intermediate hops that reached this node
    #[serde(default)]
    pub path: Vec<String>,

    #[serde(default)]
    pub ports: Vec<PortInfo>,

    #[serde(default)]
    pub applications: Vec<String>,

    /// The visit was cut short; fields may be missing
    #[serde(default)]
    pub partial: bool,

    /// A complete command session finished
    #[serde(default)]
    pub visited: bool,

    #[serde(default)]
    pub last_visited: Option<DateTime<Utc>>,
}

impl NodeRecord {
    /// Creates an empty (stub) record
    pub fn new(callsign: Callsign) -> Self {
        Self {
            callsign,
            primary_alias: None,
            other_aliases: BTreeSet::new(),
            gridsquare: None,
            city: None,
            state: None,
            node_types: Vec::new(),
            neighbors: BTreeSet::new(),
            route_quality: BTreeMap::new(),
            neighbor_ports: BTreeMap::new(),
            routes: Vec::new(),
            unexplored_neighbors: Vec::new(),
            intermittent_neighbors: BTreeSet::new(),
            hop_distance: None,
            path: Vec::new(),
            ports: Vec::new(),
            applications: Vec::new(),
            partial: false,
            visited: false,
            last_visited: None,
        }
    }

    /// The record key (`CALL-SSID`)
    pub fn key(&self) -> String {
        self.callsign.to_string()
    }

    pub fn is_stub(&self) -> bool {
        !self.visited && !self.partial
    }

    pub fn is_complete(&self) -> bool {
        self.visited && !self.partial
    }

    /// Completeness score used to pick between SSID variants
    ///
    /// neighbor count + 1 if the location is known + 1 if applications are known
    pub fn score(&self) -> usize {
        let location = usize::from(self.gridsquare.is_some() || self.city.is_some());
        let applications = usize::from(!self.applications.is_empty());
        self.neighbors.len() + location + applications
    }

    /// Replaces the route table and derives neighbor, quality and port maps
    ///
    /// Only direct entries describe this node's own links. Quality-0 entries
    /// are kept as blocked but never become neighbors.
    pub fn set_routes(&mut self, routes: Vec<RouteEntry>) {
        self.neighbors.clear();
        self.route_quality.clear();
        self.neighbor_ports.clear();

        for route in routes.iter().filter(|r| r.direct) {
            let base = route.callsign.base().to_string();
            if !route.is_blocked() {
                self.neighbors.insert(base.clone());
                self.neighbor_ports.insert(base.clone(), route.port);
            }
            let quality = self.route_quality.entry(base).or_insert(route.quality);
            *quality = (*quality).max(route.quality);
        }
        self.routes = routes;
    }

    /// Direct route quality toward a neighbor base callsign
    pub fn quality_to(&self, base: &str) -> Option<u32> {
        self.route_quality.get(base).copied()
    }

    /// Folds another observation of the same node into this one
    ///
    /// Sets are unioned, missing fields are filled in, and the route table of
    /// the more recent visit wins. Absorbing the same record twice is a no-op.
    pub fn absorb(&mut self, other: &NodeRecord) {
        if other.last_visited > self.last_visited {
            self.routes = other.routes.clone();
            self.route_quality = other.route_quality.clone();
            self.neighbor_ports = other.neighbor_ports.clone();
            self.last_visited = other.last_visited;
            if !other.ports.is_empty() {
                self.ports = other.ports.clone();
            }
        } else {
            for (base, quality) in &other.route_quality {
                self.route_quality.entry(base.clone()).or_insert(*quality);
            }
            for (base, port) in &other.neighbor_ports {
                self.neighbor_ports.entry(base.clone()).or_insert(*port);
            }
            if self.ports.is_empty() {
                self.ports = other.ports.clone();
            }
        }

        self.neighbors.extend(other.neighbors.iter().cloned());
        self.intermittent_neighbors
            .extend(other.intermittent_neighbors.iter().cloned());
        self.other_aliases.extend(other.other_aliases.iter().cloned());

        match (&self.primary_alias, &other.primary_alias) {
            (None, Some(alias)) => self.primary_alias = Some(alias.clone()),
            (Some(ours), Some(theirs)) if ours != theirs => {
                self.other_aliases.insert(theirs.clone());
            }
            _ => {}
        }

        for app in &other.applications {
            if !self.applications.contains(app) {
                self.applications.push(app.clone());
            }
        }
        for node_type in &other.node_types {
            if !self.node_types.contains(node_type) {
                self.node_types.push(node_type.clone());
            }
        }
        for neighbor in &other.unexplored_neighbors {
            if !self.unexplored_neighbors.contains(neighbor) {
                self.unexplored_neighbors.push(neighbor.clone());
            }
        }

        self.gridsquare = self.gridsquare.take().or_else(|| other.gridsquare.clone());
        self.city = self.city.take().or_else(|| other.city.clone());
        self.state = self.state.take().or_else(|| other.state.clone());

        let shorter = match (self.hop_distance, other.hop_distance) {
            (None, Some(_)) => true,
            (Some(ours), Some(theirs)) => theirs < ours,
            _ => false,
        };
        if shorter {
            self.hop_distance = other.hop_distance;
            self.path = other.path.clone();
        }

        self.visited |= other.visited;
        self.partial = !self.visited && (self.partial || other.partial);
    }
}

/// A directed, reciprocally confirmed link between two visited nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
    /// Radio port on `from`
    pub port: Option<u8>,
    /// Quality reported by `from`
    pub quality: u32,
    pub intermittent: bool,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }
}

/// Crawl metadata stored alongside the topology
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlMetadata {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub mode: Option<String>,
    pub local_node: Option<String>,
    pub start_node: Option<String>,
    pub max_hops: Option<u32>,
    pub config_hash: Option<String>,
    pub node_count: usize,
    pub visited_count: usize,
    pub partial_count: usize,
    pub connection_count: usize,
    /// Set when the run was cut short by an operator interrupt
    pub interrupted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(s: &str) -> Callsign {
        s.parse().unwrap()
    }

    fn route(port: u8, target: &str, quality: u32, direct: bool) -> RouteEntry {
        RouteEntry {
            port,
            callsign: call(target),
            quality,
            count: None,
            direct,
        }
    }

    #[test]
    fn test_set_routes() {
        let mut record = NodeRecord::new(call("KC1JMH-15"));
        record.set_routes(vec![
            route(1, "KS1R-15", 200, true),
            route(2, "D1DDD-15", 0, true),
            route(1, "C3CCC-15", 150, false),
        ]);

        assert_eq!(record.neighbors.iter().collect::<Vec<_>>(), vec!["KS1R"]);
        assert_eq!(record.quality_to("D1DDD"), Some(0));
        assert_eq!(record.quality_to("C3CCC"), None);
        assert_eq!(record.neighbor_ports.get("KS1R"), Some(&1));
        assert_eq!(record.routes.len(), 3);
    }

    #[test]
    fn test_score() {
        let mut record = NodeRecord::new(call("KS1R-15"));
        assert_eq!(record.score(), 0);
        record.neighbors.insert("A1AAA".to_string());
        record.gridsquare = Some("FN43".to_string());
        record.applications.push("BBS".to_string());
        assert_eq!(record.score(), 3);
    }

    #[test]
    fn test_stub_and_complete() {
        let mut record = NodeRecord::new(call("KS1R-15"));
        assert!(record.is_stub());
        record.partial = true;
        assert!(!record.is_stub());
        assert!(!record.is_complete());
        record.partial = false;
        record.visited = true;
        assert!(record.is_complete());
    }

    #[test]
    fn test_absorb_is_idempotent() {
        let mut ours = NodeRecord::new(call("KS1R-15"));
        ours.visited = true;
        ours.last_visited = DateTime::from_timestamp(1_700_000_000, 0);
        ours.set_routes(vec![route(1, "A1AAA-1", 200, true)]);
        ours.primary_alias = Some("SHOP".to_string());

        let mut theirs = NodeRecord::new(call("KS1R-15"));
        theirs.visited = true;
        theirs.last_visited = DateTime::from_timestamp(1_700_000_500, 0);
        theirs.set_routes(vec![route(2, "B2BBB-1", 180, true)]);
        theirs.primary_alias = Some("KSHOP".to_string());
        theirs.city = Some("Camden".to_string());

        ours.absorb(&theirs);
        let once = ours.clone();
        ours.absorb(&theirs);

        assert_eq!(ours, once);
        assert!(ours.neighbors.contains("A1AAA"));
        assert!(ours.neighbors.contains("B2BBB"));
        assert_eq!(ours.neighbor_ports.get("B2BBB"), Some(&2));
        assert_eq!(ours.city.as_deref(), Some("Camden"));
        assert!(ours.other_aliases.contains("KSHOP"));
    }
}
