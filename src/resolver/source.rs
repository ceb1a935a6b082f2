use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an SSID observation came from, ordered by authority
///
/// Route-table SSIDs come from a node's own direct-neighbor list and are the
/// most trustworthy. Alias tables are relayed second-hand and rank lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SsidSource {
    AliasTable,
    StaleHeard,
    FreshHeard,
    RouteTable,
}

impl SsidSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AliasTable => "alias-table",
            Self::StaleHeard => "stale-heard",
            Self::FreshHeard => "fresh-heard",
            Self::RouteTable => "route-table",
        }
    }
}

impl fmt::Display for SsidSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current SSID resolution for one base callsign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SsidObservation {
    pub ssid: u8,
    pub source: SsidSource,
    pub observed_at: DateTime<Utc>,
}

impl SsidObservation {
    /// Decides whether `incoming` replaces this resolution
    ///
    /// A strictly higher-ranked source always wins. An equal or lower one
    /// wins only once this entry is older than the freshness window.
    pub fn is_superseded_by(&self, incoming: &SsidObservation, freshness: chrono::Duration) -> bool {
        if incoming.source > self.source {
            return true;
        }
        incoming.observed_at - self.observed_at > freshness
    }
}
