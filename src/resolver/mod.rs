//! Address resolution module for Nodemap
//!
//! This module handles:
//! - Resolving base callsigns to SSIDs from three disagreeing sources
//! - Alias to callsign-SSID mappings learned from alias tables
//! - Radio port knowledge per (via-node, target) pair
//! - Producing a [`ConnectPlan`] for any target
//! - Rebuilding all of the above from a persisted snapshot (rehydrate)

mod plan;
mod source;

pub use plan::{ConnectMethod, ConnectPlan};
pub use source::{SsidObservation, SsidSource};

use crate::callsign::Callsign;
use crate::parser::{AliasEntry, HeardEntry, RouteEntry};
use crate::storage::TopologyStore;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Process-scoped address tables
///
/// Every update goes through the same source-priority rule, whether it comes
/// from a live console or from a stored snapshot.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    /// base callsign -> current SSID resolution
    ssids: HashMap<String, SsidObservation>,

    /// alias -> callsign-SSID
    alias_to_call: HashMap<String, Callsign>,

    /// callsign-SSID -> alias
    call_to_alias: HashMap<String, String>,

    /// (via base, target base) -> radio port on the via node
    ports: HashMap<(String, String), u8>,

    /// base callsign -> shortest time since last heard
    last_heard: HashMap<String, Duration>,

    /// Equal/lower-rank observations may replace entries older than this
    freshness: chrono::Duration,

    /// Heard entries older than this rank as stale
    heard_stale_after: Duration,
}

impl AddressResolver {
    /// Creates an empty resolver
    ///
    /// # Arguments
    ///
    /// * `freshness` - Window after which any new observation may replace an entry
    /// * `heard_stale_after` - Heard-list age separating fresh from stale entries
    pub fn new(freshness: chrono::Duration, heard_stale_after: Duration) -> Self {
        Self {
            ssids: HashMap::new(),
            alias_to_call: HashMap::new(),
            call_to_alias: HashMap::new(),
            ports: HashMap::new(),
            last_heard: HashMap::new(),
            freshness,
            heard_stale_after,
        }
    }

    /// Records one SSID observation for a callsign
    ///
    /// Callsigns without an SSID carry no SSID information and are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the resolution for this base callsign changed
    pub fn observe(&mut self, callsign: &Callsign, source: SsidSource, at: DateTime<Utc>) -> bool {
        let Some(ssid) = callsign.ssid() else {
            return false;
        };
        let incoming = SsidObservation {
            ssid,
            source,
            observed_at: at,
        };

        match self.ssids.get_mut(callsign.base()) {
            None => {
                tracing::trace!("Resolved {} from {}", callsign, source);
                self.ssids.insert(callsign.base().to_string(), incoming);
                true
            }
            Some(current) if current.ssid == ssid => {
                // Same answer: keep the stronger source, refresh the timestamp
                if source >= current.source {
                    current.source = source;
                }
                current.observed_at = current.observed_at.max(at);
                false
            }
            Some(current) => {
                if !current.is_superseded_by(&incoming, self.freshness) {
                    tracing::trace!(
                        "Ignoring {} from {} (have -{} from {})",
                        callsign,
                        source,
                        current.ssid,
                        current.source
                    );
                    return false;
                }
                tracing::trace!(
                    "Resolved {} from {} (was -{} from {})",
                    callsign,
                    source,
                    current.ssid,
                    current.source
                );
                *current = incoming;
                true
            }
        }
    }

    /// Pins the identity a node answered with after a completed connect
    ///
    /// The node itself is the final authority on its own SSID.
    pub fn assert_identity(&mut self, callsign: &Callsign, at: DateTime<Utc>) {
        if let Some(ssid) = callsign.ssid() {
            self.ssids.insert(
                callsign.base().to_string(),
                SsidObservation {
                    ssid,
                    source: SsidSource::RouteTable,
                    observed_at: at,
                },
            );
        }
    }

    /// Learns from one alias table entry
    pub fn observe_alias(&mut self, entry: &AliasEntry, at: DateTime<Utc>) {
        if let Some(alias) = &entry.alias {
            self.link_alias(alias, &entry.callsign);
        }
        self.observe(&entry.callsign, SsidSource::AliasTable, at);
    }

    /// Learns from one route table entry of the node `via`
    ///
    /// Only direct, unblocked routes carry an authoritative SSID and port.
    pub fn observe_route(&mut self, via: &Callsign, route: &RouteEntry, at: DateTime<Utc>) {
        if !route.direct || route.is_blocked() {
            return;
        }
        self.ports.insert(
            (via.base().to_string(), route.callsign.base().to_string()),
            route.port,
        );
        self.observe(&route.callsign, SsidSource::RouteTable, at);
    }

    /// Learns from one heard-list entry
    ///
    /// Entries without an SSID are not nodes and are ignored entirely.
    pub fn observe_heard(&mut self, entry: &HeardEntry, at: DateTime<Utc>) {
        if !entry.is_node_candidate() {
            return;
        }
        let base = entry.callsign.base().to_string();
        let elapsed = self
            .last_heard
            .get(&base)
            .map_or(entry.elapsed, |seen| (*seen).min(entry.elapsed));
        self.last_heard.insert(base, elapsed);

        let source = if entry.elapsed <= self.heard_stale_after {
            SsidSource::FreshHeard
        } else {
            SsidSource::StaleHeard
        };
        self.observe(&entry.callsign, source, at);
    }

    /// Returns the current SSID resolution for a base callsign
    pub fn resolution(&self, base: &str) -> Option<&SsidObservation> {
        self.ssids.get(base)
    }

    /// Returns the callsign with its resolved SSID, if one is known
    pub fn resolve_ssid(&self, callsign: &Callsign) -> Option<Callsign> {
        match callsign.ssid() {
            Some(_) => Some(callsign.clone()),
            None => self
                .ssids
                .get(callsign.base())
                .map(|obs| callsign.with_ssid(obs.ssid)),
        }
    }

    pub fn alias_for(&self, callsign: &Callsign) -> Option<&str> {
        self.call_to_alias
            .get(&callsign.to_string())
            .map(String::as_str)
    }

    /// Points `alias` at `callsign`, unlinking whichever callsign held it
    fn link_alias(&mut self, alias: &str, callsign: &Callsign) {
        if let Some(previous) = self
            .alias_to_call
            .insert(alias.to_string(), callsign.clone())
        {
            if previous != *callsign
                && self.call_to_alias.get(&previous.to_string()).map(String::as_str) == Some(alias)
            {
                self.call_to_alias.remove(&previous.to_string());
            }
        }
        self.call_to_alias
            .insert(callsign.to_string(), alias.to_string());
    }

    /// Returns the radio port on `via` that reaches `target`
    pub fn port_for(&self, via: &Callsign, target: &Callsign) -> Option<u8> {
        self.ports
            .get(&(via.base().to_string(), target.base().to_string()))
            .copied()
    }

    /// Returns how long ago a base callsign was last heard, if ever
    pub fn last_heard(&self, base: &str) -> Option<Duration> {
        self.last_heard.get(base).copied()
    }

    /// Produces the connect plan for reaching `target` from the node `via`
    ///
    /// Preference order: known port and SSID, known alias, live discovery
    /// when only the SSID is known, and finally a best-effort raw connect.
    pub fn resolve(&self, target: &Callsign, via: &Callsign) -> ConnectPlan {
        let resolved = self.resolve_ssid(target);
        let alias = resolved
            .as_ref()
            .and_then(|call| self.alias_for(call))
            .map(str::to_string);

        match (resolved, self.port_for(via, target)) {
            (Some(target), Some(port)) => ConnectPlan::DirectPort {
                port,
                target,
                fallback_alias: alias,
            },
            (Some(target), None) => match alias {
                Some(alias) => ConnectPlan::NetromAlias { alias, target },
                None => ConnectPlan::DiscoveryFallback { target },
            },
            (None, _) => {
                tracing::warn!(
                    "No SSID, alias or port known for {} from {}; best-effort connect will likely fail",
                    target,
                    via
                );
                ConnectPlan::BestEffort {
                    target: target.clone(),
                }
            }
        }
    }

    /// Rebuilds the address tables from a persisted topology
    ///
    /// SSIDs are decided by majority vote over every stored direct route
    /// entry plus each visited record's own key. Ties go to the SSID whose
    /// most recent voting record was visited last, then to the lower SSID.
    /// The winners are applied through [`AddressResolver::observe`], so live
    /// observations made earlier in this run keep their priority.
    ///
    /// # Returns
    ///
    /// The number of base callsigns that received a resolution
    pub fn rehydrate(&mut self, store: &TopologyStore) -> usize {
        // base -> ssid -> (votes, most recent voting visit)
        let mut votes: BTreeMap<String, BTreeMap<u8, (u32, Option<DateTime<Utc>>)>> =
            BTreeMap::new();
        let mut cast = |call: &Callsign, at: Option<DateTime<Utc>>| {
            if let Some(ssid) = call.ssid() {
                let tally = votes
                    .entry(call.base().to_string())
                    .or_default()
                    .entry(ssid)
                    .or_insert((0, None));
                tally.0 += 1;
                tally.1 = tally.1.max(at);
            }
        };

        for record in store.records() {
            if record.is_stub() {
                continue;
            }
            let at = record.last_visited;
            cast(&record.callsign, at);

            for route in record.routes.iter().filter(|r| r.direct && !r.is_blocked()) {
                cast(&route.callsign, at);
                self.ports.insert(
                    (
                        record.callsign.base().to_string(),
                        route.callsign.base().to_string(),
                    ),
                    route.port,
                );
            }

            if let Some(alias) = &record.primary_alias {
                self.link_alias(alias, &record.callsign);
            }
        }

        let mut resolved = 0;
        for (base, tallies) in votes {
            let winner = tallies.into_iter().max_by(|(ssid_a, a), (ssid_b, b)| {
                a.0.cmp(&b.0)
                    .then_with(|| a.1.cmp(&b.1))
                    .then_with(|| ssid_b.cmp(ssid_a))
            });
            let Some((ssid, (_, at))) = winner else {
                continue;
            };
            let Ok(callsign) = Callsign::new(&base, Some(ssid)) else {
                continue;
            };
            self.observe(&callsign, SsidSource::RouteTable, at.unwrap_or_else(Utc::now));
            resolved += 1;
        }

        tracing::debug!("Rehydrated {} SSID resolutions from snapshot", resolved);
        resolved
    }
}
