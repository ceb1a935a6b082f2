use crate::callsign::Callsign;
use crate::state::IntermittentLinkLog;
use crate::storage::{Connection, CrawlMetadata, NodeRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What [`TopologyStore::merge`] did with a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// New node
    Inserted,
    /// Replaced or refreshed the existing record with the same key
    Updated,
    /// Existing record kept; the incoming one carried nothing better
    Unchanged,
    /// Incoming record won over the listed SSID variants, which were removed
    ReplacedVariants(Vec<String>),
    /// A higher-scoring SSID variant already exists; the incoming record was dropped
    Discarded { kept: String },
}

/// The in-memory topology graph plus crawl metadata
///
/// Connections are always derived from node records: a directed connection
/// A→B exists only when A and B are both known and each reports a non-zero
/// direct route quality toward the other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyStore {
    #[serde(default)]
    pub metadata: CrawlMetadata,

    #[serde(default)]
    nodes: BTreeMap<String, NodeRecord>,

    #[serde(default)]
    connections: Vec<Connection>,

    #[serde(default)]
    intermittent: IntermittentLinkLog,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&NodeRecord> {
        self.nodes.get(key)
    }

    /// Returns every record sharing the base callsign
    pub fn variants<'a>(&'a self, base: &'a str) -> impl Iterator<Item = &'a NodeRecord> + 'a {
        self.nodes
            .values()
            .filter(move |record| record.callsign.base() == base)
    }

    /// Returns the record for this exact callsign, or any variant of its base
    pub fn find(&self, callsign: &Callsign) -> Option<&NodeRecord> {
        self.nodes
            .get(&callsign.to_string())
            .or_else(|| self.nodes.values().find(|r| r.callsign.same_base(callsign)))
    }

    pub fn records(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn intermittent(&self) -> &IntermittentLinkLog {
        &self.intermittent
    }

    /// Records a failed attempt to reach `to` from `from`
    ///
    /// The target is only flagged on the attempting node; it stays eligible
    /// over every other path.
    pub fn record_failure(&mut self, from: &Callsign, to: &Callsign, at: DateTime<Utc>) {
        self.intermittent
            .record(&from.to_string(), &to.to_string(), at);
        if let Some(record) = self.nodes.get_mut(&from.to_string()) {
            record
                .intermittent_neighbors
                .insert(to.base().to_string());
        }
        self.rebuild_connections();
    }

    /// Adds a stub for a node listed as a neighbor, unless any variant exists
    ///
    /// # Returns
    ///
    /// `true` if a stub was created
    pub fn ensure_stub(&mut self, callsign: &Callsign) -> bool {
        if self.variants(callsign.base()).next().is_some() {
            return false;
        }
        self.nodes
            .insert(callsign.to_string(), NodeRecord::new(callsign.clone()));
        true
    }

    /// Merges one record, resolving SSID variants of the same base callsign
    ///
    /// A stub never replaces anything and is always replaced. Otherwise the
    /// higher completeness score wins and ties go to the incoming record.
    /// A partial record never overwrites a complete one with the same key.
    pub fn merge(&mut self, record: NodeRecord) -> MergeOutcome {
        let outcome = self.merge_record(record);
        self.rebuild_connections();
        outcome
    }

    fn merge_record(&mut self, mut record: NodeRecord) -> MergeOutcome {
        let key = record.key();

        let variants: Vec<String> = self
            .variants(record.callsign.base())
            .filter(|existing| existing.key() != key)
            .map(NodeRecord::key)
            .collect();

        for variant in &variants {
            let existing = &self.nodes[variant];
            let existing_wins = !existing.is_stub()
                && (record.is_stub() || existing.score() > record.score());
            if existing_wins {
                tracing::debug!(
                    "Keeping {} (score {}) over variant {} (score {})",
                    variant,
                    existing.score(),
                    key,
                    record.score()
                );
                return MergeOutcome::Discarded {
                    kept: variant.clone(),
                };
            }
        }

        for variant in &variants {
            if let Some(loser) = self.nodes.remove(variant) {
                tracing::debug!("Replacing SSID variant {} with {}", variant, key);
                record.other_aliases.extend(loser.other_aliases);
                record
                    .intermittent_neighbors
                    .extend(loser.intermittent_neighbors);
                if record.primary_alias.is_none() {
                    record.primary_alias = loser.primary_alias;
                }
                self.intermittent.rename(variant, &key);
            }
        }

        let outcome = match self.nodes.get(&key) {
            None => {
                self.nodes.insert(key, record);
                MergeOutcome::Inserted
            }
            Some(existing)
                if record.is_stub() || (record.partial && existing.is_complete()) =>
            {
                MergeOutcome::Unchanged
            }
            Some(existing) => {
                record
                    .other_aliases
                    .extend(existing.other_aliases.iter().cloned());
                record
                    .intermittent_neighbors
                    .extend(existing.intermittent_neighbors.iter().cloned());
                match (&record.primary_alias, &existing.primary_alias) {
                    (None, Some(old)) => record.primary_alias = Some(old.clone()),
                    (Some(new), Some(old)) if new != old => {
                        record.other_aliases.insert(old.clone());
                    }
                    _ => {}
                }
                self.nodes.insert(key, record);
                MergeOutcome::Updated
            }
        };

        if variants.is_empty() {
            outcome
        } else {
            MergeOutcome::ReplacedVariants(variants)
        }
    }

    /// Folds another vantage point's snapshot into this one
    ///
    /// Matching nodes are unioned, new nodes are added as-is (subject to
    /// SSID-variant resolution), and intermittent histories are concatenated
    /// with duplicates removed. Merging the same snapshot twice gives the
    /// same result as merging it once.
    pub fn merge_external(&mut self, other: &TopologyStore) {
        for (key, theirs) in &other.nodes {
            match self.nodes.get_mut(key) {
                Some(ours) => ours.absorb(theirs),
                None => {
                    self.merge_record(theirs.clone());
                }
            }
        }
        self.intermittent.merge(&other.intermittent);
        self.rebuild_connections();
        tracing::info!(
            "Merged snapshot with {} nodes; topology now has {} nodes",
            other.len(),
            self.len()
        );
    }

    /// Reduces every base callsign to its single highest-scoring SSID variant
    ///
    /// # Returns
    ///
    /// The keys of removed records
    pub fn dedup_ssid_variants(&mut self) -> Vec<String> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for record in self.nodes.values() {
            groups
                .entry(record.callsign.base().to_string())
                .or_default()
                .push(record.key());
        }

        let mut removed = Vec::new();
        for keys in groups.into_values().filter(|keys| keys.len() > 1) {
            let Some(winner) = keys
                .iter()
                .max_by(|a, b| {
                    let (a, b) = (&self.nodes[*a], &self.nodes[*b]);
                    (!a.is_stub(), a.score(), a.last_visited)
                        .cmp(&(!b.is_stub(), b.score(), b.last_visited))
                        // lower SSID wins a full tie
                        .then_with(|| b.callsign.ssid().cmp(&a.callsign.ssid()))
                })
                .cloned()
            else {
                continue;
            };

            for loser_key in keys.iter().filter(|k| **k != winner) {
                if let Some(loser) = self.nodes.remove(loser_key) {
                    if let Some(kept) = self.nodes.get_mut(&winner) {
                        kept.other_aliases.extend(loser.other_aliases);
                        if let Some(alias) = loser.primary_alias {
                            if kept.primary_alias.as_ref() != Some(&alias) {
                                kept.other_aliases.insert(alias);
                            }
                        }
                        kept.intermittent_neighbors
                            .extend(loser.intermittent_neighbors);
                    }
                    self.intermittent.rename(loser_key, &winner);
                    tracing::info!("Removed SSID variant {} in favor of {}", loser_key, winner);
                    removed.push(loser_key.clone());
                }
            }
        }

        self.rebuild_connections();
        removed
    }

    /// Re-derives the connection list from node records
    pub fn rebuild_connections(&mut self) {
        let mut connections: BTreeMap<(String, String), Connection> = BTreeMap::new();

        for from in self.nodes.values() {
            for (to_base, &quality) in &from.route_quality {
                if quality == 0 {
                    continue;
                }
                for to in self.variants(to_base) {
                    if to.key() == from.key() {
                        continue;
                    }
                    // Reciprocal-validity: the other side must also report > 0
                    if !to
                        .quality_to(from.callsign.base())
                        .is_some_and(|back| back > 0)
                    {
                        continue;
                    }
                    let intermittent = from.intermittent_neighbors.contains(to_base)
                        || to.intermittent_neighbors.contains(from.callsign.base())
                        || self.intermittent.is_intermittent(&from.key(), &to.key());
                    connections.insert(
                        (from.key(), to.key()),
                        Connection {
                            from: from.key(),
                            to: to.key(),
                            port: from.neighbor_ports.get(to_base).copied(),
                            quality,
                            intermittent,
                        },
                    );
                }
            }
        }

        self.connections = connections.into_values().collect();
    }

    /// Updates the count fields of the metadata from the current graph
    pub fn refresh_counts(&mut self) {
        self.metadata.node_count = self.nodes.len();
        self.metadata.visited_count = self.nodes.values().filter(|r| r.is_complete()).count();
        self.metadata.partial_count = self.nodes.values().filter(|r| r.partial).count();
        self.metadata.connection_count = self.connections.len();
    }
}
