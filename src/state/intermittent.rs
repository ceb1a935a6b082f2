use crate::callsign::base_of;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One serialized entry of the intermittent link log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermittentLink {
    pub from: String,
    pub to: String,
    pub failures: Vec<DateTime<Utc>>,
}

/// Failure history of attempted links, keyed by (attempted-from, target)
///
/// A failure here never marks the target unreachable; the same node may be
/// reached and fully visited over another path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<IntermittentLink>", into = "Vec<IntermittentLink>")]
pub struct IntermittentLinkLog {
    links: BTreeMap<(String, String), Vec<DateTime<Utc>>>,
}

impl IntermittentLinkLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed attempt to reach `to` from `from`
    pub fn record(&mut self, from: &str, to: &str, at: DateTime<Utc>) {
        let failures = self
            .links
            .entry((from.to_string(), to.to_string()))
            .or_default();
        failures.push(at);
        failures.sort();
    }

    /// Returns the failure timestamps for one directed pair
    pub fn failures(&self, from: &str, to: &str) -> &[DateTime<Utc>] {
        self.links
            .get(&(from.to_string(), to.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if any attempt between the two stations failed, in
    /// either direction, regardless of SSID
    pub fn is_intermittent(&self, a: &str, b: &str) -> bool {
        let (a, b) = (base_of(a), base_of(b));
        self.links.keys().any(|(from, to)| {
            let (from, to) = (base_of(from), base_of(to));
            (from == a && to == b) || (from == b && to == a)
        })
    }

    /// Base callsigns of every target that failed from `from`
    pub fn targets_from<'a>(&'a self, from: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.links
            .keys()
            .filter(move |(f, _)| base_of(f) == base_of(from))
            .map(|(_, to)| base_of(to))
    }

    /// Folds another log into this one
    ///
    /// Histories are concatenated, then sorted and de-duplicated by exact
    /// timestamp, so merging the same log twice changes nothing.
    pub fn merge(&mut self, other: &IntermittentLinkLog) {
        for (key, failures) in &other.links {
            let merged = self.links.entry(key.clone()).or_default();
            merged.extend(failures.iter().copied());
            merged.sort();
            merged.dedup();
        }
    }

    /// Rewrites every key that names `from` to name `to` instead
    pub fn rename(&mut self, from: &str, to: &str) {
        let renamed: Vec<_> = self
            .links
            .keys()
            .filter(|(f, t)| f == from || t == from)
            .cloned()
            .collect();
        for key in renamed {
            if let Some(failures) = self.links.remove(&key) {
                let swap = |s: &String| if s == from { to.to_string() } else { s.clone() };
                let merged = self.links.entry((swap(&key.0), swap(&key.1))).or_default();
                merged.extend(failures);
                merged.sort();
                merged.dedup();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Total number of recorded failures across every link
    pub fn failure_count(&self) -> usize {
        self.links.values().map(Vec::len).sum()
    }
}

impl From<Vec<IntermittentLink>> for IntermittentLinkLog {
    fn from(entries: Vec<IntermittentLink>) -> Self {
        let mut log = Self::new();
        for entry in entries {
            let failures = log.links.entry((entry.from, entry.to)).or_default();
            failures.extend(entry.failures);
            failures.sort();
            failures.dedup();
        }
        log
    }
}

impl From<IntermittentLinkLog> for Vec<IntermittentLink> {
    fn from(log: IntermittentLinkLog) -> Self {
        log.links
            .into_iter()
            .map(|((from, to), failures)| IntermittentLink { from, to, failures })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_record_and_lookup() {
        let mut log = IntermittentLinkLog::new();
        log.record("KC1JMH-15", "KS1R-15", at(10));
        log.record("KC1JMH-15", "KS1R-15", at(5));

        assert_eq!(log.failures("KC1JMH-15", "KS1R-15"), &[at(5), at(10)]);
        assert!(log.failures("KS1R-15", "KC1JMH-15").is_empty());
        assert!(log.is_intermittent("KS1R-2", "KC1JMH"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut log = IntermittentLinkLog::new();
        log.record("A1A-1", "B2B-2", at(1));

        let mut other = IntermittentLinkLog::new();
        other.record("A1A-1", "B2B-2", at(1));
        other.record("A1A-1", "B2B-2", at(2));
        other.record("B2B-2", "C3C-3", at(3));

        log.merge(&other);
        let once = log.clone();
        log.merge(&other);

        assert_eq!(log, once);
        assert_eq!(log.failures("A1A-1", "B2B-2"), &[at(1), at(2)]);
        assert_eq!(log.failure_count(), 3);
    }

    #[test]
    fn test_rename() {
        let mut log = IntermittentLinkLog::new();
        log.record("A1A-1", "B2B-7", at(1));
        log.rename("B2B-7", "B2B-2");
        assert_eq!(log.failures("A1A-1", "B2B-2"), &[at(1)]);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_serde_as_list() {
        let mut log = IntermittentLinkLog::new();
        log.record("A1A-1", "B2B-2", at(1));

        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["from"], "A1A-1");

        let back: IntermittentLinkLog = serde_json::from_value(json).unwrap();
        assert_eq!(back, log);
    }
}
