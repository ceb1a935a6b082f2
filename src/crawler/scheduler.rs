//! Traversal queue for the node crawl
//!
//! This module handles:
//! - Priority ordering of pending visits by route quality, path length and recency
//! - Cycle suppression (a target may never appear in its own path)
//! - Run-wide duplicate suppression on (target, path-prefix)
//! - Dropping candidates not heard recently enough to be online
//! - Enforcing the hop ceiling (an explicit start node is exempt)

use crate::callsign::Callsign;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;
use thiserror::Error;

/// A pending visit: reach `target` through `path_prefix`
///
/// The prefix lists the intermediate nodes after the local node, in connect
/// order. It never includes the local node or the target itself.
#[derive(Debug, Clone)]
pub struct TraversalCandidate {
    /// Node to visit
    pub target: Callsign,

    /// Intermediate hops, in connect order
    pub path_prefix: Vec<Callsign>,

    /// Route quality reported by the parent at enqueue time
    pub quality: u32,

    /// Time since the target was last heard, when known
    pub last_heard: Option<Duration>,

    /// True for the user-specified start node
    pub explicit_start: bool,

    /// True for the local node itself (hop 0)
    pub is_local: bool,
}

impl TraversalCandidate {
    /// Creates a candidate discovered in a route table
    pub fn new(target: Callsign, path_prefix: Vec<Callsign>, quality: u32) -> Self {
        Self {
            target,
            path_prefix,
            quality,
            last_heard: None,
            explicit_start: false,
            is_local: false,
        }
    }

    /// Creates the hop-0 candidate for the local node
    pub fn local(target: Callsign) -> Self {
        Self {
            is_local: true,
            ..Self::new(target, Vec::new(), u32::MAX)
        }
    }

    /// Creates the candidate for a user-specified start node
    pub fn start(target: Callsign) -> Self {
        Self {
            explicit_start: true,
            ..Self::new(target, Vec::new(), u32::MAX)
        }
    }

    pub fn with_last_heard(mut self, last_heard: Option<Duration>) -> Self {
        self.last_heard = last_heard;
        self
    }

    /// Hop distance from the local node
    pub fn hops(&self) -> usize {
        if self.is_local {
            0
        } else {
            self.path_prefix.len() + 1
        }
    }

    /// The full connect path: every prefix hop plus the target
    pub fn connect_path(&self) -> Vec<Callsign> {
        if self.is_local {
            return Vec::new();
        }
        let mut path = self.path_prefix.clone();
        path.push(self.target.clone());
        path
    }

    fn key(&self) -> (String, Vec<String>) {
        (
            self.target.to_string(),
            self.path_prefix.iter().map(|c| c.to_string()).collect(),
        )
    }
}

// Highest quality first, then shortest path, then most recently heard
impl Ord for TraversalCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        let heard = |c: &Self| c.last_heard.unwrap_or(Duration::MAX);
        self.quality
            .cmp(&other.quality)
            .then_with(|| other.path_prefix.len().cmp(&self.path_prefix.len()))
            .then_with(|| heard(other).cmp(&heard(self)))
            .then_with(|| other.target.cmp(&self.target))
    }
}

impl PartialOrd for TraversalCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TraversalCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TraversalCandidate {}

/// Why a candidate was not queued
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnqueueRejection {
    #[error("target already on its own path")]
    Cycle,

    #[error("target and path already queued this run")]
    Duplicate,

    #[error("last heard {0:?} ago")]
    Stale(Duration),

    #[error("{hops} hops exceeds the ceiling of {max}")]
    HopCeiling { hops: usize, max: u32 },

    #[error("route quality is 0 (blocked)")]
    Blocked,
}

/// Priority queue of pending visits
pub struct PathfindingQueue {
    heap: BinaryHeap<TraversalCandidate>,

    /// Every (target, prefix) ever accepted this run
    seen: HashSet<(String, Vec<String>)>,

    /// The local node; never a valid target in any path
    origin: Callsign,

    max_hops: u32,

    stale_after: Duration,
}

impl PathfindingQueue {
    /// Creates an empty queue
    ///
    /// # Arguments
    ///
    /// * `origin` - The local node
    /// * `max_hops` - Hop ceiling for non-start candidates
    /// * `stale_after` - Candidates last heard longer ago than this are dropped
    pub fn new(origin: Callsign, max_hops: u32, stale_after: Duration) -> Self {
        Self {
            heap: BinaryHeap::new(),
            seen: HashSet::new(),
            origin,
            max_hops,
            stale_after,
        }
    }

    /// Queues a candidate after checking every rejection rule
    pub fn enqueue(&mut self, candidate: TraversalCandidate) -> Result<(), EnqueueRejection> {
        if !candidate.is_local {
            if candidate.quality == 0 {
                return Err(EnqueueRejection::Blocked);
            }

            let target = &candidate.target;
            if target.same_base(&self.origin)
                || candidate.path_prefix.iter().any(|hop| hop.same_base(target))
            {
                return Err(EnqueueRejection::Cycle);
            }

            if !candidate.explicit_start && candidate.hops() > self.max_hops as usize {
                return Err(EnqueueRejection::HopCeiling {
                    hops: candidate.hops(),
                    max: self.max_hops,
                });
            }

            if let Some(heard) = candidate.last_heard {
                if heard > self.stale_after {
                    return Err(EnqueueRejection::Stale(heard));
                }
            }
        }

        if !self.seen.insert(candidate.key()) {
            return Err(EnqueueRejection::Duplicate);
        }

        tracing::trace!(
            "Queued {} via {} hop(s), quality {}",
            candidate.target,
            candidate.path_prefix.len(),
            candidate.quality
        );
        self.heap.push(candidate);
        Ok(())
    }

    /// Removes and returns the best pending candidate
    pub fn pop(&mut self) -> Option<TraversalCandidate> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
