//! Session transport for node consoles
//!
//! This module handles:
//! - TCP connection and login to the local node's console
//! - Chaining connect commands hop by hop, driven by [`ConnectPlan`]s
//! - Stabilization reads for bursty, half-duplex radio links
//! - Classifying every failure by kind, hop and method

mod connector;
mod keywords;
mod session;

pub use crate::resolver::{ConnectMethod, ConnectPlan};
pub use connector::Connector;
pub use keywords::{classify_connect, login_rejection, ConnectOutcome};
pub use session::{ReadEnd, ReadOutcome, ReadTiming, Session};

use crate::config::TimeoutConfig;
use std::time::Duration;
use thiserror::Error;

/// Transport failures
///
/// Connect failures name the hop (1-based; 0 is the login to the local node),
/// the target and the method, so propagation problems can be diagnosed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("hop {hop}: no confirmation from {target} via {method} before timeout")]
    Timeout {
        hop: usize,
        target: String,
        method: ConnectMethod,
    },

    #[error("hop {hop}: {target} rejected {method} connect ({keyword})")]
    Rejected {
        hop: usize,
        target: String,
        method: ConnectMethod,
        keyword: String,
    },

    #[error("hop {hop}: link lost while connecting to {target} via {method}")]
    Lost {
        hop: usize,
        target: String,
        method: ConnectMethod,
    },

    #[error("hop 0: login to {target} failed ({reason})")]
    AuthFailed { target: String, reason: String },

    #[error("link lost during {command}")]
    LinkLost { command: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The failing hop, when the error happened while connecting
    pub fn hop(&self) -> Option<usize> {
        match self {
            Self::Timeout { hop, .. } | Self::Rejected { hop, .. } | Self::Lost { hop, .. } => {
                Some(*hop)
            }
            Self::AuthFailed { .. } => Some(0),
            Self::LinkLost { .. } | Self::Io(_) => None,
        }
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Connect timeout for one hop, given the hops still to be made (this one included)
///
/// `min(base + hops_remaining * per_hop, ceiling)`: non-decreasing in
/// `hops_remaining` and never above the ceiling.
pub fn hop_timeout(timeouts: &TimeoutConfig, hops_remaining: usize) -> Duration {
    let scaled = timeouts
        .connect_base
        .saturating_add(timeouts.connect_per_hop.saturating_mul(hops_remaining as u64));
    Duration::from_millis(scaled.min(timeouts.connect_ceiling))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hop_timeout_monotonic_and_bounded() {
        let timeouts = TimeoutConfig::default();
        let ceiling = Duration::from_millis(timeouts.connect_ceiling);

        let mut previous = Duration::ZERO;
        for hops in 0..50 {
            let t = hop_timeout(&timeouts, hops);
            assert!(t >= previous);
            assert!(t <= ceiling);
            previous = t;
        }
        assert_eq!(hop_timeout(&timeouts, 0), Duration::from_millis(30_000));
        assert_eq!(hop_timeout(&timeouts, 2), Duration::from_millis(60_000));
        assert_eq!(hop_timeout(&timeouts, 1_000), ceiling);
    }

    #[test]
    fn test_error_names_hop_and_method() {
        let err = TransportError::Rejected {
            hop: 2,
            target: "KS1R-15".to_string(),
            method: ConnectMethod::DirectPort,
            keyword: "busy".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("hop 2"));
        assert!(text.contains("KS1R-15"));
        assert!(text.contains("direct port"));
        assert_eq!(err.hop(), Some(2));
    }
}
