//! Callsign handling module for Nodemap
//!
//! This module provides the callsign and alias value types used as node
//! identities everywhere else in the crate, plus their normalization rules.

mod normalize;

pub use normalize::{normalize_alias, normalize_callsign};

use crate::CallsignError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A station callsign with an optional SSID
///
/// The base callsign is always stored uppercase. A callsign without an SSID
/// (e.g. a heard operator station) is distinct from one with an explicit SSID:
/// only the latter is a crawlable node identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Callsign {
    base: String,
    ssid: Option<u8>,
}

impl Callsign {
    /// Creates a callsign from an already-validated base and SSID
    ///
    /// # Arguments
    ///
    /// * `base` - The base callsign (normalized to uppercase)
    /// * `ssid` - Optional SSID (0-15)
    pub fn new(base: &str, ssid: Option<u8>) -> Result<Self, CallsignError> {
        let base = normalize::normalize_base(base)?;
        if let Some(ssid) = ssid {
            if ssid > 15 {
                return Err(CallsignError::InvalidSsid(format!("{}-{}", base, ssid)));
            }
        }
        Ok(Self { base, ssid })
    }

    /// Returns the base callsign without SSID
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the SSID, if one was given explicitly
    pub fn ssid(&self) -> Option<u8> {
        self.ssid
    }

    /// Returns true if this callsign carries an explicit SSID
    ///
    /// Heard-list entries without an SSID are operators or digipeaters and
    /// are never treated as nodes.
    pub fn has_ssid(&self) -> bool {
        self.ssid.is_some()
    }

    /// Returns a copy of this callsign with the given SSID
    pub fn with_ssid(&self, ssid: u8) -> Self {
        Self {
            base: self.base.clone(),
            ssid: Some(ssid.min(15)),
        }
    }

    /// Returns true if both callsigns share the same base callsign
    pub fn same_base(&self, other: &Callsign) -> bool {
        self.base == other.base
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ssid {
            Some(ssid) => write!(f, "{}-{}", self.base, ssid),
            None => write!(f, "{}", self.base),
        }
    }
}

impl FromStr for Callsign {
    type Err = CallsignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_callsign(s)
    }
}

impl TryFrom<String> for Callsign {
    type Error = CallsignError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize_callsign(&value)
    }
}

impl From<Callsign> for String {
    fn from(value: Callsign) -> Self {
        value.to_string()
    }
}

/// Returns the base callsign portion of a `CALL-SSID` key
///
/// Used where record keys are handled as plain strings.
pub fn base_of(key: &str) -> &str {
    key.split('-').next().unwrap_or(key)
}
