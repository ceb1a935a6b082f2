//! Nodemap: a packet-radio node network mapper
//!
//! This crate crawls a network of packet-radio nodes through their telnet
//! command consoles, hop by hop, and assembles a topology of nodes, links,
//! route qualities and radio ports.

pub mod callsign;
pub mod config;
pub mod crawler;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod state;
pub mod storage;
pub mod transport;

use thiserror::Error;

/// Main error type for Nodemap operations
#[derive(Debug, Error)]
pub enum NodemapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] transport::TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Callsign error: {0}")]
    Callsign(#[from] CallsignError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid callsign in config: {0}")]
    InvalidCallsign(#[from] CallsignError),
}

/// Callsign and alias parsing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallsignError {
    #[error("Callsign is empty")]
    Empty,

    #[error("Invalid callsign: {0}")]
    InvalidBase(String),

    #[error("Invalid SSID in {0} (must be 0-15)")]
    InvalidSsid(String),

    #[error("Invalid alias: {0}")]
    InvalidAlias(String),
}

/// Result type alias for Nodemap operations
pub type Result<T> = std::result::Result<T, NodemapError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use callsign::Callsign;
pub use config::{Config, CrawlMode};
pub use crawler::Coordinator;
pub use resolver::{AddressResolver, ConnectPlan};
pub use storage::{Connection, NodeRecord, TopologyStore};
