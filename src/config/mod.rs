//! Configuration module for Nodemap
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The local node's address and credentials come from the `[node]` table.
//!
//! # Example
//!
//! ```no_run
//! use nodemap::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("nodemap.toml")).unwrap();
//! println!("Crawler will go at most {} hops", config.crawler.max_hops);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlMode, CrawlerConfig, NodeConfig, OutputConfig, TimeoutConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
