//! Console output parsers
//!
//! Each node command produces free text. This module turns that text into
//! structured records, one pure function per command:
//!
//! - `PORTS` → [`PortInfo`]
//! - `NODES` → [`AliasEntry`]
//! - `ROUTES` → [`RouteEntry`]
//! - `MH <port>` → [`HeardEntry`]
//! - `INFO` → [`InfoSummary`] (best-effort, low confidence)
//! - `?` → [`CommandList`]
//!
//! Lines that do not match a command's grammar are skipped. Prompt/header
//! lines (which contain the node's `}` prompt marker) are ignored everywhere.

mod commands;
mod info;
mod mheard;
mod nodes;
mod ports;
mod routes;

pub use commands::{parse_commands, CommandList, STANDARD_COMMANDS};
pub use info::{parse_info, InfoSummary};
pub use mheard::{parse_mheard, HeardEntry};
pub use nodes::{parse_nodes, parse_prompt_identity, AliasEntry};
pub use ports::{is_amateur_frequency, parse_ports, PortInfo};
pub use routes::{parse_routes, RouteEntry};

use serde::{Deserialize, Serialize};

/// How much a parsed value can be trusted
///
/// Structured tables (ports, routes, nodes, heard) are `High`. Anything
/// scraped out of freeform text is `Low` and must never override a value
/// that came from a structured source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    Low,
    High,
}

/// Returns the lines of a response that may carry data
///
/// Blank lines and prompt/header lines are dropped.
pub(crate) fn data_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty() && !line.contains('}'))
}
