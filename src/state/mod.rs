//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitPhase`: the per-node visit state machine (connect, command sequence, merge)
//! - `IntermittentLinkLog`: failure history of attempted links, keyed by (from, to)

mod intermittent;
mod visit_phase;

// Re-export main types
pub use intermittent::{IntermittentLink, IntermittentLinkLog};
pub use visit_phase::VisitPhase;
