/// Visit phase definitions for the per-node crawl state machine
///
/// A visit walks these phases strictly in order. Only a visit that reaches
/// `Merge` counts as complete; one interrupted earlier is persisted as partial.
use std::fmt;

/// Represents the current phase of a node visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisitPhase {
    /// Establishing the (possibly multi-hop) session
    Connect,

    /// Listing radio ports
    Ports,

    /// Reading the alias (NODES) table
    Aliases,

    /// Reading the route table
    Routes,

    /// Reading heard lists, once per RF port
    Mheard,

    /// Reading the freeform info text
    Info,

    /// Reading the command/application list
    Commands,

    /// Leaving the node
    Disconnect,

    /// Folding results into the topology
    Merge,
}

impl VisitPhase {
    /// Returns the phase that follows this one, or None after `Merge`
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Connect => Some(Self::Ports),
            Self::Ports => Some(Self::Aliases),
            Self::Aliases => Some(Self::Routes),
            Self::Routes => Some(Self::Mheard),
            Self::Mheard => Some(Self::Info),
            Self::Info => Some(Self::Commands),
            Self::Commands => Some(Self::Disconnect),
            Self::Disconnect => Some(Self::Merge),
            Self::Merge => None,
        }
    }

    /// Returns true once every console command has been answered
    ///
    /// A visit cut short at or after `Disconnect` has all its data.
    pub fn has_all_data(&self) -> bool {
        matches!(self, Self::Disconnect | Self::Merge)
    }

    /// The console command issued in this phase, if it is a single command
    pub fn command(&self) -> Option<&'static str> {
        match self {
            Self::Ports => Some("PORTS"),
            Self::Aliases => Some("NODES"),
            Self::Routes => Some("ROUTES"),
            Self::Info => Some("INFO"),
            Self::Commands => Some("?"),
            Self::Disconnect => Some("BYE"),
            Self::Connect | Self::Mheard | Self::Merge => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Ports => "ports",
            Self::Aliases => "aliases",
            Self::Routes => "routes",
            Self::Mheard => "mheard",
            Self::Info => "info",
            Self::Commands => "commands",
            Self::Disconnect => "disconnect",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for VisitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        let mut phase = VisitPhase::Connect;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            assert!(next > phase);
            seen.push(next);
            phase = next;
        }
        assert_eq!(seen.len(), 9);
        assert_eq!(phase, VisitPhase::Merge);
    }

    #[test]
    fn test_has_all_data() {
        assert!(!VisitPhase::Connect.has_all_data());
        assert!(!VisitPhase::Commands.has_all_data());
        assert!(VisitPhase::Disconnect.has_all_data());
        assert!(VisitPhase::Merge.has_all_data());
    }

    #[test]
    fn test_commands() {
        assert_eq!(VisitPhase::Routes.command(), Some("ROUTES"));
        assert_eq!(VisitPhase::Mheard.command(), None);
        assert_eq!(VisitPhase::Commands.to_string(), "commands");
    }
}
