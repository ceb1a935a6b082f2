use crate::callsign::{normalize_callsign, Callsign};
use crate::parser::data_lines;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static ROUTE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(>)?\s*(\d{1,3})\s+([A-Za-z0-9]{1,6}(?:-\d{1,2})?)\s+(\d+)(?:\s+(\d+))?")
        .expect("valid route regex")
});

/// One entry of a node's `ROUTES` table
///
/// A `>`-marked line is a direct neighbor: its SSID and port are
/// authoritative. Unmarked lines are reachable through another hop and only
/// contribute quality and connectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub port: u8,
    pub callsign: Callsign,
    /// Opaque "higher is better" rank; 0 means explicitly blocked
    pub quality: u32,
    pub count: Option<u32>,
    pub direct: bool,
}

impl RouteEntry {
    /// Returns true if the sysop has blocked this route (quality 0)
    pub fn is_blocked(&self) -> bool {
        self.quality == 0
    }
}

/// Parses the output of the `ROUTES` command
///
/// # Examples
///
/// ```
/// use nodemap::parser::parse_routes;
///
/// let routes = parse_routes("> 1 KS1R-15 200 6\n  2 N1ABC 0 0\n");
/// assert!(routes[0].direct);
/// assert!(routes[1].is_blocked());
/// ```
pub fn parse_routes(text: &str) -> Vec<RouteEntry> {
    let mut routes = Vec::new();

    for line in data_lines(text) {
        let Some(caps) = ROUTE_LINE.captures(line) else {
            continue;
        };
        let (Ok(port), Ok(callsign), Ok(quality)) = (
            caps[2].parse::<u8>(),
            normalize_callsign(&caps[3]),
            caps[4].parse::<u32>(),
        ) else {
            continue;
        };

        routes.push(RouteEntry {
            port,
            callsign,
            quality,
            count: caps.get(5).and_then(|m| m.as_str().parse().ok()),
            direct: caps.get(1).is_some(),
        });
    }

    tracing::trace!("Parsed {} route entries", routes.len());
    routes
}
