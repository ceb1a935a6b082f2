use crate::callsign::{normalize_callsign, Callsign};
use crate::parser::data_lines;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static HEARD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9]{1,6}(?:-\d{1,2})?)\*?\s+(?:(\d+):)?(\d{1,2}):(\d{2}):(\d{2})")
        .expect("valid heard regex")
});

/// One entry of a port's heard-station list (`MH <port>`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeardEntry {
    pub callsign: Callsign,
    /// Time since the station was last heard
    pub elapsed: Duration,
}

impl HeardEntry {
    /// Returns true if this entry can be a node
    ///
    /// Stations heard without an SSID are operators or digipeaters; they are
    /// never added to neighbor lists or the traversal queue.
    pub fn is_node_candidate(&self) -> bool {
        self.callsign.has_ssid()
    }
}

/// Parses the output of the `MH <port>` command
///
/// Elapsed time is `dd:hh:mm:ss` or `hh:mm:ss`.
///
/// # Examples
///
/// ```
/// use nodemap::parser::parse_mheard;
///
/// let heard = parse_mheard("KS1R-15    00:00:05:12\nW1ABC      00:01:22:33\n");
/// assert_eq!(heard.len(), 2);
/// assert!(heard[0].is_node_candidate());
/// assert!(!heard[1].is_node_candidate());
/// ```
pub fn parse_mheard(text: &str) -> Vec<HeardEntry> {
    let mut heard = Vec::new();

    for line in data_lines(text) {
        let Some(caps) = HEARD_LINE.captures(line) else {
            continue;
        };
        let Ok(callsign) = normalize_callsign(&caps[1]) else {
            continue;
        };

        let field = |i: usize| -> u64 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        let seconds = field(2) * 86_400 + field(3) * 3_600 + field(4) * 60 + field(5);

        heard.push(HeardEntry {
            callsign,
            elapsed: Duration::from_secs(seconds),
        });
    }

    tracing::trace!("Parsed {} heard entries", heard.len());
    heard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_format() {
        let heard = parse_mheard("KS1R-15    01:02:03:04\n");
        assert_eq!(heard[0].elapsed, Duration::from_secs(86_400 + 7_200 + 180 + 4));
    }

    #[test]
    fn test_short_format() {
        let heard = parse_mheard("N1XYZ-7*  00:00:40\n");
        assert_eq!(heard.len(), 1);
        assert_eq!(heard[0].callsign.to_string(), "N1XYZ-7");
        assert_eq!(heard[0].elapsed, Duration::from_secs(40));
    }

    #[test]
    fn test_operator_without_ssid() {
        let heard = parse_mheard("KC1JMH-15} Heard List for Port 1\nW1ABC 00:00:10:00\n");
        assert_eq!(heard.len(), 1);
        assert!(!heard[0].is_node_candidate());
    }

    #[test]
    fn test_invalid_lines_skipped() {
        let heard = parse_mheard("Heard List for Port 1\nBEACON 00:00:01:00\n");
        assert!(heard.is_empty());
    }
}
