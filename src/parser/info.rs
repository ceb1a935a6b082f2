use crate::parser::Confidence;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static GRID_AFTER_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:grid(?:square)?|locator|qth)\b\W{0,3}([A-R]{2}[0-9]{2}(?:[A-X]{2})?)\b")
        .expect("valid grid keyword regex")
});

static GRID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-R]{2}[0-9]{2}(?:[a-xA-X]{2})?)\b").expect("valid grid regex")
});

static CITY_STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?:\s[A-Z][a-z]+){0,2}),\s*([A-Z]{2})\b")
        .expect("valid city/state regex")
});

/// Software and service keywords that identify what kind of node this is
const NODE_TYPE_KEYWORDS: &[&str] = &[
    "LINBPQ", "BPQ32", "BPQ", "JNOS", "XROUTER", "XRPI", "TNOS", "FBB", "WINLINK", "RMS",
    "BBS", "CHAT", "APRS", "NETROM",
];

/// Best-effort facts scraped from the freeform `INFO` text
///
/// Every field here is low confidence and advisory only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoSummary {
    pub gridsquare: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub node_types: Vec<String>,
    pub confidence: Confidence,
}

/// Parses the output of the `INFO` command
///
/// A locator that follows a "grid"/"locator"/"QTH" label is preferred over a
/// bare locator-shaped word elsewhere in the text.
///
/// # Examples
///
/// ```
/// use nodemap::parser::parse_info;
///
/// let info = parse_info("LinBPQ node in Camden, ME  Grid: FN54sf");
/// assert_eq!(info.gridsquare.as_deref(), Some("FN54sf"));
/// assert_eq!(info.city.as_deref(), Some("Camden"));
/// assert_eq!(info.state.as_deref(), Some("ME"));
/// ```
pub fn parse_info(text: &str) -> InfoSummary {
    let gridsquare = GRID_AFTER_KEYWORD
        .captures(text)
        .or_else(|| GRID.captures(text))
        .map(|caps| normalize_grid(&caps[1]));

    let (city, state) = CITY_STATE
        .captures(text)
        .map(|caps| (Some(caps[1].to_string()), Some(caps[2].to_string())))
        .unwrap_or((None, None));

    let upper = text.to_uppercase();
    let words: Vec<&str> = upper
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mut node_types: Vec<String> = Vec::new();
    for keyword in NODE_TYPE_KEYWORDS {
        if words.contains(keyword) && !node_types.iter().any(|t| t == keyword) {
            node_types.push(keyword.to_string());
        }
    }

    InfoSummary {
        gridsquare,
        city,
        state,
        node_types,
        confidence: Confidence::Low,
    }
}

/// Field pair uppercase, subsquare lowercase (e.g. `FN54sf`)
fn normalize_grid(raw: &str) -> String {
    raw.char_indices()
        .map(|(i, c)| {
            if i < 4 {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_after_keyword_preferred() {
        let info = parse_info("Node AB12 relay. QTH: fn43");
        assert_eq!(info.gridsquare.as_deref(), Some("FN43"));
    }

    #[test]
    fn test_bare_grid() {
        let info = parse_info("Hilltop site FN43rq with 50W");
        assert_eq!(info.gridsquare.as_deref(), Some("FN43rq"));
    }

    #[test]
    fn test_callsign_not_mistaken_for_grid() {
        let info = parse_info("Sysop KC1JMH");
        assert_eq!(info.gridsquare, None);
    }

    #[test]
    fn test_node_types() {
        let info = parse_info("Running LinBPQ with BBS and CHAT. Winlink RMS gateway.");
        assert_eq!(info.node_types, vec!["LINBPQ", "WINLINK", "RMS", "BBS", "CHAT"]);
    }

    #[test]
    fn test_always_low_confidence() {
        let info = parse_info("");
        assert_eq!(info.confidence, Confidence::Low);
        assert_eq!(info, InfoSummary::default());
    }
}
