use crate::callsign::{normalize_alias, normalize_callsign, Callsign};
use crate::parser::data_lines;
use serde::{Deserialize, Serialize};

/// One entry of a node's `NODES` (alias) table
///
/// Both `ALIAS:CALL-SSID` pairs and bare `CALL-SSID` entries are crawlable
/// node identities. Bare entries carry no alias and are lower confidence for
/// alias lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub alias: Option<String>,
    pub callsign: Callsign,
}

impl AliasEntry {
    /// Returns true if this entry is a bare callsign with no alias
    pub fn is_bare(&self) -> bool {
        self.alias.is_none()
    }
}

/// Parses the output of the `NODES` command
///
/// Entries are whitespace-separated and may be packed several per line.
///
/// # Examples
///
/// ```
/// use nodemap::parser::parse_nodes;
///
/// let entries = parse_nodes("BURG:KC1JMH-2   CAMDEN:K1ABC-7  KC1XYZ-15\n");
/// assert_eq!(entries.len(), 3);
/// assert_eq!(entries[0].alias.as_deref(), Some("BURG"));
/// assert!(entries[2].is_bare());
/// ```
pub fn parse_nodes(text: &str) -> Vec<AliasEntry> {
    let mut entries = Vec::new();

    for line in data_lines(text) {
        for token in line.split_whitespace() {
            if let Some(entry) = parse_token(token) {
                entries.push(entry);
            }
        }
    }

    tracing::trace!("Parsed {} alias table entries", entries.len());
    entries
}

/// Extracts the answering node's own identity from its prompt header
///
/// Command responses start with a `ALIAS:CALL-SSID}` header line. The first
/// such header found is returned.
///
/// # Examples
///
/// ```
/// use nodemap::parser::parse_prompt_identity;
///
/// let me = parse_prompt_identity("SHOP:KS1R-15} Ports\n  1 144.990 MHz\n").unwrap();
/// assert_eq!(me.alias.as_deref(), Some("SHOP"));
/// assert_eq!(me.callsign.to_string(), "KS1R-15");
/// ```
pub fn parse_prompt_identity(text: &str) -> Option<AliasEntry> {
    text.lines()
        .filter_map(|line| line.split_once('}'))
        .find_map(|(head, _)| head.split_whitespace().last().and_then(parse_token))
}

fn parse_token(token: &str) -> Option<AliasEntry> {
    match token.split_once(':') {
        Some((alias, call)) => {
            let callsign = normalize_callsign(call).ok()?;
            if !callsign.has_ssid() {
                return None;
            }
            // A leading colon means the node advertises no alias
            let alias = if alias.is_empty() {
                None
            } else {
                Some(normalize_alias(alias).ok()?)
            };
            Some(AliasEntry { alias, callsign })
        }
        None => {
            // Bare tokens are only identities when they carry an SSID;
            // this also keeps prose words out of the table.
            let callsign = normalize_callsign(token).ok()?;
            callsign.has_ssid().then_some(AliasEntry {
                alias: None,
                callsign,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_pairs() {
        let text = "KC1JMH-15} Nodes\nBURG:KC1JMH-2  SHOP:KS1R-15\n";
        let entries = parse_nodes(text);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].alias.as_deref(), Some("SHOP"));
        assert_eq!(entries[1].callsign.to_string(), "KS1R-15");
    }

    #[test]
    fn test_bare_entries() {
        let entries = parse_nodes("N1XYZ-7 W1ABC-4\n");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.is_bare()));
    }

    #[test]
    fn test_bare_without_ssid_ignored() {
        let entries = parse_nodes("W1ABC N1XYZ-7\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].callsign.to_string(), "N1XYZ-7");
    }

    #[test]
    fn test_empty_alias() {
        let entries = parse_nodes(":N1XYZ-7\n");
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_bare());
    }

    #[test]
    fn test_prompt_identity() {
        let text = "Connected to SHOP\nSHOP:KS1R-15} Nodes\nBURG:KC1JMH-2\n";
        let me = parse_prompt_identity(text).unwrap();
        assert_eq!(me.callsign.to_string(), "KS1R-15");
        assert!(parse_prompt_identity("no header here\n").is_none());
    }

    #[test]
    fn test_garbage_tokens_skipped() {
        let entries = parse_nodes("Nodes in table: 3\nTOOLONGALIAS:K1ABC-7 BURG:nope\n");
        assert!(entries.is_empty());
    }
}
