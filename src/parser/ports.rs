use crate::parser::data_lines;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,3})\s+(.+?)\s*$").expect("valid port regex"));

static FREQUENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,4}\.\d{1,4})\s*(mhz)?\b").expect("valid frequency regex")
});

static SPEED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{3,6})\s*(?:baud|bd|bps|b/s)\b").expect("valid speed regex")
});

/// Amateur band edges in MHz (160m through 23cm)
const AMATEUR_BANDS: &[(f64, f64)] = &[
    (1.8, 2.0),
    (3.5, 4.0),
    (5.33, 5.41),
    (7.0, 7.3),
    (10.1, 10.15),
    (14.0, 14.35),
    (18.068, 18.168),
    (21.0, 21.45),
    (24.89, 24.99),
    (28.0, 29.7),
    (50.0, 54.0),
    (144.0, 148.0),
    (219.0, 225.0),
    (420.0, 450.0),
    (902.0, 928.0),
    (1240.0, 1300.0),
];

/// Port description keywords that mark a networked (non-RF) transport
const NON_RF_KEYWORDS: &[&str] = &[
    "AXIP", "AX/IP", "AXUDP", "UDP", "TCP", "TELNET", "INTERNET", "ETHER", "LOOPBACK", "IP",
];

/// One radio (or network) port reported by `PORTS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortInfo {
    pub number: u8,
    pub description: String,
    pub frequency_mhz: Option<f64>,
    pub baud: Option<u32>,
    pub is_rf: bool,
}

/// Returns true if `mhz` falls inside an amateur allocation
pub fn is_amateur_frequency(mhz: f64) -> bool {
    AMATEUR_BANDS
        .iter()
        .any(|(low, high)| mhz >= *low && mhz <= *high)
}

/// Parses the output of the `PORTS` command
///
/// # Examples
///
/// ```
/// use nodemap::parser::parse_ports;
///
/// let ports = parse_ports("BURG:KC1JMH-15} Ports\n  1 433.300 MHz 1200 BAUD\n  2 AX/IP/UDP\n");
/// assert_eq!(ports.len(), 2);
/// assert!(ports[0].is_rf);
/// assert!(!ports[1].is_rf);
/// ```
pub fn parse_ports(text: &str) -> Vec<PortInfo> {
    let mut ports = Vec::new();

    for line in data_lines(text) {
        let Some(caps) = PORT_LINE.captures(line) else {
            continue;
        };
        let Ok(number) = caps[1].parse::<u8>() else {
            continue;
        };
        let description = caps[2].to_string();

        ports.push(PortInfo {
            number,
            frequency_mhz: extract_frequency(&description),
            baud: extract_speed(&description),
            is_rf: !is_non_rf(&description),
            description,
        });
    }

    ports
}

/// Finds the first in-band frequency in a port description
///
/// Out-of-band numbers (version strings, IP fragments) are discarded.
fn extract_frequency(description: &str) -> Option<f64> {
    FREQUENCY
        .captures_iter(description)
        .filter_map(|caps| caps[1].parse::<f64>().ok())
        .find(|mhz| is_amateur_frequency(*mhz))
}

fn extract_speed(description: &str) -> Option<u32> {
    SPEED
        .captures(description)
        .and_then(|caps| caps[1].parse().ok())
}

fn is_non_rf(description: &str) -> bool {
    let upper = description.to_uppercase();
    upper
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '/'))
        .flat_map(|word| std::iter::once(word).chain(word.split('/')))
        .any(|word| NON_RF_KEYWORDS.contains(&word))
}
