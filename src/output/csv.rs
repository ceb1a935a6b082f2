//! Flattened connection export
//!
//! One row per directed connection, for spreadsheet analysis.

use crate::storage::{Connection, TopologyStore};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const HEADER: &str = "from,to,port,quality,intermittent\n";

/// Writes the connection list of `topology` as CSV
///
/// # Arguments
///
/// * `topology` - The topology to export
/// * `output_path` - Path where the CSV file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the file
/// * `Err(std::io::Error)` - Failed to write it
pub fn write_connections_csv(topology: &TopologyStore, output_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(format_connections_csv(topology.connections()).as_bytes())?;
    Ok(())
}

/// Formats connections as CSV text, header included
pub fn format_connections_csv(connections: &[Connection]) -> String {
    let mut csv = String::from(HEADER);

    for connection in connections {
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            connection.from,
            connection.to,
            connection.port.map(|p| p.to_string()).unwrap_or_default(),
            connection.quality,
            connection.intermittent
        ));
    }

    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format() {
        let connections = vec![
            Connection {
                from: "KC1JMH-15".to_string(),
                to: "KS1R-15".to_string(),
                port: Some(1),
                quality: 200,
                intermittent: false,
            },
            Connection {
                from: "KS1R-15".to_string(),
                to: "KC1JMH-15".to_string(),
                port: None,
                quality: 180,
                intermittent: true,
            },
        ];

        let csv = format_connections_csv(&connections);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "from,to,port,quality,intermittent");
        assert_eq!(lines[1], "KC1JMH-15,KS1R-15,1,200,false");
        assert_eq!(lines[2], "KS1R-15,KC1JMH-15,,180,true");
    }

    #[test]
    fn test_write_empty_topology() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("connections.csv");
        write_connections_csv(&TopologyStore::new(), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), HEADER);
    }
}
