//! Edge-list ingestion.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::network::{Network, NodeId};

/// Load a network from a CSV edge list.
///
/// The first row is a header and is discarded. Every following row is
/// `origin,destiny,weight`: two non-negative integer node ids and a
/// floating-point weight. Malformed rows are skipped with a warning;
/// the load continues. Nodes are created implicitly by their edges.
///
/// Fails only when the file itself cannot be opened or read.
pub fn load_network_csv(path: impl AsRef<Path>) -> Result<Network> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let reader = BufReader::new(file);

    let mut net = Network::new();
    let mut rows = reader.lines();
    let _header = rows.next();

    for row in rows {
        let row = row.map_err(|e| Error::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        match parse_edge_row(&row) {
            Some((origin, destiny, weight)) => {
                let _ = net.add_edge(origin, destiny, weight);
            }
            None => {
                if !row.trim().is_empty() {
                    tracing::warn!(row = %row, "skipping malformed edge row");
                }
            }
        }
    }
    Ok(net)
}

/// Parse one `origin,destiny,weight` row. `None` for anything that is
/// not exactly three fields with the right types and a non-negative
/// weight.
fn parse_edge_row(row: &str) -> Option<(NodeId, NodeId, f64)> {
    let mut fields = row.split(',');
    let origin: NodeId = fields.next()?.trim().parse().ok()?;
    let destiny: NodeId = fields.next()?.trim().parse().ok()?;
    let weight: f64 = fields.next()?.trim().parse().ok()?;
    if fields.next().is_some() || weight < 0.0 {
        return None;
    }
    Some((origin, destiny, weight))
}
