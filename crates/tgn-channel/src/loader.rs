//! CSV antenna layout loader.
//!
//! # CSV format
//!
//! One row per node.  Spacing is in carrier wavelengths.
//!
//! ```csv
//! node_id,antenna_count,antenna_spacing_wavelengths
//! 0,2,0.5
//! 1,4,0.5
//! 7,1,0.5
//! ```
//!
//! Rows are returned in file order.  A node listed twice is an error.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tgn_core::NodeId;

use crate::{AntennaArrayConfig, ChannelError, ChannelResult};

#[derive(Deserialize)]
struct AntennaRecord {
    node_id:                     u32,
    antenna_count:               usize,
    antenna_spacing_wavelengths: f64,
}

/// Load per-node antenna layouts from a CSV file.
pub fn load_antenna_configs_csv(path: &Path) -> ChannelResult<Vec<(NodeId, AntennaArrayConfig)>> {
    let file = std::fs::File::open(path).map_err(ChannelError::Io)?;
    load_antenna_configs_reader(file)
}

/// Like [`load_antenna_configs_csv`] but accepts any `Read` source.
pub fn load_antenna_configs_reader<R: Read>(reader: R) -> ChannelResult<Vec<(NodeId, AntennaArrayConfig)>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut seen = HashSet::new();
    let mut configs = Vec::new();

    for (row, result) in csv_reader.deserialize::<AntennaRecord>().enumerate() {
        let record = result.map_err(|e| ChannelError::Parse(e.to_string()))?;
        let node = NodeId(record.node_id);
        if !seen.insert(node) {
            return Err(ChannelError::Parse(format!("row {}: {node} listed twice", row + 1)));
        }

        let config = AntennaArrayConfig::new(record.antenna_count, record.antenna_spacing_wavelengths);
        config
            .to_array()
            .map_err(|e| ChannelError::Parse(format!("row {}: {e}", row + 1)))?;
        configs.push((node, config));
    }

    Ok(configs)
}
