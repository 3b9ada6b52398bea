//! Hex-map persistence and structural validation
//!
//! The persisted file is pretty JSON with the hex dictionary keyed by `"q,r"`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::hex::{opposite_edge, HexCoord};
use crate::schema::{AssembledWorld, EdgeType, HexMap};

/// Write a hex map as pretty JSON
pub fn save_hex_map(map: &HexMap, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, map)?;
    writer.flush()?;
    info!(path = %path.display(), hexes = map.len(), "hex map saved");
    Ok(())
}

pub fn load_hex_map(path: impl AsRef<Path>) -> Result<HexMap> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write the whole assembled world, connectors and anchors included
pub fn save_world(world: &AssembledWorld, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, world)?;
    writer.flush()?;
    Ok(())
}

pub fn load_world(path: impl AsRef<Path>) -> Result<AssembledWorld> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

/// Must-match edge pair that disagrees across a shared border
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMismatch {
    pub a: HexCoord,
    pub b: HexCoord,
    /// Edge of `a` facing `b`
    pub edge: usize,
    pub a_edge: EdgeType,
    pub b_edge: EdgeType,
}

/// Findings of [`validate_hex_map`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapReport {
    /// Cells in the world disc
    pub expected: usize,
    /// Disc cells with no hex
    pub missing: Vec<HexCoord>,
    /// Hexes outside the disc
    pub out_of_bounds: Vec<HexCoord>,
    pub edge_mismatches: Vec<EdgeMismatch>,
}

impl MapReport {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.out_of_bounds.is_empty() && self.edge_mismatches.is_empty()
    }
}

/// Check coverage, bounds and edge symmetry
///
/// Edge symmetry is checked between neighbours of the same cluster; borders
/// between clusters, connectors and filler carry no edge contract.
pub fn validate_hex_map(map: &HexMap) -> MapReport {
    let radius = map.world_radius;
    let mut report = MapReport {
        expected: crate::hex::disc_size(radius),
        ..MapReport::default()
    };

    report.missing = HexCoord::disc(radius).filter(|c| !map.contains(*c)).collect();
    report.out_of_bounds = map.hexes.keys().copied().filter(|c| !c.in_radius(radius)).collect();

    for (coord, hex) in &map.hexes {
        let (Some(edges), Some(cluster)) = (&hex.edge_types, &hex.cluster_id) else {
            continue;
        };
        for (edge, n) in coord.neighbors() {
            // each pair once
            if n <= *coord {
                continue;
            }
            let Some(other) = map.get(n) else {
                continue;
            };
            let Some(other_edges) = &other.edge_types else {
                continue;
            };
            if other.cluster_id.as_ref() != Some(cluster) {
                continue;
            }
            let (a_edge, b_edge) = (edges[edge], other_edges[opposite_edge(edge)]);
            if (a_edge.must_match() || b_edge.must_match()) && a_edge != b_edge {
                report.edge_mismatches.push(EdgeMismatch {
                    a: *coord,
                    b: n,
                    edge,
                    a_edge,
                    b_edge,
                });
            }
        }
    }

    report
}
