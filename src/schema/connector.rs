//! Connector collections: routes, rivers and bands linking clusters

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::anchor::MinorCategory;
use super::terrain::{SpeciesFitness, Terrain};
use crate::hex::HexCoord;

/// Kind of geographic feature a connector represents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    // Water
    RiverHeadwaters,
    RiverUpper,
    RiverMiddle,
    RiverLower,
    RiverDelta,
    RiverFull,
    LakeShore,
    Coastline,
    // Mountains
    MountainRangeMajor,
    MountainRangeMinor,
    MountainSpur,
    Highland,
    // Forest
    ForestBandDense,
    ForestBandLight,
    AncientForest,
    ForestEdge,
    // Routes
    TradeRouteMajor,
    TradeRouteMinor,
    MilitaryRoad,
    PilgrimPath,
    MountainPass,
    // Transitions
    PlainsBand,
    MarshSystem,
    DesertEdge,
    TundraBand,
}

impl ConnectorType {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectorType::RiverHeadwaters => "river_headwaters",
            ConnectorType::RiverUpper => "river_upper",
            ConnectorType::RiverMiddle => "river_middle",
            ConnectorType::RiverLower => "river_lower",
            ConnectorType::RiverDelta => "river_delta",
            ConnectorType::RiverFull => "river_full",
            ConnectorType::LakeShore => "lake_shore",
            ConnectorType::Coastline => "coastline",
            ConnectorType::MountainRangeMajor => "mountain_range_major",
            ConnectorType::MountainRangeMinor => "mountain_range_minor",
            ConnectorType::MountainSpur => "mountain_spur",
            ConnectorType::Highland => "highland",
            ConnectorType::ForestBandDense => "forest_band_dense",
            ConnectorType::ForestBandLight => "forest_band_light",
            ConnectorType::AncientForest => "ancient_forest",
            ConnectorType::ForestEdge => "forest_edge",
            ConnectorType::TradeRouteMajor => "trade_route_major",
            ConnectorType::TradeRouteMinor => "trade_route_minor",
            ConnectorType::MilitaryRoad => "military_road",
            ConnectorType::PilgrimPath => "pilgrim_path",
            ConnectorType::MountainPass => "mountain_pass",
            ConnectorType::PlainsBand => "plains_band",
            ConnectorType::MarshSystem => "marsh_system",
            ConnectorType::DesertEdge => "desert_edge",
            ConnectorType::TundraBand => "tundra_band",
        }
    }

    pub fn is_river(&self) -> bool {
        matches!(
            self,
            ConnectorType::RiverHeadwaters
                | ConnectorType::RiverUpper
                | ConnectorType::RiverMiddle
                | ConnectorType::RiverLower
                | ConnectorType::RiverDelta
                | ConnectorType::RiverFull
        )
    }

    pub fn is_trade_route(&self) -> bool {
        matches!(self, ConnectorType::TradeRouteMajor | ConnectorType::TradeRouteMinor)
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where other assets attach to a connector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub hex_index: usize,
    /// "start" or "end"
    pub direction: String,
    pub elevation: f32,
    pub terrain: Terrain,
    pub is_terminus: bool,
}

/// Candidate position for a small point of interest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinorAnchorSlot {
    pub slot_id: String,
    pub hex_index: usize,
    pub compatible_categories: Vec<MinorCategory>,
    pub required: bool,
    pub narrative_context: String,
}

/// A sub-range of a connector allowed to stretch or compress
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElasticSegment {
    pub start_hex: usize,
    pub end_hex: usize,
    pub base_length: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Terrain of hexes inserted when stretching
    pub stretch_terrain: Terrain,
}

/// A single hex within a connector
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectorHex {
    pub index: usize,
    /// World position; `None` for hexes inserted by a stretch
    pub coord: Option<HexCoord>,
    pub terrain: Terrain,
    pub elevation: f32,
    pub moisture: f32,
    pub temperature: f32,
    pub species_fitness: SpeciesFitness,
    pub connects_to: Vec<usize>,
    pub is_entry_point: bool,
    pub is_slot: bool,
}

/// A generated connector between two clusters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectorCollection {
    pub id: String,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
    pub hexes: Vec<ConnectorHex>,
    pub base_length: usize,
    pub entry_points: Vec<EntryPoint>,
    pub internal_graph: BTreeMap<usize, Vec<usize>>,
    pub elastic_segments: Vec<ElasticSegment>,
    pub minor_slots: Vec<MinorAnchorSlot>,
}

impl ConnectorCollection {
    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }

    pub fn slot(&self, slot_id: &str) -> Option<&MinorAnchorSlot> {
        self.minor_slots.iter().find(|s| s.slot_id == slot_id)
    }

    /// World coordinates of every anchored hex, in path order
    pub fn coords(&self) -> impl Iterator<Item = HexCoord> + '_ {
        self.hexes.iter().filter_map(|h| h.coord)
    }
}
