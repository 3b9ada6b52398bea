//! Assembled world output: the sparse hex map and its metadata

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::anchor::MinorAnchor;
use super::connector::ConnectorCollection;
use super::tagged::{EdgeType, HexCluster, TaggedHex};
use super::terrain::{SpeciesFitness, Terrain};
use crate::hex::HexCoord;

/// A single hex in the assembled world
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldHex {
    pub coord: HexCoord,
    pub terrain: Terrain,
    pub elevation: f32,
    pub moisture: f32,
    pub temperature: f32,
    pub species_fitness: SpeciesFitness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<String>,

    // Tagged content, present on cluster hexes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_types: Option<[EdgeType; 6]>,
}

impl WorldHex {
    /// Bare hex with neutral fitness and no content
    pub fn plain(coord: HexCoord, terrain: Terrain, elevation: f32, moisture: f32) -> Self {
        Self {
            coord,
            terrain,
            elevation,
            moisture,
            temperature: 15.0,
            species_fitness: SpeciesFitness::for_terrain(terrain),
            cluster_id: None,
            connector_id: None,
            name: None,
            description: None,
            tags: Vec::new(),
            edge_types: None,
        }
    }

    /// World hex carrying a cluster's tagged content at an absolute position
    pub fn from_tagged(hex: &TaggedHex, coord: HexCoord, terrain: Terrain, elevation: f32, cluster_id: &str) -> Self {
        Self {
            coord,
            terrain,
            elevation,
            moisture: 0.5,
            temperature: 15.0,
            species_fitness: SpeciesFitness::for_terrain(terrain),
            cluster_id: Some(cluster_id.to_string()),
            connector_id: None,
            name: Some(hex.name.clone()),
            description: Some(hex.description.clone()),
            tags: hex.tags.clone(),
            edge_types: Some(hex.edge_types),
        }
    }

    pub fn is_filler(&self) -> bool {
        self.cluster_id.is_none() && self.connector_id.is_none()
    }
}

/// A placed cluster footprint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssembledCluster {
    pub template_id: String,
    pub instance_id: String,
    /// slot id -> component ids
    #[serde(default)]
    pub components: BTreeMap<String, Vec<String>>,
    /// component id -> relative offset
    #[serde(default)]
    pub layout: BTreeMap<String, (i32, i32)>,
    /// Relative offsets the cluster occupies
    pub footprint: Vec<(i32, i32)>,
    /// Generated hex content, when the cluster is a settlement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<HexCluster>,
}

impl AssembledCluster {
    /// Footprint without generated content
    pub fn with_footprint(template_id: &str, instance_id: &str, footprint: Vec<(i32, i32)>) -> Self {
        Self {
            template_id: template_id.to_string(),
            instance_id: instance_id.to_string(),
            components: BTreeMap::new(),
            layout: BTreeMap::new(),
            footprint,
            content: None,
        }
    }

    /// Footprint taken from a generated cluster, one component per hex
    pub fn from_cluster(template_id: &str, instance_id: &str, cluster: HexCluster) -> Self {
        let mut layout = BTreeMap::new();
        let mut ids = Vec::with_capacity(cluster.hexes.len());
        for (i, hex) in cluster.hexes.iter().enumerate() {
            let id = format!("{}_hex_{:02}", instance_id, i);
            layout.insert(id.clone(), (hex.q, hex.r));
            ids.push(id);
        }
        let mut components = BTreeMap::new();
        components.insert("hexes".to_string(), ids);

        Self {
            template_id: template_id.to_string(),
            instance_id: instance_id.to_string(),
            components,
            layout,
            footprint: cluster.footprint(),
            content: Some(cluster),
        }
    }

    /// Component id at a relative offset
    pub fn component_at(&self, offset: (i32, i32)) -> Option<&str> {
        self.layout
            .iter()
            .find(|(_, &o)| o == offset)
            .map(|(id, _)| id.as_str())
    }

    /// Absolute cells when the cluster origin sits at `position`
    pub fn cells_at(&self, position: HexCoord) -> impl Iterator<Item = HexCoord> + '_ {
        self.footprint.iter().map(move |&(dq, dr)| position.offset(dq, dr))
    }
}

/// The global sparse hex map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HexMap {
    pub seed_id: u64,
    pub world_radius: i32,
    /// Serialized as an object keyed by `"q,r"`
    #[serde(with = "keyed_hexes")]
    pub hexes: BTreeMap<HexCoord, WorldHex>,
    #[serde(default)]
    pub clusters: BTreeMap<String, AssembledCluster>,
    #[serde(default)]
    pub cluster_positions: BTreeMap<String, HexCoord>,
}

impl HexMap {
    pub fn new(seed_id: u64, world_radius: i32) -> Self {
        Self {
            seed_id,
            world_radius,
            hexes: BTreeMap::new(),
            clusters: BTreeMap::new(),
            cluster_positions: BTreeMap::new(),
        }
    }

    /// Insert unless the cell is already taken. First writer wins.
    pub fn insert(&mut self, hex: WorldHex) -> bool {
        match self.hexes.entry(hex.coord) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(hex);
                true
            }
        }
    }

    pub fn get(&self, coord: HexCoord) -> Option<&WorldHex> {
        self.hexes.get(&coord)
    }

    pub fn contains(&self, coord: HexCoord) -> bool {
        self.hexes.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.hexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }

    /// Lookup by persisted `"q,r"` key
    pub fn get_by_key(&self, key: &str) -> Option<&WorldHex> {
        HexCoord::from_key(key).ok().and_then(|c| self.hexes.get(&c))
    }
}

/// Serde adapter writing the hex dictionary with `"q,r"` string keys
mod keyed_hexes {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::WorldHex;
    use crate::hex::HexCoord;

    pub fn serialize<S: Serializer>(
        hexes: &BTreeMap<HexCoord, WorldHex>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let keyed: BTreeMap<String, &WorldHex> = hexes.iter().map(|(c, h)| (c.key(), h)).collect();
        keyed.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<HexCoord, WorldHex>, D::Error> {
        let keyed = BTreeMap::<String, WorldHex>::deserialize(deserializer)?;
        keyed
            .into_iter()
            .map(|(key, hex)| {
                let coord = HexCoord::from_key(&key).map_err(D::Error::custom)?;
                Ok((coord, hex))
            })
            .collect()
    }
}

/// Counts and timings from one assembly run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyStats {
    pub generation_time_ms: u64,
    pub cluster_time_ms: u64,
    pub layout_time_ms: u64,
    pub connector_time_ms: u64,
    pub filler_time_ms: u64,
    pub total_hexes: usize,
    pub total_clusters: usize,
    pub total_connectors: usize,
    pub total_anchors: usize,
    pub cluster_hexes: usize,
    pub connector_hexes: usize,
    pub filler_hexes: usize,
    /// Units (clusters, connectors) that failed and were skipped or degraded
    pub skipped_units: usize,
}

/// Complete assembled world with metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssembledWorld {
    pub seed_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub hex_map: HexMap,
    pub connectors: Vec<ConnectorCollection>,
    /// connector id -> anchors placed along it
    pub anchors: BTreeMap<String, Vec<MinorAnchor>>,
    pub stats: AssemblyStats,
    /// RFC 3339 timestamp
    pub generated_at: String,
    /// One line per unit of work that failed
    pub failures: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_writer_wins() {
        let mut map = HexMap::new(1, 5);
        let c = HexCoord::new(1, 1);
        assert!(map.insert(WorldHex::plain(c, Terrain::Forest, 100.0, 0.5)));
        assert!(!map.insert(WorldHex::plain(c, Terrain::DeepWater, 0.0, 1.0)));
        assert_eq!(map.get(c).unwrap().terrain, Terrain::Forest);
    }

    #[test]
    fn test_hexes_serialize_with_string_keys() {
        let mut map = HexMap::new(7, 2);
        map.insert(WorldHex::plain(HexCoord::new(-1, 2), Terrain::Plains, 150.0, 0.5));

        let value = serde_json::to_value(&map).unwrap();
        assert!(value["hexes"].get("-1,2").is_some());

        let back: HexMap = serde_json::from_value(value).unwrap();
        assert_eq!(back, map);
        assert!(back.get_by_key("-1,2").is_some());
    }

    #[test]
    fn test_cluster_footprint_cells() {
        let c = AssembledCluster::with_footprint("t", "i", vec![(0, 0), (1, 0), (0, 1)]);
        let cells: Vec<_> = c.cells_at(HexCoord::new(10, -3)).collect();
        assert_eq!(cells, vec![HexCoord::new(10, -3), HexCoord::new(11, -3), HexCoord::new(10, -2)]);
    }
}
