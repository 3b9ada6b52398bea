//! Tag-based hex content (100m scale) and connected clusters

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::hex::HexCoord;

/// Number of hexes in a validated cluster
pub const CLUSTER_SIZE: usize = 20;

/// Maximum number of tags on one hex
pub const MAX_TAGS: usize = 10;

/// Border classification of one hex edge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Tunnel,
    Road,
    Water,
    Wilderness,
    Entrance,
    Blocked,
}

impl EdgeType {
    pub fn all() -> &'static [EdgeType] {
        &[
            EdgeType::Tunnel,
            EdgeType::Road,
            EdgeType::Water,
            EdgeType::Wilderness,
            EdgeType::Entrance,
            EdgeType::Blocked,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            EdgeType::Tunnel => "tunnel",
            EdgeType::Road => "road",
            EdgeType::Water => "water",
            EdgeType::Wilderness => "wilderness",
            EdgeType::Entrance => "entrance",
            EdgeType::Blocked => "blocked",
        }
    }

    /// Edge types that must be mirrored exactly by the neighbor
    pub fn must_match(&self) -> bool {
        matches!(self, EdgeType::Tunnel | EdgeType::Road | EdgeType::Water)
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        EdgeType::all()
            .iter()
            .copied()
            .find(|e| e.name() == lowered)
            .ok_or_else(|| s.to_string())
    }
}

/// Founding conditions biasing settlement hex generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FoundingContext {
    /// Season at founding: spring, summer, autumn, winter, deep_winter
    pub season: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub astronomical_event: Option<String>,
    /// Tags to bias toward
    #[serde(default)]
    pub bias_tags: Vec<String>,
    /// Tags that must not appear
    #[serde(default)]
    pub bias_against: Vec<String>,
    #[serde(default)]
    pub flavor: String,

    // Numeric modifiers, each in -1.0..=1.0
    #[serde(default)]
    pub defensive_weight: f32,
    #[serde(default)]
    pub underground_preference: f32,
    #[serde(default)]
    pub martial_culture: f32,
    #[serde(default)]
    pub secrecy_trait: bool,
    #[serde(default)]
    pub siege_mentality: bool,
}

impl FoundingContext {
    pub fn new(season: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            ..Default::default()
        }
    }

    pub fn with_bias_tags(mut self, tags: &[&str]) -> Self {
        self.bias_tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_bias_against(mut self, tags: &[&str]) -> Self {
        self.bias_against = tags.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// A single hex's content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggedHex {
    pub q: i32,
    pub r: i32,
    pub name: String,
    pub description: String,
    /// 1-10 tags from the tag vocabulary
    pub tags: Vec<String>,
    /// One edge per direction, clockwise from East
    pub edge_types: [EdgeType; 6],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founding_context: Option<FoundingContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founding_cluster_id: Option<u32>,
}

impl TaggedHex {
    pub fn new(
        coord: HexCoord,
        name: impl Into<String>,
        description: impl Into<String>,
        tags: &[&str],
        edge_types: [EdgeType; 6],
    ) -> Self {
        Self {
            q: coord.q,
            r: coord.r,
            name: name.into(),
            description: description.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            edge_types,
            founding_context: None,
            founding_cluster_id: None,
        }
    }

    pub fn coord(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn tag_set(&self) -> BTreeSet<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    /// Content contract: at least one tag, at most ten
    pub fn check_contract(&self) -> Result<(), String> {
        if self.tags.is_empty() {
            return Err("hex has no tags".to_string());
        }
        if self.tags.len() > MAX_TAGS {
            return Err(format!("hex has {} tags (max {})", self.tags.len(), MAX_TAGS));
        }
        Ok(())
    }
}

/// One adjacency inside a cluster: hex `a` touches hex `b` across `edge` of `a`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacency {
    pub a: usize,
    pub b: usize,
    pub edge: usize,
}

/// A connected region of tagged hexes
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HexCluster {
    pub hexes: Vec<TaggedHex>,
    pub adjacencies: Vec<Adjacency>,
}

impl HexCluster {
    pub fn hex_count(&self) -> usize {
        self.hexes.len()
    }

    /// True once the cluster reached the validated size
    pub fn is_complete(&self) -> bool {
        self.hexes.len() == CLUSTER_SIZE
    }

    pub fn hex_at(&self, coord: HexCoord) -> Option<&TaggedHex> {
        self.hexes.iter().find(|h| h.coord() == coord)
    }

    /// Relative offsets occupied by the cluster
    pub fn footprint(&self) -> Vec<(i32, i32)> {
        self.hexes.iter().map(|h| (h.q, h.r)).collect()
    }

    /// Forward-only adjacency list (`b > a`) computed from positions
    pub fn compute_adjacencies(hexes: &[TaggedHex]) -> Vec<Adjacency> {
        let index: std::collections::HashMap<HexCoord, usize> =
            hexes.iter().enumerate().map(|(i, h)| (h.coord(), i)).collect();

        let mut adjacencies = Vec::new();
        for (a, hex) in hexes.iter().enumerate() {
            for (edge, n) in hex.coord().neighbors() {
                if let Some(&b) = index.get(&n) {
                    if b > a {
                        adjacencies.push(Adjacency { a, b, edge });
                    }
                }
            }
        }
        adjacencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_at(q: i32, r: i32) -> TaggedHex {
        TaggedHex::new(
            HexCoord::new(q, r),
            "Test",
            "A test hex",
            &["surface"],
            [EdgeType::Wilderness; 6],
        )
    }

    #[test]
    fn test_edge_type_parse() {
        assert_eq!("Tunnel".parse::<EdgeType>().unwrap(), EdgeType::Tunnel);
        assert!("lava".parse::<EdgeType>().is_err());
        assert!(EdgeType::Road.must_match());
        assert!(!EdgeType::Entrance.must_match());
    }

    #[test]
    fn test_edge_array_rejects_wrong_length() {
        let json = r#"{"q":0,"r":0,"name":"x","description":"y","tags":["surface"],
            "edge_types":["road","road","road","road","road"]}"#;
        assert!(serde_json::from_str::<TaggedHex>(json).is_err());
    }

    #[test]
    fn test_forward_adjacencies() {
        let hexes = vec![hex_at(0, 0), hex_at(1, 0), hex_at(0, 1), hex_at(5, 5)];
        let adj = HexCluster::compute_adjacencies(&hexes);
        // (0,0)-(1,0), (0,0)-(0,1), (1,0)-(0,1)
        assert_eq!(adj.len(), 3);
        assert!(adj.iter().all(|a| a.b > a.a));
        assert!(adj.contains(&Adjacency { a: 0, b: 1, edge: 0 }));
        assert!(adj.contains(&Adjacency { a: 0, b: 2, edge: 5 }));
    }

    #[test]
    fn test_contract() {
        let mut h = hex_at(0, 0);
        assert!(h.check_contract().is_ok());
        h.tags.clear();
        assert!(h.check_contract().is_err());
    }
}
