//! World seed: the recipe an assembly run consumes

use serde::{Deserialize, Serialize};

use super::connector::{ConnectorType, ElasticSegment};
use super::tagged::FoundingContext;

/// Whether a placement grows generated content or just reserves a footprint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    /// Content grown hex by hex from a seed hex
    #[default]
    Settlement,
    /// Fixed minimal footprint, no content
    Landmark,
}

/// A cluster to place in the world
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterPlacement {
    pub template_id: String,
    pub instance_id: String,
    #[serde(default)]
    pub kind: ClusterKind,
    /// Overrides the generation default (20)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_size: Option<usize>,
    /// Tags for the origin hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founding_context: Option<FoundingContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_hint: Option<String>,
}

impl ClusterPlacement {
    pub fn settlement(template_id: &str, instance_id: &str) -> Self {
        Self {
            template_id: template_id.to_string(),
            instance_id: instance_id.to_string(),
            kind: ClusterKind::Settlement,
            cluster_size: None,
            seed_tags: None,
            founding_context: None,
            region_hint: None,
        }
    }

    pub fn landmark(template_id: &str, instance_id: &str) -> Self {
        Self {
            kind: ClusterKind::Landmark,
            ..Self::settlement(template_id, instance_id)
        }
    }
}

/// A connector to generate between two placed clusters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectorAssignment {
    pub collection_id: String,
    pub instance_id: String,
    pub connector_type: ConnectorType,
    pub start_cluster: Option<String>,
    pub end_cluster: Option<String>,
    #[serde(default)]
    pub elastic_segments: Vec<ElasticSegment>,
}

impl ConnectorAssignment {
    pub fn between(instance_id: &str, connector_type: ConnectorType, start: &str, end: &str) -> Self {
        Self {
            collection_id: connector_type.name().to_string(),
            instance_id: instance_id.to_string(),
            connector_type,
            start_cluster: Some(start.to_string()),
            end_cluster: Some(end.to_string()),
            elastic_segments: Vec::new(),
        }
    }
}

/// Additional placement guidance, e.g. `region:north`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutHint {
    pub cluster_id: String,
    #[serde(default)]
    pub hints: Vec<String>,
}

/// A recipe for assembling a world
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSeed {
    pub seed_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub clusters: Vec<ClusterPlacement>,
    #[serde(default)]
    pub connectors: Vec<ConnectorAssignment>,
    #[serde(default)]
    pub layout_hints: Vec<LayoutHint>,
    #[serde(default = "default_world_radius")]
    pub world_radius: i32,
}

fn default_world_radius() -> i32 {
    150
}

impl WorldSeed {
    pub fn new(seed_id: u64, world_radius: i32) -> Self {
        Self {
            seed_id,
            name: None,
            clusters: Vec::new(),
            connectors: Vec::new(),
            layout_hints: Vec::new(),
            world_radius,
        }
    }

    /// Small two-settlement world used by the CLI when no seed file is given
    pub fn demo(seed_id: u64) -> Self {
        let mut seed = WorldSeed::new(seed_id, 24);
        seed.name = Some("Demo Vale".to_string());

        let mut hold = ClusterPlacement::settlement("dwarf_hold_major", "ironhold");
        hold.seed_tags = Some(vec!["underground".into(), "dwarf".into(), "military".into()]);
        hold.founding_context = Some(
            FoundingContext::new("winter")
                .with_bias_tags(&["military", "defensive"])
                .with_bias_against(&["wild"]),
        );
        seed.clusters.push(hold);
        seed.clusters.push(ClusterPlacement::settlement("human_market_town", "brightford"));
        seed.clusters.push(ClusterPlacement::landmark("standing_stones", "old_circle"));

        seed.connectors.push(ConnectorAssignment::between(
            "ironhold_brightford_road",
            ConnectorType::TradeRouteMajor,
            "ironhold",
            "brightford",
        ));
        seed.connectors.push(ConnectorAssignment::between(
            "brightford_circle_path",
            ConnectorType::PilgrimPath,
            "brightford",
            "old_circle",
        ));
        seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_defaults_from_json() {
        let json = r#"{"seed_id": 42, "clusters": [{"template_id": "t", "instance_id": "a"}]}"#;
        let seed: WorldSeed = serde_json::from_str(json).unwrap();
        assert_eq!(seed.world_radius, 150);
        assert_eq!(seed.clusters[0].kind, ClusterKind::Settlement);
        assert!(seed.connectors.is_empty());
    }

    #[test]
    fn test_demo_seed_references_known_clusters() {
        let seed = WorldSeed::demo(1);
        for conn in &seed.connectors {
            for end in [&conn.start_cluster, &conn.end_cluster] {
                let id = end.as_deref().unwrap();
                assert!(seed.clusters.iter().any(|c| c.instance_id == id));
            }
        }
    }
}
