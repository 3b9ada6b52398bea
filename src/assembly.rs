//! World assembly pipeline
//!
//! clusters -> layout -> cluster hexes -> connectors -> anchors -> filler.
//! Every stage draws from its own RNG stream. A layout failure aborts the
//! run; any other failing unit is logged, recorded and skipped.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::adjacency::AdjacencyValidator;
use crate::anchors::{AnchorPlacer, RuleBasedAnchors};
use crate::cluster::{ClusterGenerator, ClusterRequest};
use crate::config::TagConfig;
use crate::connector::{ConnectorGenerator, ConnectorRequest};
use crate::content::{ContentGenerator, ProceduralContent};
use crate::error::{Result, WorldgenError};
use crate::filler::FillerGenerator;
use crate::hex::HexCoord;
use crate::layout::{occupied_cells, LayoutSolver};
use crate::params::GenerationParams;
use crate::schema::{
    AssembledCluster, AssembledWorld, AssemblyStats, ClusterKind, ClusterPlacement, ConnectorAssignment,
    ConnectorCollection, HexMap, LayoutHint, MinorAnchor, Terrain, TerrainTag, WorldHex, WorldSeed,
};
use crate::seeds::WorldSeeds;

/// Runs the whole pipeline with injected collaborators
pub struct WorldAssembler {
    config: Arc<TagConfig>,
    validator: AdjacencyValidator,
    content: Box<dyn ContentGenerator>,
    anchors: Box<dyn AnchorPlacer>,
    params: GenerationParams,
}

impl WorldAssembler {
    pub fn new(
        config: Arc<TagConfig>,
        content: Box<dyn ContentGenerator>,
        anchors: Box<dyn AnchorPlacer>,
        params: GenerationParams,
    ) -> Self {
        Self {
            validator: AdjacencyValidator::new(config.clone()),
            config,
            content,
            anchors,
            params,
        }
    }

    /// Procedural content and rule-based anchors; needs no network
    pub fn offline(config: Arc<TagConfig>, params: GenerationParams) -> Self {
        let content = Box::new(ProceduralContent::new(config.clone()));
        let anchors = Box::new(RuleBasedAnchors::new(params.max_anchors_per_connector));
        Self::new(config, content, anchors, params)
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Assemble with stage seeds derived from `seed.seed_id`
    pub fn assemble(&self, seed: &WorldSeed) -> Result<AssembledWorld> {
        self.assemble_with_seeds(seed, &WorldSeeds::from_master(seed.seed_id))
    }

    pub fn assemble_with_seeds(&self, seed: &WorldSeed, seeds: &WorldSeeds) -> Result<AssembledWorld> {
        let started = Instant::now();
        let mut stats = AssemblyStats::default();
        let mut failures = Vec::new();
        let radius = seed.world_radius;
        if radius < 0 {
            return Err(WorldgenError::InvalidRadius(radius));
        }

        info!(
            seed = seed.seed_id,
            radius,
            clusters = seed.clusters.len(),
            connectors = seed.connectors.len(),
            content = self.content.name(),
            "assembling world"
        );

        // 1. Clusters
        let t = Instant::now();
        let mut rng = seeds.cluster_rng();
        let clusters: Vec<AssembledCluster> = seed
            .clusters
            .iter()
            .enumerate()
            .map(|(i, placement)| self.build_cluster(placement, i as u32, &mut rng, &mut failures))
            .collect();
        stats.cluster_time_ms = elapsed_ms(t);

        // 2. Layout
        let t = Instant::now();
        let hints = layout_hints(seed);
        let positions = LayoutSolver::new(self.params.layout_attempts).solve(&clusters, &hints, radius, &mut seeds.layout_rng())?;
        stats.layout_time_ms = elapsed_ms(t);

        // 3. Cluster hexes
        let mut map = HexMap::new(seed.seed_id, radius);
        for cluster in clusters {
            if let Some(&position) = positions.get(&cluster.instance_id) {
                stats.cluster_hexes += self.place_cluster(&mut map, &cluster, position);
            }
            map.clusters.insert(cluster.instance_id.clone(), cluster);
        }
        map.cluster_positions = positions;
        stats.total_clusters = map.clusters.len();

        // 4. Connectors
        let t = Instant::now();
        let mut rng = seeds.connector_rng();
        let mut connectors = Vec::new();
        for assignment in &seed.connectors {
            match self.build_connector(&map, assignment, &mut rng) {
                Some(collection) => {
                    stats.connector_hexes += place_connector(&mut map, &collection, &assignment.instance_id);
                    connectors.push(collection);
                }
                None => {
                    warn!(connector = %assignment.instance_id, "connector endpoints not placed, skipping");
                    failures.push(format!("connector {}: endpoint cluster not placed", assignment.instance_id));
                    stats.skipped_units += 1;
                }
            }
        }
        stats.connector_time_ms = elapsed_ms(t);

        // 5. Anchors
        let mut rng = seeds.anchor_rng();
        let mut anchors: BTreeMap<String, Vec<MinorAnchor>> = BTreeMap::new();
        for collection in &connectors {
            let placed = self.place_anchors(collection, &mut rng);
            stats.total_anchors += placed.len();
            anchors.insert(collection.id.clone(), placed);
        }

        // 6. Filler
        let t = Instant::now();
        let filler = FillerGenerator::new(self.config.clone(), self.params.filler_max_iterations);
        let report = filler.fill(&mut map, &mut seeds.filler_rng());
        stats.filler_hexes = report.total();
        stats.filler_time_ms = elapsed_ms(t);

        stats.total_connectors = connectors.len();
        stats.total_hexes = map.len();
        stats.generation_time_ms = elapsed_ms(started);

        info!(
            hexes = stats.total_hexes,
            cluster_hexes = stats.cluster_hexes,
            connector_hexes = stats.connector_hexes,
            filler_hexes = stats.filler_hexes,
            anchors = stats.total_anchors,
            failures = failures.len(),
            ms = stats.generation_time_ms,
            "world assembled"
        );

        Ok(AssembledWorld {
            seed_id: seed.seed_id,
            name: seed.name.clone(),
            hex_map: map,
            connectors,
            anchors,
            stats,
            generated_at: chrono::Utc::now().to_rfc3339(),
            failures,
        })
    }

    fn build_cluster(
        &self,
        placement: &ClusterPlacement,
        index: u32,
        rng: &mut ChaCha8Rng,
        failures: &mut Vec<String>,
    ) -> AssembledCluster {
        match placement.kind {
            ClusterKind::Landmark => {
                AssembledCluster::with_footprint(&placement.template_id, &placement.instance_id, vec![(0, 0)])
            }
            ClusterKind::Settlement => {
                let size = placement.cluster_size.unwrap_or(self.params.cluster_size);
                let request = ClusterRequest {
                    theme: &placement.template_id,
                    size,
                    seed_tags: placement.seed_tags.as_deref(),
                    founding: placement.founding_context.as_ref(),
                    founding_cluster_id: Some(index),
                };
                let generator = ClusterGenerator::new(self.content.as_ref(), &self.validator, &self.params);
                let cluster = generator.generate(&request, rng);
                if cluster.hex_count() < size {
                    failures.push(format!(
                        "cluster {}: grew {} of {} hexes",
                        placement.instance_id,
                        cluster.hex_count(),
                        size
                    ));
                }
                AssembledCluster::from_cluster(&placement.template_id, &placement.instance_id, cluster)
            }
        }
    }

    /// Write a placed cluster's hexes; returns how many were new
    fn place_cluster(&self, map: &mut HexMap, cluster: &AssembledCluster, position: HexCoord) -> usize {
        let id = cluster.instance_id.as_str();
        let mut placed = 0;

        match &cluster.content {
            Some(content) => {
                for hex in &content.hexes {
                    let coord = position.offset(hex.q, hex.r);
                    let tag = self.config.terrain_tag_of(&hex.tags).unwrap_or(TerrainTag::Surface);
                    let (lo, hi) = self.config.profile(tag).elevation;
                    let world = WorldHex::from_tagged(hex, coord, tag.terrain(), (lo + hi) / 2.0, id);
                    if map.insert(world) {
                        placed += 1;
                    }
                }
            }
            None => {
                for coord in cluster.cells_at(position) {
                    let mut world = WorldHex::plain(coord, Terrain::Plains, 150.0, 0.5);
                    world.cluster_id = Some(id.to_string());
                    world.name = Some(title(&cluster.template_id));
                    world.tags = vec![TerrainTag::Surface.name().to_string()];
                    if map.insert(world) {
                        placed += 1;
                    }
                }
            }
        }
        placed
    }

    fn build_connector(
        &self,
        map: &HexMap,
        assignment: &ConnectorAssignment,
        rng: &mut ChaCha8Rng,
    ) -> Option<ConnectorCollection> {
        let start_id = assignment.start_cluster.as_deref()?;
        let end_id = assignment.end_cluster.as_deref()?;
        let start = *map.cluster_positions.get(start_id)?;
        let end = *map.cluster_positions.get(end_id)?;

        // The path may run through its own endpoints' footprints
        let mut avoid = occupied_cells(map.clusters.values(), &map.cluster_positions);
        for (id, position) in [(start_id, start), (end_id, end)] {
            if let Some(cluster) = map.clusters.get(id) {
                for cell in cluster.cells_at(position) {
                    avoid.remove(&cell);
                }
            }
        }

        let generator = ConnectorGenerator::from_params(&self.params).with_radius(map.world_radius);
        let request = ConnectorRequest {
            id: &assignment.instance_id,
            connector_type: assignment.connector_type,
            start,
            end,
            avoid: &avoid,
            elastic_segments: &assignment.elastic_segments,
        };
        Some(generator.generate(&request, rng))
    }

    /// Ask the placer, keeping only anchors whose slot exists
    fn place_anchors(&self, connector: &ConnectorCollection, rng: &mut ChaCha8Rng) -> Vec<MinorAnchor> {
        let mut placed = self.anchors.place(connector, rng);
        let before = placed.len();
        placed.retain(|a| connector.slot(&a.slot_id).is_some());
        if placed.len() < before {
            warn!(
                connector = %connector.id,
                dropped = before - placed.len(),
                "ignoring anchors for unknown slots"
            );
        }
        placed
    }
}

/// Write anchored in-bounds connector hexes; returns how many were new
fn place_connector(map: &mut HexMap, collection: &ConnectorCollection, id: &str) -> usize {
    let mut placed = 0;
    for chex in &collection.hexes {
        let Some(coord) = chex.coord else {
            continue;
        };
        if !coord.in_radius(map.world_radius) {
            continue;
        }
        let mut world = WorldHex::plain(coord, chex.terrain, chex.elevation, chex.moisture);
        world.temperature = chex.temperature;
        world.species_fitness = chex.species_fitness;
        world.connector_id = Some(id.to_string());
        if map.insert(world) {
            placed += 1;
        }
    }
    placed
}

/// Seed hints plus each placement's region hint
fn layout_hints(seed: &WorldSeed) -> Vec<LayoutHint> {
    let mut hints = seed.layout_hints.clone();
    for placement in &seed.clusters {
        if let Some(region) = &placement.region_hint {
            let hint = if region.starts_with("region:") {
                region.clone()
            } else {
                format!("region:{}", region)
            };
            hints.push(LayoutHint {
                cluster_id: placement.instance_id.clone(),
                hints: vec![hint],
            });
        }
    }
    hints
}

fn title(template_id: &str) -> String {
    template_id
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContentError, WorldgenError};
    use crate::content::HexRequest;
    use crate::schema::{ConnectorType, TaggedHex};

    fn assembler() -> WorldAssembler {
        WorldAssembler::offline(Arc::new(TagConfig::builtin().unwrap()), GenerationParams::default())
    }

    #[test]
    fn test_demo_world_assembles() {
        let world = assembler().assemble(&WorldSeed::demo(42)).unwrap();
        let map = &world.hex_map;

        assert_eq!(map.len(), crate::hex::disc_size(24));
        assert_eq!(map.cluster_positions.len(), 3);
        assert_eq!(world.connectors.len(), 2);
        assert_eq!(world.stats.total_hexes, map.len());
        assert_eq!(
            world.stats.cluster_hexes + world.stats.connector_hexes + world.stats.filler_hexes,
            map.len()
        );
        assert!(map.hexes.values().any(|h| h.cluster_id.as_deref() == Some("ironhold")));
        assert!(map.hexes.values().any(|h| h.connector_id.is_some()));
    }

    #[test]
    fn test_region_hint_from_placement() {
        let mut seed = WorldSeed::new(3, 30);
        let mut north = ClusterPlacement::landmark("watch_stone", "north_stone");
        north.region_hint = Some("north".to_string());
        seed.clusters.push(north);

        let world = assembler().assemble(&seed).unwrap();
        let pos = world.hex_map.cluster_positions["north_stone"];
        assert!(crate::layout::Region::North.contains(pos, 30));
    }

    #[test]
    fn test_unknown_connector_endpoint_skipped() {
        let mut seed = WorldSeed::new(5, 12);
        seed.clusters.push(ClusterPlacement::landmark("cairn", "a"));
        seed.connectors
            .push(ConnectorAssignment::between("a_to_nowhere", ConnectorType::PilgrimPath, "a", "nowhere"));

        let world = assembler().assemble(&seed).unwrap();
        assert!(world.connectors.is_empty());
        assert_eq!(world.stats.skipped_units, 1);
        assert_eq!(world.failures.len(), 1);
        assert_eq!(world.hex_map.len(), crate::hex::disc_size(12));
    }

    #[test]
    fn test_layout_failure_is_fatal() {
        // a radius-0 world holds exactly one single-cell landmark
        let mut seed = WorldSeed::new(5, 0);
        seed.clusters.push(ClusterPlacement::landmark("cairn", "first"));
        seed.clusters.push(ClusterPlacement::landmark("cairn", "second"));

        match assembler().assemble(&seed) {
            Err(WorldgenError::Layout { cluster }) => assert_eq!(cluster, "second"),
            other => panic!("expected layout error, got {:?}", other.map(|w| w.stats)),
        }
    }

    #[test]
    fn test_negative_radius_rejected() {
        let mut seed = WorldSeed::new(1, -3);
        seed.clusters.push(ClusterPlacement::landmark("cairn", "lone"));

        match assembler().assemble(&seed) {
            Err(WorldgenError::InvalidRadius(r)) => assert_eq!(r, -3),
            other => panic!("expected radius error, got {:?}", other.map(|w| w.stats)),
        }
    }

    struct Offline;

    impl ContentGenerator for Offline {
        fn name(&self) -> &str {
            "offline"
        }

        fn generate_hex(&self, _: &HexRequest<'_>, _: &mut ChaCha8Rng) -> std::result::Result<TaggedHex, ContentError> {
            Err(ContentError::Unavailable("no backend".to_string()))
        }
    }

    #[test]
    fn test_failing_content_degrades_to_seed_hex() {
        let config = Arc::new(TagConfig::builtin().unwrap());
        let assembler = WorldAssembler::new(
            config,
            Box::new(Offline),
            Box::new(RuleBasedAnchors::default()),
            GenerationParams::default(),
        );
        let mut seed = WorldSeed::new(9, 10);
        seed.clusters.push(ClusterPlacement::settlement("village", "v"));

        let world = assembler.assemble(&seed).unwrap();
        let cluster = &world.hex_map.clusters["v"];
        assert_eq!(cluster.footprint, vec![(0, 0)]);
        assert_eq!(world.failures, vec!["cluster v: grew 1 of 20 hexes".to_string()]);
        assert_eq!(world.hex_map.len(), crate::hex::disc_size(10));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title("dwarf_hold_major"), "Dwarf Hold Major");
    }
}
