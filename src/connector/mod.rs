//! Connector generation between placed clusters
//!
//! A connector is an elastic A* path turned into a chain of sampled hexes,
//! optionally stretched or compressed, with anchor slots and entry points
//! marked along it.

pub mod elastic;
pub mod path;
pub mod slots;

use std::collections::{BTreeMap, BTreeSet};

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::hex::HexCoord;
use crate::params::GenerationParams;
use crate::schema::{ConnectorCollection, ConnectorHex, ConnectorType, ElasticSegment, SpeciesFitness};

pub use elastic::{apply_elastic_segments, relink};
pub use path::{find_path, straight_line, PathParams};
pub use slots::{anchor_interval, anchor_slots, base_terrain, entry_points, sample_elevation, sample_moisture};

/// Temperature given to every connector hex
const CONNECTOR_TEMPERATURE: f32 = 15.0;

/// One connector to build
#[derive(Clone, Debug)]
pub struct ConnectorRequest<'a> {
    pub id: &'a str,
    pub connector_type: ConnectorType,
    pub start: HexCoord,
    pub end: HexCoord,
    /// Cells the path may not enter
    pub avoid: &'a BTreeSet<HexCoord>,
    pub elastic_segments: &'a [ElasticSegment],
}

/// Builds connector collections with a fixed elasticity and deviation bound
#[derive(Clone, Copy, Debug)]
pub struct ConnectorGenerator {
    pub elasticity: f32,
    pub max_deviation: i32,
    /// World disc the path must stay within
    pub radius: Option<i32>,
}

impl Default for ConnectorGenerator {
    fn default() -> Self {
        Self::new(0.3, 3)
    }
}

impl ConnectorGenerator {
    pub fn new(elasticity: f32, max_deviation: i32) -> Self {
        Self {
            elasticity,
            max_deviation,
            radius: None,
        }
    }

    pub fn from_params(params: &GenerationParams) -> Self {
        Self::new(params.elasticity, params.max_deviation)
    }

    pub fn with_radius(mut self, radius: i32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn generate(&self, request: &ConnectorRequest<'_>, rng: &mut ChaCha8Rng) -> ConnectorCollection {
        let params = PathParams {
            elasticity: self.elasticity,
            max_deviation: self.max_deviation,
            radius: self.radius,
        };
        let path = find_path(request.start, request.end, request.avoid, params, rng);
        let mut hexes = sample_hexes(&path, request.connector_type, rng);

        if !request.elastic_segments.is_empty() {
            hexes = apply_elastic_segments(hexes, request.elastic_segments);
        }

        let minor_slots = anchor_slots(&mut hexes, request.connector_type);
        let entry_points = entry_points(&mut hexes);
        let internal_graph: BTreeMap<usize, Vec<usize>> =
            hexes.iter().map(|h| (h.index, h.connects_to.clone())).collect();

        debug!(
            id = request.id,
            kind = %request.connector_type,
            path = path.len(),
            hexes = hexes.len(),
            slots = minor_slots.len(),
            "connector generated"
        );

        ConnectorCollection {
            id: request.id.to_string(),
            connector_type: request.connector_type,
            base_length: hexes.len(),
            hexes,
            entry_points,
            internal_graph,
            elastic_segments: request.elastic_segments.to_vec(),
            minor_slots,
        }
    }
}

/// Turn a path into linked connector hexes with per-type samples
fn sample_hexes(path: &[HexCoord], connector_type: ConnectorType, rng: &mut ChaCha8Rng) -> Vec<ConnectorHex> {
    let terrain = base_terrain(connector_type);
    let mut hexes: Vec<ConnectorHex> = path
        .iter()
        .enumerate()
        .map(|(i, &coord)| ConnectorHex {
            index: i,
            coord: Some(coord),
            terrain,
            elevation: sample_elevation(connector_type, i, path.len(), rng),
            moisture: sample_moisture(connector_type, rng),
            temperature: CONNECTOR_TEMPERATURE,
            species_fitness: SpeciesFitness::neutral(),
            connects_to: Vec::new(),
            is_entry_point: false,
            is_slot: false,
        })
        .collect();
    relink(&mut hexes);
    hexes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Terrain;
    use rand::SeedableRng;

    fn request<'a>(avoid: &'a BTreeSet<HexCoord>, kind: ConnectorType, segments: &'a [ElasticSegment]) -> ConnectorRequest<'a> {
        ConnectorRequest {
            id: "road",
            connector_type: kind,
            start: HexCoord::new(-6, 0),
            end: HexCoord::new(6, -2),
            avoid,
            elastic_segments: segments,
        }
    }

    #[test]
    fn test_collection_shape() {
        let avoid = BTreeSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let c = ConnectorGenerator::default().generate(&request(&avoid, ConnectorType::TradeRouteMajor, &[]), &mut rng);

        assert_eq!(c.id, "road");
        assert_eq!(c.hexes.first().and_then(|h| h.coord), Some(HexCoord::new(-6, 0)));
        assert_eq!(c.hexes.last().and_then(|h| h.coord), Some(HexCoord::new(6, -2)));
        assert!(c.hexes.iter().all(|h| h.terrain == Terrain::Plains));
        assert_eq!(c.entry_points.len(), 2);
        assert_eq!(c.internal_graph.len(), c.len());
        assert_eq!(c.internal_graph[&0], vec![1]);
        assert!(c.slot("slot_start").is_some() && c.slot("slot_end").is_some());
        assert!(c.slot("slot_8").is_some());
    }

    #[test]
    fn test_deterministic_for_seed() {
        let avoid = BTreeSet::new();
        let gen = ConnectorGenerator::default();
        let req = request(&avoid, ConnectorType::MilitaryRoad, &[]);
        let a = gen.generate(&req, &mut ChaCha8Rng::seed_from_u64(5));
        let b = gen.generate(&req, &mut ChaCha8Rng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_river_descends_and_needs_crossings() {
        let avoid = BTreeSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let c = ConnectorGenerator::default().generate(&request(&avoid, ConnectorType::RiverUpper, &[]), &mut rng);

        assert!(c.hexes.windows(2).all(|w| w[1].elevation <= w[0].elevation));
        let crossings = c.minor_slots.iter().filter(|s| s.required).count();
        assert_eq!(crossings, c.len() - 2);
    }

    #[test]
    fn test_stretched_connector_relinked() {
        let avoid = BTreeSet::new();
        let segments = [ElasticSegment {
            start_hex: 2,
            end_hex: 4,
            base_length: 3,
            min_length: 7,
            max_length: 10,
            stretch_terrain: Terrain::Hills,
        }];
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let gen = ConnectorGenerator::new(0.0, 0);
        let c = gen.generate(&request(&avoid, ConnectorType::TradeRouteMinor, &segments), &mut rng);

        // straight path of 13 hexes plus 4 inserted
        assert_eq!(c.len(), 17);
        assert_eq!(c.coords().count(), 13);
        assert_eq!(c.hexes.iter().filter(|h| h.terrain == Terrain::Hills).count(), 4);
        for (i, h) in c.hexes.iter().enumerate() {
            assert_eq!(h.index, i);
        }
    }
}
