//! Settlement cluster growth
//!
//! A cluster starts from a seed hex at the origin and grows breadth-first.
//! Each popped hex offers its unused, non-blocked edges; one or two are
//! picked and a new hex is requested for each from the content generator.
//! Candidates go through edge processing, requirement fixing and edge
//! healing, then must validate against every placed neighbour.
//!
//! Founding bias is threaded explicitly through each call. When no candidate
//! validates, one retry is made with the offending tags spelled out, and
//! finally the pure founding repair is applied. Terrain incompatibility is
//! never repaired: such a candidate is dropped and the branch ends.

pub mod founding;

pub use founding::{diversity_hints, heal_edges, repair_founding, satisfy_requirements, score_hex, DiversityHints};

use std::collections::{BTreeMap, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::adjacency::{AdjacencyValidator, ValidationResult};
use crate::content::{ContentGenerator, EdgeHandler, HexRequest, NeighborContext};
use crate::hex::{opposite_edge, HexCoord};
use crate::params::GenerationParams;
use crate::schema::{EdgeType, FoundingContext, HexCluster, TaggedHex};

/// Tags for the origin when the placement names none.
/// `surface` repeats on purpose; scoring and validation work on the tag set.
pub const DEFAULT_SEED_TAGS: &[&str] = &["surface", "wild", "passage", "surface"];

/// What to grow
#[derive(Clone, Debug, Default)]
pub struct ClusterRequest<'a> {
    /// Template the content is themed after
    pub theme: &'a str,
    pub size: usize,
    pub seed_tags: Option<&'a [String]>,
    pub founding: Option<&'a FoundingContext>,
    pub founding_cluster_id: Option<u32>,
}

/// Grows [`HexCluster`]s with injected collaborators
pub struct ClusterGenerator<'a> {
    content: &'a dyn ContentGenerator,
    validator: &'a AdjacencyValidator,
    params: &'a GenerationParams,
    edges: EdgeHandler,
}

/// A placed neighbour of a candidate position: the candidate's edge toward
/// it, and the neighbour itself
type Placed<'h> = (usize, &'h TaggedHex);

impl<'a> ClusterGenerator<'a> {
    pub fn new(
        content: &'a dyn ContentGenerator,
        validator: &'a AdjacencyValidator,
        params: &'a GenerationParams,
    ) -> Self {
        Self {
            content,
            validator,
            params,
            edges: EdgeHandler::new(params.edge_mode),
        }
    }

    /// Grow a cluster; may come back short if every branch dead-ends
    pub fn generate(&self, request: &ClusterRequest<'_>, rng: &mut ChaCha8Rng) -> HexCluster {
        let target = request.size.max(1);

        let mut hexes = vec![self.seed_hex(request)];
        let mut index: BTreeMap<HexCoord, usize> = BTreeMap::new();
        index.insert(HexCoord::ORIGIN, 0);

        let mut frontier = VecDeque::from([HexCoord::ORIGIN]);

        while hexes.len() < target {
            let Some(current) = frontier.pop_front() else {
                break;
            };
            let hex = &hexes[index[&current]];

            let open: Vec<usize> = (0..6)
                .filter(|&e| hex.edge_types[e] != EdgeType::Blocked)
                .filter(|&e| !index.contains_key(&current.neighbor(e)))
                .collect();
            if open.is_empty() {
                continue;
            }

            let remaining = target - hexes.len();
            let count = rng.gen_range(1..=2).min(remaining).min(open.len());
            let chosen: Vec<usize> = open.choose_multiple(rng, count).copied().collect();

            for edge in chosen {
                if hexes.len() >= target {
                    break;
                }
                let pos = current.neighbor(edge);
                if index.contains_key(&pos) {
                    continue;
                }
                if let Some(mut new_hex) = self.grow_hex(pos, &hexes, &index, request, rng) {
                    new_hex.founding_cluster_id = request.founding_cluster_id;
                    index.insert(pos, hexes.len());
                    hexes.push(new_hex);
                    frontier.push_back(pos);
                }
            }
        }

        if hexes.len() < target {
            warn!(
                theme = request.theme,
                generated = hexes.len(),
                target,
                "cluster frontier exhausted early"
            );
        } else {
            info!(theme = request.theme, hexes = hexes.len(), "cluster complete");
        }

        let adjacencies = HexCluster::compute_adjacencies(&hexes);
        HexCluster { hexes, adjacencies }
    }

    fn seed_hex(&self, request: &ClusterRequest<'_>) -> TaggedHex {
        let tags: Vec<&str> = match request.seed_tags {
            Some(tags) if !tags.is_empty() => tags.iter().map(String::as_str).collect(),
            _ => DEFAULT_SEED_TAGS.to_vec(),
        };

        let mut seed = TaggedHex::new(
            HexCoord::ORIGIN,
            "Origin Point",
            format!("The heart of {}", request.theme),
            &tags,
            [EdgeType::Wilderness; 6],
        );
        seed.founding_context = request.founding.cloned();
        seed.founding_cluster_id = request.founding_cluster_id;

        if let Some(ctx) = request.founding {
            seed = repair_founding(&seed, ctx);
        }
        satisfy_requirements(&seed, self.validator.config())
    }

    fn grow_hex(
        &self,
        pos: HexCoord,
        hexes: &[TaggedHex],
        index: &BTreeMap<HexCoord, usize>,
        request: &ClusterRequest<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Option<TaggedHex> {
        let placed: Vec<Placed<'_>> = pos
            .neighbors()
            .filter_map(|(edge, n)| index.get(&n).map(|&i| (edge, &hexes[i])))
            .collect();

        let mut hex_request = HexRequest::new(pos, request.theme);
        hex_request.founding = request.founding;
        hex_request.neighbors = placed
            .iter()
            .map(|&(edge, n)| NeighborContext {
                edge,
                name: n.name.clone(),
                tags: n.tags.clone(),
                facing_edge: n.edge_types[opposite_edge(edge)],
            })
            .collect();
        if let Some(hints) = diversity_hints(hexes, self.validator.config(), self.params.diversity_threshold) {
            debug!(overused = ?hints.overused, suggested = ?hints.suggested, "diversity hints");
            hex_request.overused_tags = hints.overused;
            hex_request.suggested_tags = hints.suggested;
        }

        // First round: one candidate, or several under a founding context
        let rounds = if request.founding.is_some() {
            self.params.founding_candidates.max(1)
        } else {
            1
        };

        let mut best: Option<(f32, TaggedHex)> = None;
        let mut rejected = None;
        for _ in 0..rounds {
            let Some(candidate) = self.request_hex(&hex_request, &placed, rng) else {
                continue;
            };
            let result = self.check(&candidate, &placed, request.founding);
            if result.valid {
                let score = score_hex(&candidate, request.founding);
                if best.as_ref().map_or(true, |(s, _)| score > *s) {
                    best = Some((score, candidate));
                }
            } else {
                debug!(coord = %pos, errors = ?result.errors, "candidate rejected");
                rejected = Some(candidate);
            }
        }
        if let Some((_, hex)) = best {
            return Some(hex);
        }
        // every content call failed: skip this branch
        let rejected = rejected?;

        // Retry once with explicit avoid hints
        hex_request.avoid_tags = self.offending_tags(&rejected, request.founding);
        let retried = self.request_hex(&hex_request, &placed, rng).unwrap_or(rejected);
        if self.check(&retried, &placed, request.founding).valid {
            return Some(retried);
        }

        // Deterministic repair
        let mut repaired = retried;
        if let Some(ctx) = request.founding {
            repaired = repair_founding(&repaired, ctx);
        }
        repaired = satisfy_requirements(&repaired, self.validator.config());
        repaired = heal_edges(&repaired, &facing_edges(&placed));

        let result = self.check(&repaired, &placed, request.founding);
        if result.valid {
            warn!(coord = %pos, "hex accepted after founding repair");
            Some(repaired)
        } else {
            warn!(coord = %pos, errors = ?result.errors, "hex dropped; constraint cannot be repaired");
            None
        }
    }

    /// Fetch one hex and run it through edge processing and healing
    fn request_hex(
        &self,
        hex_request: &HexRequest<'_>,
        placed: &[Placed<'_>],
        rng: &mut ChaCha8Rng,
    ) -> Option<TaggedHex> {
        match self.content.generate_hex(hex_request, rng) {
            Ok(raw) => {
                let mut hex = self.edges.process(&raw);
                hex.q = hex_request.coord.q;
                hex.r = hex_request.coord.r;
                hex = satisfy_requirements(&hex, self.validator.config());
                Some(heal_edges(&hex, &facing_edges(placed)))
            }
            Err(e) => {
                warn!(
                    generator = self.content.name(),
                    coord = %hex_request.coord,
                    error = %e,
                    "content generation failed; skipping"
                );
                None
            }
        }
    }

    /// Internal, founding and adjacency checks against every placed neighbour
    fn check(&self, hex: &TaggedHex, placed: &[Placed<'_>], founding: Option<&FoundingContext>) -> ValidationResult {
        let mut result = self.validator.validate_hex(hex, founding);
        for &(edge, neighbor) in placed {
            result.merge(self.validator.validate_adjacency(hex, neighbor, edge));
        }
        for warning in &result.warnings {
            debug!(coord = %hex.coord(), "{}", warning);
        }
        result
    }

    /// Tags a rejected hex should not carry again
    fn offending_tags(&self, hex: &TaggedHex, founding: Option<&FoundingContext>) -> Vec<String> {
        let mut tags: Vec<String> = founding
            .map(|ctx| {
                hex.tags
                    .iter()
                    .filter(|t| ctx.bias_against.contains(*t))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for req in self.validator.config().requirements() {
            if hex.has_tag(&req.tag) && !tags.contains(&req.tag) {
                tags.push(req.tag.clone());
            }
        }
        tags
    }
}

fn facing_edges(placed: &[Placed<'_>]) -> Vec<(usize, EdgeType)> {
    placed
        .iter()
        .map(|&(edge, n)| (edge, n.edge_types[opposite_edge(edge)]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use rand::SeedableRng;

    use crate::config::TagConfig;
    use crate::content::ProceduralContent;
    use crate::error::ContentError;

    fn validator() -> AdjacencyValidator {
        AdjacencyValidator::new(Arc::new(TagConfig::builtin().unwrap()))
    }

    fn connected(cluster: &HexCluster) -> usize {
        let cells: BTreeSet<HexCoord> = cluster.hexes.iter().map(|h| h.coord()).collect();
        let mut seen = BTreeSet::from([cluster.hexes[0].coord()]);
        let mut queue = VecDeque::from([cluster.hexes[0].coord()]);
        while let Some(c) = queue.pop_front() {
            for (_, n) in c.neighbors() {
                if cells.contains(&n) && seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen.len()
    }

    #[test]
    fn test_grows_connected_twenty_hex_cluster() {
        let validator = validator();
        let content = ProceduralContent::new(Arc::new(TagConfig::builtin().unwrap()));
        let params = GenerationParams::default();
        let generator = ClusterGenerator::new(&content, &validator, &params);

        let request = ClusterRequest {
            theme: "market_town",
            size: 20,
            ..Default::default()
        };
        let cluster = generator.generate(&request, &mut ChaCha8Rng::seed_from_u64(42));

        assert!(cluster.is_complete());
        assert_eq!(connected(&cluster), 20);
        let unique: BTreeSet<_> = cluster.hexes.iter().map(|h| h.coord()).collect();
        assert_eq!(unique.len(), 20);

        // every adjacency honours must-match edges
        for adj in &cluster.adjacencies {
            let a = cluster.hexes[adj.a].edge_types[adj.edge];
            let b = cluster.hexes[adj.b].edge_types[opposite_edge(adj.edge)];
            if a.must_match() || b.must_match() {
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_origin_uses_default_tags() {
        let validator = validator();
        let content = ProceduralContent::new(Arc::new(TagConfig::builtin().unwrap()));
        let params = GenerationParams::default();
        let generator = ClusterGenerator::new(&content, &validator, &params);

        let request = ClusterRequest {
            theme: "camp",
            size: 1,
            ..Default::default()
        };
        let cluster = generator.generate(&request, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(cluster.hex_count(), 1);
        assert_eq!(cluster.hexes[0].name, "Origin Point");
        assert_eq!(cluster.hexes[0].tags, vec!["surface", "wild", "passage", "surface"]);
        assert!(cluster.adjacencies.is_empty());
    }

    #[test]
    fn test_founding_bias_never_leaks_forbidden_tags() {
        let validator = validator();
        let content = ProceduralContent::new(Arc::new(TagConfig::builtin().unwrap()));
        let params = GenerationParams::default();
        let generator = ClusterGenerator::new(&content, &validator, &params);

        let ctx = FoundingContext::new("winter")
            .with_bias_tags(&["military", "defensive"])
            .with_bias_against(&["wild"]);
        let request = ClusterRequest {
            theme: "hold",
            size: 12,
            founding: Some(&ctx),
            founding_cluster_id: Some(7),
            ..Default::default()
        };
        let cluster = generator.generate(&request, &mut ChaCha8Rng::seed_from_u64(3));
        assert!(cluster.hex_count() > 1);
        for hex in &cluster.hexes {
            assert!(!hex.has_tag("wild"), "{:?}", hex.tags);
            assert_eq!(hex.founding_cluster_id, Some(7));
        }
    }

    /// Always answers with the same forbidden tag
    struct Stubborn;

    impl ContentGenerator for Stubborn {
        fn name(&self) -> &str {
            "stubborn"
        }

        fn generate_hex(&self, request: &HexRequest<'_>, _rng: &mut ChaCha8Rng) -> Result<TaggedHex, ContentError> {
            Ok(TaggedHex::new(
                request.coord,
                "Wild Patch",
                "Overgrown",
                &["surface", "wild"],
                [EdgeType::Wilderness; 6],
            ))
        }
    }

    #[test]
    fn test_repair_keeps_generation_moving() {
        let validator = validator();
        let params = GenerationParams::default();
        let generator = ClusterGenerator::new(&Stubborn, &validator, &params);

        let ctx = FoundingContext::new("autumn")
            .with_bias_tags(&["underground", "defensive"])
            .with_bias_against(&["wild"]);
        let request = ClusterRequest {
            theme: "fort",
            size: 6,
            founding: Some(&ctx),
            ..Default::default()
        };
        let cluster = generator.generate(&request, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(cluster.hex_count(), 6);
        for hex in &cluster.hexes[1..] {
            assert_eq!(hex.tags, vec!["surface", "defensive"]);
        }
    }

    /// Fails every other call
    struct Flaky {
        calls: Cell<usize>,
    }

    impl ContentGenerator for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn generate_hex(&self, request: &HexRequest<'_>, _rng: &mut ChaCha8Rng) -> Result<TaggedHex, ContentError> {
            let n = self.calls.get();
            self.calls.set(n + 1);
            if n % 2 == 1 {
                return Err(ContentError::Network("timeout".to_string()));
            }
            Ok(TaggedHex::new(
                request.coord,
                "Lane",
                "A lane",
                &["surface", "residential"],
                [EdgeType::Wilderness; 6],
            ))
        }
    }

    #[test]
    fn test_content_failures_are_skipped() {
        let validator = validator();
        let params = GenerationParams::default();
        let flaky = Flaky { calls: Cell::new(0) };
        let generator = ClusterGenerator::new(&flaky, &validator, &params);

        let request = ClusterRequest {
            theme: "village",
            size: 10,
            ..Default::default()
        };
        let cluster = generator.generate(&request, &mut ChaCha8Rng::seed_from_u64(5));
        assert!(cluster.hex_count() >= 2);
        assert!(cluster.hex_count() <= 10);
        assert_eq!(connected(&cluster), cluster.hex_count());
    }
}
