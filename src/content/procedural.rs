//! Offline content generator
//!
//! Picks tags from the configured vocabulary, leaning on the neighbours so
//! clusters read as coherent places, and mirrors every must-match edge it
//! faces so its output validates without repair in the common case.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::{check_hex, ContentGenerator, HexRequest};
use crate::config::TagConfig;
use crate::error::ContentError;
use crate::schema::{EdgeType, TagCategory, TaggedHex, TerrainTag};

/// Functions that change the edge layout; never picked at random
const STRUCTURAL_FUNCTIONS: &[&str] = &["dead_end", "entrance"];

/// Deterministic generator driven by the stage RNG
#[derive(Clone, Debug)]
pub struct ProceduralContent {
    config: Arc<TagConfig>,
}

impl ProceduralContent {
    pub fn new(config: Arc<TagConfig>) -> Self {
        Self { config }
    }

    fn pick_terrain(&self, request: &HexRequest<'_>, rng: &mut ChaCha8Rng) -> TerrainTag {
        let neighbor_terrain: Vec<TerrainTag> = request
            .neighbors
            .iter()
            .filter_map(|n| self.config.terrain_tag_of(&n.tags))
            .collect();

        if neighbor_terrain.is_empty() {
            return TerrainTag::Surface;
        }

        let fits = |t: &TerrainTag| neighbor_terrain.iter().all(|n| !self.config.terrain_incompatible(*t, *n));

        // Mostly continue what is already there
        let continuing: Vec<TerrainTag> = neighbor_terrain.iter().copied().filter(fits).collect();
        if rng.gen::<f32>() < 0.85 {
            if let Some(&t) = continuing.choose(rng) {
                return t;
            }
        }

        let compatible: Vec<TerrainTag> = self
            .config
            .values(TagCategory::Terrain)
            .iter()
            .filter_map(|v| v.parse::<TerrainTag>().ok())
            .filter(fits)
            .collect();
        compatible.choose(rng).copied().unwrap_or(neighbor_terrain[0])
    }

    fn pick_tags(&self, request: &HexRequest<'_>, terrain: TerrainTag, rng: &mut ChaCha8Rng) -> Vec<String> {
        let forbidden = request.forbidden();
        let allowed = |t: &&String| !forbidden.contains(&t.as_str());

        let mut tags = vec![terrain.name().to_string()];

        // Culture: inherit from a neighbour most of the time
        let inherited: Vec<&String> = request
            .neighbors
            .iter()
            .flat_map(|n| n.tags.iter())
            .filter(|t| self.config.category_of(t) == Some(TagCategory::Culture))
            .filter(allowed)
            .collect();
        let cultures: Vec<&String> = self.config.values(TagCategory::Culture).iter().filter(allowed).collect();
        let culture = if !inherited.is_empty() && rng.gen::<f32>() < 0.7 {
            inherited.choose(rng).copied()
        } else {
            cultures.choose(rng).copied()
        };
        if let Some(c) = culture {
            tags.push(c.clone());
        }

        // Founding preference
        if let Some(founding) = request.founding {
            let preferred: Vec<&String> = founding
                .bias_tags
                .iter()
                .filter(allowed)
                .filter(|t| self.config.category_of(t) != Some(TagCategory::Terrain))
                .collect();
            if rng.gen::<f32>() < 0.6 {
                if let Some(p) = preferred.choose(rng) {
                    tags.push((*p).clone());
                }
            }
        }

        // One or two functions, steering away from overused ones
        let functions: Vec<&String> = self
            .config
            .values(TagCategory::Function)
            .iter()
            .filter(allowed)
            .filter(|t| !STRUCTURAL_FUNCTIONS.contains(&t.as_str()))
            .filter(|t| !request.overused_tags.contains(*t))
            .collect();
        let suggested: Vec<&String> = request.suggested_tags.iter().filter(allowed).collect();

        let count = rng.gen_range(1..=2);
        for _ in 0..count {
            let pick = if !suggested.is_empty() && rng.gen::<f32>() < 0.5 {
                suggested.choose(rng)
            } else {
                functions.choose(rng)
            };
            if let Some(f) = pick {
                if !tags.contains(*f) {
                    tags.push((*f).clone());
                }
            }
        }

        if terrain == TerrainTag::Underground && rng.gen::<f32>() < 0.2 && !forbidden.contains(&"deep") {
            tags.push("deep".to_string());
        }

        tags
    }

    fn pick_edges(&self, request: &HexRequest<'_>, terrain: TerrainTag, rng: &mut ChaCha8Rng) -> [EdgeType; 6] {
        let open = match terrain {
            TerrainTag::Underground => EdgeType::Tunnel,
            TerrainTag::Underwater => EdgeType::Water,
            TerrainTag::Surface | TerrainTag::Elevated | TerrainTag::Peak => EdgeType::Road,
            TerrainTag::Aerial => EdgeType::Entrance,
        };

        let mut edges = [EdgeType::Wilderness; 6];
        for edge in edges.iter_mut() {
            let roll = rng.gen::<f32>();
            *edge = if roll < 0.15 {
                EdgeType::Blocked
            } else if roll < 0.45 {
                open
            } else {
                EdgeType::Wilderness
            };
        }

        for neighbor in &request.neighbors {
            let edge = neighbor.edge % 6;
            edges[edge] = if neighbor.facing_edge.must_match() {
                neighbor.facing_edge
            } else if edges[edge].must_match() {
                // An unmatched must-match edge would be rejected
                EdgeType::Wilderness
            } else {
                edges[edge]
            };
        }

        // Keep at least one way out so growth can continue
        if edges.iter().all(|e| *e == EdgeType::Blocked) {
            edges[rng.gen_range(0..6)] = EdgeType::Wilderness;
        }
        edges
    }

    fn name_for(&self, tags: &[String], terrain: TerrainTag, rng: &mut ChaCha8Rng) -> String {
        let places: &[&str] = match terrain {
            TerrainTag::Underground => &["Hall", "Gallery", "Delving", "Vault", "Shaft"],
            TerrainTag::Underwater => &["Grotto", "Reef", "Sunken Court", "Kelp Walk"],
            TerrainTag::Aerial => &["Spire", "Eyrie", "Sky Terrace"],
            TerrainTag::Surface | TerrainTag::Elevated | TerrainTag::Peak => {
                &["Green", "Yard", "Crossing", "Row", "Field", "Lane"]
            }
        };
        let function = tags
            .iter()
            .find(|t| self.config.category_of(t) == Some(TagCategory::Function))
            .map(|t| function_word(t))
            .unwrap_or("Quiet");
        let place = places.choose(rng).copied().unwrap_or("Place");
        format!("{} {}", function, place)
    }
}

fn function_word(tag: &str) -> &'static str {
    match tag {
        "residential" => "Hearth",
        "industrial" => "Forge",
        "military" => "Guard",
        "defensive" => "Rampart",
        "sacred" => "Shrine",
        "commercial" => "Market",
        "agricultural" => "Harvest",
        "storage" => "Store",
        "passage" => "Long",
        "wild" => "Wild",
        "ruin" => "Broken",
        "civic" => "Moot",
        "harbor" => "Quay",
        _ => "Old",
    }
}

impl ContentGenerator for ProceduralContent {
    fn name(&self) -> &str {
        "procedural"
    }

    fn generate_hex(&self, request: &HexRequest<'_>, rng: &mut ChaCha8Rng) -> Result<TaggedHex, ContentError> {
        let terrain = self.pick_terrain(request, rng);
        let tags = self.pick_tags(request, terrain, rng);
        let edge_types = self.pick_edges(request, terrain, rng);
        let name = self.name_for(&tags, terrain, rng);
        let character = if tags.len() > 1 { tags[1..].join(", ") } else { "quiet".to_string() };
        let description = format!("A {} stretch of {} ground in {}", character, terrain, request.theme);

        let hex = TaggedHex {
            q: request.coord.q,
            r: request.coord.r,
            name,
            description,
            tags,
            edge_types,
            founding_context: request.founding.cloned(),
            founding_cluster_id: None,
        };
        check_hex(&hex)?;
        Ok(hex)
    }
}
