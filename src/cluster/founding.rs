//! Founding bias scoring and pure repair functions
//!
//! Every function here takes a hex by reference and returns a new one.

use std::collections::BTreeMap;

use crate::config::TagConfig;
use crate::schema::{EdgeType, FoundingContext, TagCategory, TaggedHex, MAX_TAGS};

/// How well a hex fits a founding context, in `0.0..=1.0`
///
/// No context scores a perfect 1.0.
pub fn score_hex(hex: &TaggedHex, context: Option<&FoundingContext>) -> f32 {
    let Some(ctx) = context else {
        return 1.0;
    };

    let mut score = 0.5;

    let tags = hex.tag_set();

    let forbidden = tags.iter().filter(|t| ctx.bias_against.iter().any(|b| b == *t)).count();
    score -= (0.3 * forbidden as f32).min(0.5);

    let preferred = tags.iter().filter(|t| ctx.bias_tags.iter().any(|b| b == *t)).count();
    score += (0.2 * preferred as f32).min(0.5);

    if ctx.siege_mentality && hex.has_tag("military") {
        score += 0.1;
    }
    if ctx.martial_culture > 0.2 && (hex.has_tag("military") || hex.has_tag("industrial")) {
        score += 0.1;
    }

    score.clamp(0.0, 1.0)
}

/// Tags that would put a hex below ground
const BELOW_GROUND: &[&str] = &["underground", "deep", "shallow_under"];

/// Strip forbidden tags and inject a preferred one if none is present
///
/// The injected tag is the first preferred tag that is not below ground,
/// so the repair never flips a surface hex underground.
pub fn repair_founding(hex: &TaggedHex, context: &FoundingContext) -> TaggedHex {
    let mut tags: Vec<String> = hex
        .tags
        .iter()
        .filter(|t| !context.bias_against.contains(*t))
        .cloned()
        .collect();

    let has_preferred = tags.iter().any(|t| context.bias_tags.contains(t));
    if !has_preferred {
        let inject = context
            .bias_tags
            .iter()
            .find(|t| !BELOW_GROUND.contains(&t.as_str()) && !context.bias_against.contains(*t));
        if let Some(tag) = inject {
            tags.truncate(MAX_TAGS - 1);
            tags.push(tag.clone());
        }
    }

    if tags.is_empty() {
        tags.push("surface".to_string());
    }

    TaggedHex {
        tags,
        ..hex.clone()
    }
}

/// Mirror each neighbour's facing edge wherever either side must match
///
/// `neighbors` pairs an edge of `hex` with the neighbour's edge type on
/// that shared border.
pub fn heal_edges(hex: &TaggedHex, neighbors: &[(usize, EdgeType)]) -> TaggedHex {
    let mut out = hex.clone();
    for &(edge, facing) in neighbors {
        let own = &mut out.edge_types[edge % 6];
        if (own.must_match() || facing.must_match()) && *own != facing {
            *own = facing;
        }
    }
    out
}

/// Add tags that present tags depend on
///
/// A requirement that cannot fit under the tag limit drops the dependent tag.
pub fn satisfy_requirements(hex: &TaggedHex, config: &TagConfig) -> TaggedHex {
    let mut tags = hex.tags.clone();

    for req in config.requirements() {
        if !tags.contains(&req.tag) {
            continue;
        }
        let mut missing = Vec::new();
        if let Some(required) = &req.requires {
            if !tags.contains(required) {
                missing.push(required.clone());
            }
        }
        if !req.requires_one_of.is_empty() && !req.requires_one_of.iter().any(|t| tags.contains(t)) {
            missing.push(req.requires_one_of[0].clone());
        }
        if missing.is_empty() {
            continue;
        }
        if tags.len() + missing.len() <= MAX_TAGS {
            tags.extend(missing);
        } else {
            tags.retain(|t| t != &req.tag);
        }
    }

    TaggedHex {
        tags,
        ..hex.clone()
    }
}

/// Tags that dominate a cluster, and alternatives to offer instead
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiversityHints {
    pub overused: Vec<String>,
    pub suggested: Vec<String>,
}

/// Function and culture tags held by at least `threshold` of the hexes
///
/// Quiet below four hexes. Up to three of the least used tags from the same
/// categories are suggested.
pub fn diversity_hints(hexes: &[TaggedHex], config: &TagConfig, threshold: f32) -> Option<DiversityHints> {
    if hexes.len() < 4 {
        return None;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for hex in hexes {
        for tag in config.function_tags(&hex.tags).into_iter().chain(config.culture_tags(&hex.tags)) {
            *counts.entry(tag).or_default() += 1;
        }
    }

    let total = hexes.len() as f32;
    let overused: Vec<String> = counts
        .iter()
        .filter(|(_, n)| **n as f32 / total >= threshold)
        .map(|(t, _)| t.to_string())
        .collect();
    if overused.is_empty() {
        return None;
    }

    let mut pool: Vec<(usize, &String)> = [TagCategory::Function, TagCategory::Culture]
        .iter()
        .flat_map(|c| config.values(*c).iter())
        .filter(|t| !overused.contains(*t))
        .map(|t| (counts.get(t.as_str()).copied().unwrap_or(0), t))
        .collect();
    // stable: ties keep config order
    pool.sort_by_key(|(n, _)| *n);
    let suggested = pool.into_iter().take(3).map(|(_, t)| t.clone()).collect();

    Some(DiversityHints { overused, suggested })
}
