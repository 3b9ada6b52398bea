//! Wave-collapse filler for the empty hexes of a world disc
//!
//! Every empty in-bounds cell starts with the full terrain-class universe,
//! narrowed by the transition table against its fixed neighbours. Cells are
//! collapsed lowest-entropy first, outward from the fixed hexes, and each
//! collapse narrows the cells around it. Contradictions fall back to
//! `surface`; whatever is left when the loop ends is forced to `surface`,
//! so the disc is always fully covered.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::TagConfig;
use crate::hex::HexCoord;
use crate::schema::{HexMap, TerrainTag, WorldHex};

/// Possibilities of one empty cell
#[derive(Clone, Debug)]
struct WaveCell {
    possible: BTreeSet<TerrainTag>,
    chosen: Option<TerrainTag>,
}

/// What a fill pass did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Cells collapsed by the wave loop
    pub collapsed: usize,
    /// Cells forced to the default class afterwards
    pub forced: usize,
    pub iterations: usize,
}

impl FillReport {
    pub fn total(&self) -> usize {
        self.collapsed + self.forced
    }
}

pub struct FillerGenerator {
    config: Arc<TagConfig>,
    max_iterations: usize,
}

impl FillerGenerator {
    pub fn new(config: Arc<TagConfig>, max_iterations: usize) -> Self {
        Self { config, max_iterations }
    }

    /// Fill every empty cell of `map`'s disc; never overwrites a placed hex
    pub fn fill(&self, map: &mut HexMap, rng: &mut ChaCha8Rng) -> FillReport {
        let radius = map.world_radius;
        let mut report = FillReport::default();

        let empty: Vec<HexCoord> = HexCoord::disc(radius).filter(|c| !map.contains(*c)).collect();
        if empty.is_empty() {
            return report;
        }

        // Terrain class of every fixed or collapsed cell
        let mut classes: BTreeMap<HexCoord, TerrainTag> = BTreeMap::new();
        for cell in &empty {
            for (_, n) in cell.neighbors() {
                if let Some(hex) = map.get(n) {
                    classes.entry(n).or_insert_with(|| self.class_of(hex));
                }
            }
        }

        let universe: BTreeSet<TerrainTag> = self.config.filler_universe().into_iter().collect();
        let mut wave: BTreeMap<HexCoord, WaveCell> = BTreeMap::new();
        for &cell in &empty {
            let mut possible = universe.clone();
            self.narrow(cell, &mut possible, &classes);
            wave.insert(cell, WaveCell { possible, chosen: None });
        }

        let mut frontier: BTreeSet<HexCoord> = empty
            .iter()
            .copied()
            .filter(|c| c.neighbors().any(|(_, n)| classes.contains_key(&n)))
            .collect();
        if frontier.is_empty() {
            // nothing fixed to grow from
            frontier.insert(empty[0]);
        }
        debug!(empty = empty.len(), frontier = frontier.len(), "filler wave initialized");

        while !frontier.is_empty() && report.iterations < self.max_iterations {
            let Some(pos) = select_min_entropy(&frontier, &wave, rng) else {
                break;
            };
            frontier.remove(&pos);

            let possible = match wave.get(&pos) {
                Some(cell) if cell.chosen.is_none() => cell.possible.clone(),
                _ => continue,
            };

            let chosen = self.collapse(pos, &possible, &classes, rng).unwrap_or(TerrainTag::Surface);
            if let Some(cell) = wave.get_mut(&pos) {
                cell.chosen = Some(chosen);
            }
            classes.insert(pos, chosen);
            map.insert(self.materialize(pos, chosen, rng));
            report.collapsed += 1;

            for (_, n) in pos.neighbors() {
                if let Some(cell) = wave.get_mut(&n) {
                    if cell.chosen.is_none() {
                        self.narrow(n, &mut cell.possible, &classes);
                        frontier.insert(n);
                    }
                }
            }

            report.iterations += 1;
        }

        for (pos, cell) in &wave {
            if cell.chosen.is_none() {
                map.insert(self.materialize(*pos, TerrainTag::Surface, rng));
                report.forced += 1;
            }
        }

        if report.forced > 0 {
            warn!(forced = report.forced, iterations = report.iterations, "filler forced leftover cells to surface");
        }
        info!(collapsed = report.collapsed, forced = report.forced, "filler pass complete");
        report
    }

    /// Class of a placed hex: its first terrain tag, else its terrain's class
    pub fn class_of(&self, hex: &WorldHex) -> TerrainTag {
        hex.tags
            .iter()
            .find_map(|t| t.parse::<TerrainTag>().ok())
            .unwrap_or_else(|| hex.terrain.terrain_tag())
    }

    /// Intersect `possible` with what every known neighbour allows
    fn narrow(&self, pos: HexCoord, possible: &mut BTreeSet<TerrainTag>, classes: &BTreeMap<HexCoord, TerrainTag>) {
        for (_, n) in pos.neighbors() {
            let Some(tag) = classes.get(&n) else {
                continue;
            };
            if let Some(allowed) = self.config.allowed_next_to(*tag) {
                possible.retain(|t| allowed.contains(t));
            }
        }
        if possible.is_empty() {
            possible.insert(TerrainTag::Surface);
        }
    }

    /// Weighted pick among `possible` by transition weights from known neighbours
    fn collapse(
        &self,
        pos: HexCoord,
        possible: &BTreeSet<TerrainTag>,
        classes: &BTreeMap<HexCoord, TerrainTag>,
        rng: &mut ChaCha8Rng,
    ) -> Option<TerrainTag> {
        let neighbor_tags: Vec<TerrainTag> = pos.neighbors().filter_map(|(_, n)| classes.get(&n).copied()).collect();

        let weighted: Vec<(TerrainTag, f64)> = possible
            .iter()
            .map(|&candidate| {
                let weight = neighbor_tags
                    .iter()
                    .map(|&from| self.config.weight(from, candidate))
                    .product::<f64>();
                (candidate, weight)
            })
            .collect();

        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            let options: Vec<TerrainTag> = possible.iter().copied().collect();
            return options.choose(rng).copied();
        }

        let roll = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for &(tag, weight) in &weighted {
            cumulative += weight;
            if roll <= cumulative {
                return Some(tag);
            }
        }
        weighted.last().map(|(tag, _)| *tag)
    }

    fn materialize(&self, pos: HexCoord, tag: TerrainTag, rng: &mut ChaCha8Rng) -> WorldHex {
        let profile = self.config.profile(tag);
        let elevation = sample(profile.elevation, rng);
        let moisture = sample(profile.moisture, rng);
        let mut hex = WorldHex::plain(pos, tag.terrain(), elevation, moisture);
        hex.temperature = profile.temperature;
        hex.tags = vec![tag.name().to_string()];
        hex
    }
}

fn sample((lo, hi): (f32, f32), rng: &mut ChaCha8Rng) -> f32 {
    lo + rng.gen::<f32>() * (hi - lo)
}

/// Frontier cell with the fewest possibilities, jittered to break ties
fn select_min_entropy(
    frontier: &BTreeSet<HexCoord>,
    wave: &BTreeMap<HexCoord, WaveCell>,
    rng: &mut ChaCha8Rng,
) -> Option<HexCoord> {
    let mut best: Option<(f32, HexCoord)> = None;
    for pos in frontier {
        let Some(cell) = wave.get(pos) else {
            continue;
        };
        if cell.chosen.is_some() {
            continue;
        }
        let entropy = cell.possible.len() as f32 + rng.gen::<f32>() * 0.1;
        if best.map_or(true, |(e, _)| entropy < e) {
            best = Some((entropy, *pos));
        }
    }
    best.map(|(_, pos)| pos)
}
