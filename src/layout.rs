//! Cluster layout by rejection sampling
//!
//! Clusters are placed one at a time in input order. Each gets up to
//! `attempts` uniform draws from `[-radius, radius]^2`; the first draw whose
//! translated footprint lies inside the world disc and touches no placed
//! cell wins. Running out of draws fails the whole layout.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::error::{Result, WorldgenError};
use crate::hex::HexCoord;
use crate::schema::{AssembledCluster, LayoutHint};

/// Sector of the world disc a cluster can be pinned to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    North,
    South,
    East,
    West,
    Center,
}

impl Region {
    /// Parse a `region:<name>` hint
    pub fn from_hint(hint: &str) -> Option<Region> {
        hint.strip_prefix("region:").and_then(|r| r.parse().ok())
    }

    /// Whether `coord` lies in this sector of a disc of `radius`
    ///
    /// North is negative `r`; east is positive `q + r/2`.
    pub fn contains(&self, coord: HexCoord, radius: i32) -> bool {
        let third = radius as f32 / 3.0;
        let x = coord.q as f32 + coord.r as f32 / 2.0;
        let y = coord.r as f32;
        match self {
            Region::North => y < -third,
            Region::South => y > third,
            Region::East => x > third,
            Region::West => x < -third,
            Region::Center => coord.length() as f32 <= third,
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" => Ok(Region::North),
            "south" => Ok(Region::South),
            "east" => Ok(Region::East),
            "west" => Ok(Region::West),
            "center" | "centre" => Ok(Region::Center),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::North => "north",
            Region::South => "south",
            Region::East => "east",
            Region::West => "west",
            Region::Center => "center",
        };
        f.write_str(name)
    }
}

/// Places cluster footprints without overlap
#[derive(Clone, Copy, Debug)]
pub struct LayoutSolver {
    pub attempts: usize,
}

impl Default for LayoutSolver {
    fn default() -> Self {
        Self { attempts: 1000 }
    }
}

impl LayoutSolver {
    pub fn new(attempts: usize) -> Self {
        Self { attempts }
    }

    /// Position every cluster, keyed by instance id
    pub fn solve(
        &self,
        clusters: &[AssembledCluster],
        hints: &[LayoutHint],
        radius: i32,
        rng: &mut ChaCha8Rng,
    ) -> Result<BTreeMap<String, HexCoord>> {
        if radius < 0 {
            return Err(WorldgenError::InvalidRadius(radius));
        }
        let regions = regions_from_hints(hints);
        let mut positions = BTreeMap::new();
        let mut placed: BTreeSet<HexCoord> = BTreeSet::new();

        for cluster in clusters {
            let region = regions.get(cluster.instance_id.as_str()).copied();
            let position = self
                .place_one(cluster, region, radius, &placed, rng)
                .ok_or_else(|| WorldgenError::Layout {
                    cluster: cluster.instance_id.clone(),
                })?;

            placed.extend(cluster.cells_at(position));
            debug!(cluster = %cluster.instance_id, %position, "cluster placed");
            positions.insert(cluster.instance_id.clone(), position);
        }

        info!(clusters = positions.len(), cells = placed.len(), "layout solved");
        Ok(positions)
    }

    fn place_one(
        &self,
        cluster: &AssembledCluster,
        region: Option<Region>,
        radius: i32,
        placed: &BTreeSet<HexCoord>,
        rng: &mut ChaCha8Rng,
    ) -> Option<HexCoord> {
        for _ in 0..self.attempts {
            let candidate = HexCoord::new(rng.gen_range(-radius..=radius), rng.gen_range(-radius..=radius));
            if !candidate.in_radius(radius) {
                continue;
            }
            if region.map_or(false, |r| !r.contains(candidate, radius)) {
                continue;
            }
            let fits = cluster
                .cells_at(candidate)
                .all(|c| c.in_radius(radius) && !placed.contains(&c));
            if fits {
                return Some(candidate);
            }
        }
        None
    }
}

/// Region pins by cluster id; unknown hints are logged and ignored
fn regions_from_hints(hints: &[LayoutHint]) -> BTreeMap<&str, Region> {
    let mut regions = BTreeMap::new();
    for hint in hints {
        for text in &hint.hints {
            match Region::from_hint(text) {
                Some(region) => {
                    regions.insert(hint.cluster_id.as_str(), region);
                }
                None => debug!(cluster = %hint.cluster_id, hint = %text, "ignoring layout hint"),
            }
        }
    }
    regions
}

/// Every absolute cell covered by placed clusters
pub fn occupied_cells<'a>(
    clusters: impl IntoIterator<Item = &'a AssembledCluster>,
    positions: &BTreeMap<String, HexCoord>,
) -> BTreeSet<HexCoord> {
    let mut cells = BTreeSet::new();
    for cluster in clusters {
        if let Some(&pos) = positions.get(&cluster.instance_id) {
            cells.extend(cluster.cells_at(pos));
        }
    }
    cells
}
