//! Axial hex coordinate math
//!
//! Edge numbering runs clockwise from East:
//!
//! ```text
//!   edge 0: E   (+1,  0)
//!   edge 1: NE  (+1, -1)
//!   edge 2: NW  ( 0, -1)
//!   edge 3: W   (-1,  0)
//!   edge 4: SW  (-1, +1)
//!   edge 5: SE  ( 0, +1)
//! ```
//!
//! The world is a hex disc: a coordinate is in bounds when
//! `max(|q|, |r|, |q + r|) <= radius`. Every stage uses this one test.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WorldgenError;

/// Neighbor offsets indexed by edge number
pub const NEIGHBOR_OFFSETS: [(i32, i32); 6] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
];

/// Short compass names for each edge
pub const EDGE_NAMES: [&str; 6] = ["E", "NE", "NW", "W", "SW", "SE"];

/// Axial hex coordinate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const ORIGIN: HexCoord = HexCoord { q: 0, r: 0 };

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Third cube coordinate (q + r + s = 0)
    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Neighbor across the given edge (0-5, wraps)
    pub fn neighbor(&self, edge: usize) -> HexCoord {
        let (dq, dr) = NEIGHBOR_OFFSETS[edge % 6];
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// All six neighbors paired with the edge that leads to them
    pub fn neighbors(&self) -> impl Iterator<Item = (usize, HexCoord)> + '_ {
        (0..6).map(move |edge| (edge, self.neighbor(edge)))
    }

    /// Hex distance: `(|dq| + |dq + dr| + |dr|) / 2`
    pub fn distance(&self, other: HexCoord) -> i32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.abs() + (dq + dr).abs() + dr.abs()) / 2
    }

    /// Distance from the origin
    pub fn length(&self) -> i32 {
        self.distance(HexCoord::ORIGIN)
    }

    /// Whether this coordinate lies inside the world disc
    pub fn in_radius(&self, radius: i32) -> bool {
        self.q.abs().max(self.r.abs()).max((self.q + self.r).abs()) <= radius
    }

    /// Translate by a relative offset
    pub fn offset(&self, dq: i32, dr: i32) -> HexCoord {
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// Edge index leading from `self` to an adjacent coordinate
    pub fn edge_to(&self, other: HexCoord) -> Option<usize> {
        let delta = (other.q - self.q, other.r - self.r);
        NEIGHBOR_OFFSETS.iter().position(|&o| o == delta)
    }

    /// String key used by the persisted map format
    pub fn key(&self) -> String {
        format!("{},{}", self.q, self.r)
    }

    /// Parse a `"q,r"` key
    pub fn from_key(key: &str) -> Result<HexCoord, WorldgenError> {
        key.parse()
    }

    /// Every coordinate in the disc of the given radius, in (q, r) order
    pub fn disc(radius: i32) -> impl Iterator<Item = HexCoord> {
        (-radius..=radius).flat_map(move |q| {
            let r_min = (-radius).max(-q - radius);
            let r_max = radius.min(-q + radius);
            (r_min..=r_max).map(move |r| HexCoord::new(q, r))
        })
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.q, self.r)
    }
}

impl FromStr for HexCoord {
    type Err = WorldgenError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let invalid = || WorldgenError::InvalidKey(key.to_string());
        let (q, r) = key.split_once(',').ok_or_else(invalid)?;
        let q = q.trim().parse().map_err(|_| invalid())?;
        let r = r.trim().parse().map_err(|_| invalid())?;
        Ok(HexCoord::new(q, r))
    }
}

impl From<(i32, i32)> for HexCoord {
    fn from((q, r): (i32, i32)) -> Self {
        HexCoord::new(q, r)
    }
}

/// Edge on the far side of the hex
pub fn opposite_edge(edge: usize) -> usize {
    (edge + 3) % 6
}

/// Neighbor of `(q, r)` across `edge`
pub fn get_neighbor(q: i32, r: i32, edge: usize) -> (i32, i32) {
    let n = HexCoord::new(q, r).neighbor(edge);
    (n.q, n.r)
}

/// Hex distance between two axial coordinates
pub fn distance(q1: i32, r1: i32, q2: i32, r2: i32) -> i32 {
    HexCoord::new(q1, r1).distance(HexCoord::new(q2, r2))
}

/// Number of hexes in a disc of the given radius
pub fn disc_size(radius: i32) -> usize {
    if radius < 0 {
        return 0;
    }
    let r = radius as usize;
    3 * r * (r + 1) + 1
}
