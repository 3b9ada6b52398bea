//! Elastic A* over the hex grid
//!
//! Standard A* with unit step cost and hex distance as the heuristic, except
//! that every push subtracts a random bonus from `f`. The bonus lets the
//! search wander off the shortest line; the deviation bound keeps it honest.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::hex::HexCoord;

/// Open-set entry
#[derive(Clone, Copy, Debug)]
struct PathNode {
    coord: HexCoord,
    parent: Option<HexCoord>,
    g: i32,
    f: f32,
    /// Push order; breaks `f` ties first-in first-out
    seq: u64,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other
            .f
            .partial_cmp(&self.f)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Search knobs for one connector
#[derive(Clone, Copy, Debug)]
pub struct PathParams {
    /// Scale of the random bonus subtracted from `f`
    pub elasticity: f32,
    /// Largest allowed excess of projected length over the straight distance
    pub max_deviation: i32,
    /// Keep the walk inside this world disc
    pub radius: Option<i32>,
}

/// Find a path from `start` to `end`, both included
///
/// Cells in `avoid` are never entered. When the search runs dry the greedy
/// straight walk is returned instead, so this always produces a path.
pub fn find_path(
    start: HexCoord,
    end: HexCoord,
    avoid: &BTreeSet<HexCoord>,
    params: PathParams,
    rng: &mut ChaCha8Rng,
) -> Vec<HexCoord> {
    if start == end {
        return vec![start];
    }

    let straight = start.distance(end);
    let mut open = BinaryHeap::new();
    let mut came_from: BTreeMap<HexCoord, HexCoord> = BTreeMap::new();
    let mut closed: BTreeSet<HexCoord> = BTreeSet::new();
    let mut seq = 0u64;

    open.push(PathNode {
        coord: start,
        parent: None,
        g: 0,
        f: straight as f32,
        seq,
    });

    while let Some(node) = open.pop() {
        if !closed.insert(node.coord) {
            continue;
        }
        if let Some(parent) = node.parent {
            came_from.insert(node.coord, parent);
        }

        if node.coord == end {
            let mut path = vec![end];
            let mut current = end;
            while let Some(&prev) = came_from.get(&current) {
                path.push(prev);
                current = prev;
            }
            path.reverse();
            debug!(%start, %end, len = path.len(), expanded = closed.len(), "elastic path found");
            return path;
        }

        for (_, next) in node.coord.neighbors() {
            if closed.contains(&next) || avoid.contains(&next) {
                continue;
            }
            if params.radius.map_or(false, |r| !next.in_radius(r)) {
                continue;
            }

            let g = node.g + 1;
            let h = next.distance(end);
            if (g + h) - straight > params.max_deviation {
                continue;
            }

            let bonus = rng.gen::<f32>() * params.elasticity;
            seq += 1;
            open.push(PathNode {
                coord: next,
                parent: Some(node.coord),
                g,
                f: (g + h) as f32 - bonus,
                seq,
            });
        }
    }

    debug!(%start, %end, "open set exhausted, walking straight");
    straight_line(start, end)
}

/// Greedy walk that always steps to the neighbour nearest `end`
pub fn straight_line(start: HexCoord, end: HexCoord) -> Vec<HexCoord> {
    let mut path = vec![start];
    let mut current = start;

    while current != end {
        let best = current
            .neighbors()
            .min_by_key(|(_, n)| n.distance(end))
            .map(|(_, n)| n);
        match best {
            Some(next) if next.distance(end) < current.distance(end) => {
                current = next;
                path.push(current);
            }
            _ => break,
        }
    }

    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params(elasticity: f32, max_deviation: i32) -> PathParams {
        PathParams {
            elasticity,
            max_deviation,
            radius: None,
        }
    }

    fn is_contiguous(path: &[HexCoord]) -> bool {
        path.windows(2).all(|w| w[0].distance(w[1]) == 1)
    }

    #[test]
    fn test_path_connects_endpoints() {
        let start = HexCoord::new(-4, 2);
        let end = HexCoord::new(5, -3);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let path = find_path(start, end, &BTreeSet::new(), params(0.3, 3), &mut rng);

        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        assert!(is_contiguous(&path));
        // steps beyond the straight distance stay within the deviation bound
        assert!(path.len() as i32 - 1 <= start.distance(end) + 3);
    }

    #[test]
    fn test_zero_elasticity_is_shortest() {
        let start = HexCoord::new(0, 0);
        let end = HexCoord::new(6, -2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let path = find_path(start, end, &BTreeSet::new(), params(0.0, 0), &mut rng);
        assert_eq!(path.len() as i32, start.distance(end) + 1);
    }

    #[test]
    fn test_avoids_blocked_cells() {
        let start = HexCoord::new(0, 0);
        let end = HexCoord::new(4, 0);
        let avoid: BTreeSet<HexCoord> = [HexCoord::new(2, 0), HexCoord::new(2, -1)].into_iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let path = find_path(start, end, &avoid, params(0.3, 3), &mut rng);

        assert_eq!(path.last(), Some(&end));
        assert!(is_contiguous(&path));
        assert!(path.iter().all(|c| !avoid.contains(c)));
    }

    #[test]
    fn test_falls_back_to_straight_line() {
        let start = HexCoord::new(0, 0);
        let end = HexCoord::new(3, 0);
        // wall off the start completely
        let avoid: BTreeSet<HexCoord> = start.neighbors().map(|(_, n)| n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let path = find_path(start, end, &avoid, params(0.3, 3), &mut rng);
        assert_eq!(path, straight_line(start, end));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_respects_radius() {
        let start = HexCoord::new(-3, 0);
        let end = HexCoord::new(3, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let p = PathParams {
            elasticity: 1.0,
            max_deviation: 6,
            radius: Some(3),
        };
        let path = find_path(start, end, &BTreeSet::new(), p, &mut rng);
        assert!(path.iter().all(|c| c.in_radius(3)));
        assert_eq!(path.last(), Some(&end));
    }

    #[test]
    fn test_same_start_and_end() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let c = HexCoord::new(2, 2);
        assert_eq!(find_path(c, c, &BTreeSet::new(), params(0.3, 3), &mut rng), vec![c]);
    }
}
