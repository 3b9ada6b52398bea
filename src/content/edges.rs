//! Edge post-processing for generated hexes

use crate::params::EdgeMode;
use crate::schema::{EdgeType, TaggedHex};

/// Applies an [`EdgeMode`] to freshly generated content
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeHandler {
    pub mode: EdgeMode,
}

impl EdgeHandler {
    pub fn new(mode: EdgeMode) -> Self {
        Self { mode }
    }

    /// Return the hex with edges processed; the input is left untouched
    pub fn process(&self, hex: &TaggedHex) -> TaggedHex {
        match self.mode {
            EdgeMode::Explicit => hex.clone(),
            EdgeMode::Derived => derive_edges(hex),
            EdgeMode::Hybrid => fix_conflicting_edges(hex),
        }
    }
}

/// Edge type implied by the hex's terrain tag
fn base_edge(hex: &TaggedHex) -> EdgeType {
    if hex.has_tag("underground") {
        EdgeType::Tunnel
    } else if hex.has_tag("underwater") {
        EdgeType::Water
    } else if hex.has_tag("aerial") {
        EdgeType::Blocked
    } else {
        EdgeType::Wilderness
    }
}

/// Edge types a terrain tag rules out
fn conflicts(tag: &str) -> &'static [EdgeType] {
    match tag {
        "underground" => &[EdgeType::Road, EdgeType::Wilderness],
        "underwater" => &[EdgeType::Road, EdgeType::Tunnel],
        "aerial" => &[EdgeType::Tunnel, EdgeType::Water],
        _ => &[],
    }
}

/// Infer every edge from tags
pub fn derive_edges(hex: &TaggedHex) -> TaggedHex {
    let base = base_edge(hex);
    let mut edges = [base; 6];

    // passage keeps every edge open
    if !hex.has_tag("passage") && hex.has_tag("dead_end") {
        edges = [EdgeType::Blocked; 6];
        edges[0] = base;
    }
    if hex.has_tag("entrance") {
        edges[0] = EdgeType::Entrance;
    }

    TaggedHex {
        edge_types: edges,
        ..hex.clone()
    }
}

/// Replace edge types that contradict the terrain tags
pub fn fix_conflicting_edges(hex: &TaggedHex) -> TaggedHex {
    let forbidden: Vec<EdgeType> = hex.tags.iter().flat_map(|t| conflicts(t).iter().copied()).collect();
    if forbidden.is_empty() {
        return hex.clone();
    }

    let replacement = if hex.has_tag("underground") {
        EdgeType::Tunnel
    } else if hex.has_tag("underwater") {
        EdgeType::Water
    } else if hex.has_tag("surface") {
        EdgeType::Wilderness
    } else {
        EdgeType::Blocked
    };

    let mut out = hex.clone();
    for edge in out.edge_types.iter_mut() {
        if forbidden.contains(edge) {
            *edge = replacement;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::HexCoord;
    use EdgeType::*;

    fn hex(tags: &[&str], edges: [EdgeType; 6]) -> TaggedHex {
        TaggedHex::new(HexCoord::ORIGIN, "h", "d", tags, edges)
    }

    #[test]
    fn test_explicit_keeps_edges() {
        let h = hex(&["underground"], [Road; 6]);
        assert_eq!(EdgeHandler::new(EdgeMode::Explicit).process(&h), h);
    }

    #[test]
    fn test_derived_underground_is_all_tunnel() {
        let h = hex(&["underground", "dwarf"], [Road, Wilderness, Blocked, Water, Entrance, Road]);
        let out = EdgeHandler::new(EdgeMode::Derived).process(&h);
        assert_eq!(out.edge_types, [Tunnel; 6]);
        // input untouched
        assert_eq!(h.edge_types[0], Road);
    }

    #[test]
    fn test_derived_dead_end_and_entrance() {
        let dead_end = derive_edges(&hex(&["surface", "dead_end"], [Road; 6]));
        assert_eq!(dead_end.edge_types, [Wilderness, Blocked, Blocked, Blocked, Blocked, Blocked]);

        let gate = derive_edges(&hex(&["underwater", "entrance"], [Road; 6]));
        assert_eq!(gate.edge_types[0], Entrance);
        assert_eq!(gate.edge_types[1], Water);
    }

    #[test]
    fn test_hybrid_replaces_conflicts_only() {
        let h = hex(&["underground"], [Road, Wilderness, Tunnel, Blocked, Entrance, Water]);
        let out = fix_conflicting_edges(&h);
        assert_eq!(out.edge_types, [Tunnel, Tunnel, Tunnel, Blocked, Entrance, Water]);

        let sky = fix_conflicting_edges(&hex(&["aerial"], [Tunnel, Water, Road, Road, Road, Road]));
        assert_eq!(sky.edge_types[0], Blocked);
        assert_eq!(sky.edge_types[2], Road);
    }
}
