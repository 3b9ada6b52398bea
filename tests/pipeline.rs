use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use hexworld::export::{load_hex_map, save_hex_map, validate_hex_map};
use hexworld::hex::{disc_size, opposite_edge};
use hexworld::schema::{AssembledWorld, ClusterPlacement, ConnectorAssignment, ConnectorType, WorldSeed};
use hexworld::{GenerationParams, HexCoord, TagConfig, WorldAssembler};

fn assembler() -> WorldAssembler {
    let config = Arc::new(TagConfig::builtin().unwrap());
    WorldAssembler::offline(config, GenerationParams::default())
}

fn five_towns(seed_id: u64) -> WorldSeed {
    let mut seed = WorldSeed::new(seed_id, 40);
    for name in ["ashby", "brook", "crag", "dunmere", "eldham"] {
        seed.clusters.push(ClusterPlacement::settlement("market_town", name));
    }
    seed.connectors.push(ConnectorAssignment::between("ab", ConnectorType::TradeRouteMajor, "ashby", "brook"));
    seed.connectors.push(ConnectorAssignment::between("bc", ConnectorType::MilitaryRoad, "brook", "crag"));
    seed.connectors.push(ConnectorAssignment::between("cd", ConnectorType::RiverMiddle, "crag", "dunmere"));
    seed.connectors.push(ConnectorAssignment::between("de", ConnectorType::PilgrimPath, "dunmere", "eldham"));
    seed
}

fn build(seed: &WorldSeed) -> AssembledWorld {
    assembler().assemble(seed).unwrap()
}

#[test]
fn test_same_seed_same_world() {
    let seed = five_towns(42);
    let a = build(&seed);
    let b = build(&seed);

    assert_eq!(a.hex_map.cluster_positions, b.hex_map.cluster_positions);
    assert_eq!(a.hex_map, b.hex_map);
    assert_eq!(a.connectors, b.connectors);
    assert_eq!(a.anchors, b.anchors);
}

#[test]
fn test_different_seed_different_layout() {
    let a = build(&five_towns(1));
    let b = build(&five_towns(2));
    assert_ne!(a.hex_map.cluster_positions, b.hex_map.cluster_positions);
}

#[test]
fn test_cluster_footprints_do_not_overlap() {
    let world = build(&five_towns(7));
    let map = &world.hex_map;

    let mut seen = BTreeSet::new();
    for (id, cluster) in &map.clusters {
        let position = map.cluster_positions[id];
        for cell in cluster.cells_at(position) {
            assert!(cell.in_radius(map.world_radius));
            assert!(seen.insert(cell), "cell {} claimed twice", cell);
            assert_eq!(map.get(cell).unwrap().cluster_id.as_deref(), Some(id.as_str()));
        }
    }
}

#[test]
fn test_full_coverage_and_bounds() {
    let world = build(&five_towns(9));
    let map = &world.hex_map;

    assert_eq!(map.len(), disc_size(40));
    let report = validate_hex_map(map);
    assert!(report.missing.is_empty());
    assert!(report.out_of_bounds.is_empty());
}

#[test]
fn test_cluster_edges_symmetric() {
    let world = build(&five_towns(11));
    let map = &world.hex_map;
    assert!(validate_hex_map(map).edge_mismatches.is_empty());

    // same check spelled out for one cluster
    let cluster = &map.clusters["ashby"];
    let content = cluster.content.as_ref().unwrap();
    for hex in &content.hexes {
        for (edge, n) in hex.coord().neighbors() {
            if let Some(other) = content.hex_at(n) {
                let (a, b) = (hex.edge_types[edge], other.edge_types[opposite_edge(edge)]);
                if a.must_match() || b.must_match() {
                    assert_eq!(a, b, "{} -> {}", hex.coord(), n);
                }
            }
        }
    }
}

#[test]
fn test_clusters_connected() {
    let world = build(&five_towns(13));
    for cluster in world.hex_map.clusters.values() {
        let cells: BTreeSet<HexCoord> = cluster.footprint.iter().map(|&c| HexCoord::from(c)).collect();
        let start = *cells.iter().next().unwrap();

        let mut visited = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(c) = queue.pop_front() {
            for (_, n) in c.neighbors() {
                if cells.contains(&n) && visited.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        assert_eq!(visited.len(), cells.len(), "cluster {} is split", cluster.instance_id);
    }
}

#[test]
fn test_connectors_reach_their_clusters() {
    let world = build(&five_towns(17));
    let map = &world.hex_map;
    assert_eq!(world.connectors.len(), 4);

    for connector in &world.connectors {
        let coords: Vec<HexCoord> = connector.coords().collect();
        assert!(coords.windows(2).all(|w| w[0].distance(w[1]) == 1));
        assert!(connector.entry_points.len() == 2);
        assert!(world.anchors.contains_key(&connector.id));
    }

    let ab = world.connectors.iter().find(|c| c.id == "ab").unwrap();
    assert_eq!(ab.coords().next(), Some(map.cluster_positions["ashby"]));
    assert_eq!(ab.coords().last(), Some(map.cluster_positions["brook"]));
}

#[test]
fn test_required_anchor_slots_filled() {
    let world = build(&five_towns(19));
    for connector in &world.connectors {
        let anchors = &world.anchors[&connector.id];
        for slot in connector.minor_slots.iter().filter(|s| s.required) {
            assert!(anchors.iter().any(|a| a.slot_id == slot.slot_id), "{} unfilled", slot.slot_id);
        }
    }
}

#[test]
fn test_save_and_load_hex_map() {
    let world = build(&WorldSeed::demo(21));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world_map.json");

    save_hex_map(&world.hex_map, &path).unwrap();
    let loaded = load_hex_map(&path).unwrap();
    assert_eq!(loaded, world.hex_map);
    assert!(loaded.get_by_key("0,0").is_some());
}
