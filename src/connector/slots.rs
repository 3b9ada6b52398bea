//! Per-type sampling, anchor slots and entry points

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::schema::{ConnectorHex, ConnectorType, EntryPoint, MinorAnchorSlot, MinorCategory, Terrain};

/// Elevation jump between consecutive hexes that marks a pass
const PASS_ELEVATION_STEP: f32 = 100.0;

const ENDPOINT_CATEGORIES: &[MinorCategory] =
    &[MinorCategory::Waystation, MinorCategory::TollGate, MinorCategory::BorderPost];

const CROSSING_CATEGORIES: &[MinorCategory] = &[
    MinorCategory::BridgeWood,
    MinorCategory::BridgeStone,
    MinorCategory::FordImproved,
    MinorCategory::Ferry,
];

const PASS_CATEGORIES: &[MinorCategory] = &[MinorCategory::Watchtower, MinorCategory::Shrine, MinorCategory::Camp];

pub fn base_terrain(connector_type: ConnectorType) -> Terrain {
    use ConnectorType::*;
    match connector_type {
        RiverHeadwaters | RiverUpper | RiverMiddle | RiverFull => Terrain::ShallowWater,
        RiverLower | RiverDelta => Terrain::DeepWater,
        LakeShore | MarshSystem => Terrain::Marsh,
        Coastline => Terrain::ShallowWater,
        MountainPass | MountainRangeMinor | MountainSpur => Terrain::Mountains,
        MountainRangeMajor => Terrain::HighMountains,
        Highland => Terrain::Hills,
        ForestBandDense | AncientForest => Terrain::DenseForest,
        ForestBandLight | ForestEdge => Terrain::Forest,
        DesertEdge => Terrain::Desert,
        TundraBand => Terrain::Tundra,
        TradeRouteMajor | TradeRouteMinor | MilitaryRoad | PilgrimPath | PlainsBand => Terrain::Plains,
    }
}

/// Elevation of hex `index` out of `total`
///
/// Rivers fall linearly from 500 toward 200; passes sit high; everything
/// else jitters between 200 and 300.
pub fn sample_elevation(connector_type: ConnectorType, index: usize, total: usize, rng: &mut ChaCha8Rng) -> f32 {
    if connector_type.is_river() {
        return 500.0 - (index as f32 / total.max(1) as f32) * 300.0;
    }
    match connector_type {
        ConnectorType::MountainPass => 600.0 + rng.gen::<f32>() * 400.0,
        _ => 200.0 + rng.gen::<f32>() * 100.0,
    }
}

pub fn sample_moisture(connector_type: ConnectorType, rng: &mut ChaCha8Rng) -> f32 {
    if connector_type.is_river() {
        0.9
    } else {
        0.4 + rng.gen::<f32>() * 0.2
    }
}

/// Hexes between regular stopping points
pub fn anchor_interval(connector_type: ConnectorType) -> usize {
    match connector_type {
        ConnectorType::TradeRouteMajor => 8,
        ConnectorType::TradeRouteMinor => 12,
        ConnectorType::MilitaryRoad => 10,
        ConnectorType::PilgrimPath => 6,
        _ => 10,
    }
}

/// Categories suited to a regular stopping point on this kind of route
pub fn stop_categories(connector_type: ConnectorType) -> Vec<MinorCategory> {
    let mut categories = vec![MinorCategory::Camp, MinorCategory::Shrine];
    let extra: &[MinorCategory] = match connector_type {
        ConnectorType::TradeRouteMajor | ConnectorType::TradeRouteMinor => &[
            MinorCategory::Inn,
            MinorCategory::Tavern,
            MinorCategory::MarketSmall,
            MinorCategory::Caravanserai,
        ],
        ConnectorType::MilitaryRoad => &[
            MinorCategory::Watchtower,
            MinorCategory::SignalTower,
            MinorCategory::BorderPost,
        ],
        ConnectorType::PilgrimPath => &[MinorCategory::TempleSmall, MinorCategory::SacredSpring],
        _ => &[],
    };
    categories.extend_from_slice(extra);
    categories
}

/// Slots at both ends, at a fixed stride, at water crossings and at passes
///
/// Marks every slotted hex with `is_slot`.
pub fn anchor_slots(hexes: &mut [ConnectorHex], connector_type: ConnectorType) -> Vec<MinorAnchorSlot> {
    let mut slots = Vec::new();
    if hexes.is_empty() {
        return slots;
    }
    let last = hexes.len() - 1;

    slots.push(slot("slot_start".to_string(), 0, ENDPOINT_CATEGORIES.to_vec(), false, "Connector entrance"));
    slots.push(slot("slot_end".to_string(), last, ENDPOINT_CATEGORIES.to_vec(), false, "Connector terminus"));

    let interval = anchor_interval(connector_type);
    for i in (interval..last).step_by(interval) {
        slots.push(slot(
            format!("slot_{}", i),
            i,
            stop_categories(connector_type),
            false,
            "Regular stopping point",
        ));
    }

    for i in 1..last {
        if hexes[i].terrain.is_water_crossing() {
            slots.push(slot(
                format!("slot_crossing_{}", i),
                i,
                CROSSING_CATEGORIES.to_vec(),
                true,
                "River crossing",
            ));
        }
        if (hexes[i].elevation - hexes[i - 1].elevation).abs() > PASS_ELEVATION_STEP {
            slots.push(slot(
                format!("slot_pass_{}", i),
                i,
                PASS_CATEGORIES.to_vec(),
                false,
                "Mountain pass or significant elevation",
            ));
        }
    }

    for s in &slots {
        hexes[s.hex_index].is_slot = true;
    }
    slots
}

fn slot(slot_id: String, hex_index: usize, categories: Vec<MinorCategory>, required: bool, context: &str) -> MinorAnchorSlot {
    MinorAnchorSlot {
        slot_id,
        hex_index,
        compatible_categories: categories,
        required,
        narrative_context: context.to_string(),
    }
}

/// Termini at both ends; marks them with `is_entry_point`
pub fn entry_points(hexes: &mut [ConnectorHex]) -> Vec<EntryPoint> {
    if hexes.is_empty() {
        return Vec::new();
    }
    let last = hexes.len() - 1;
    hexes[0].is_entry_point = true;
    hexes[last].is_entry_point = true;

    [(0, "start"), (last, "end")]
        .iter()
        .map(|&(i, direction)| EntryPoint {
            hex_index: i,
            direction: direction.to_string(),
            elevation: hexes[i].elevation,
            terrain: hexes[i].terrain,
            is_terminus: true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SpeciesFitness;
    use rand::SeedableRng;

    fn hexes(terrains: &[Terrain], elevations: &[f32]) -> Vec<ConnectorHex> {
        terrains
            .iter()
            .zip(elevations)
            .enumerate()
            .map(|(i, (&terrain, &elevation))| ConnectorHex {
                index: i,
                coord: None,
                terrain,
                elevation,
                moisture: 0.5,
                temperature: 15.0,
                species_fitness: SpeciesFitness::neutral(),
                connects_to: Vec::new(),
                is_entry_point: false,
                is_slot: false,
            })
            .collect()
    }

    #[test]
    fn test_river_elevation_descends() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let values: Vec<f32> = (0..20)
            .map(|i| sample_elevation(ConnectorType::RiverMiddle, i, 20, &mut rng))
            .collect();
        assert_eq!(values[0], 500.0);
        assert!(values.windows(2).all(|w| w[1] <= w[0]));
        assert!(values.iter().all(|v| *v > 200.0));
    }

    #[test]
    fn test_road_sampling_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for i in 0..50 {
            let e = sample_elevation(ConnectorType::TradeRouteMajor, i, 50, &mut rng);
            assert!((200.0..=300.0).contains(&e));
            let m = sample_moisture(ConnectorType::TradeRouteMajor, &mut rng);
            assert!((0.4..=0.6).contains(&m));
        }
        assert_eq!(sample_moisture(ConnectorType::RiverUpper, &mut rng), 0.9);
    }

    #[test]
    fn test_crossing_slot_required() {
        let terrains = [Terrain::Plains, Terrain::Plains, Terrain::ShallowWater, Terrain::Plains, Terrain::Plains];
        let mut chain = hexes(&terrains, &[200.0; 5]);
        let slots = anchor_slots(&mut chain, ConnectorType::TradeRouteMajor);

        let crossing = slots.iter().find(|s| s.slot_id == "slot_crossing_2").unwrap();
        assert!(crossing.required);
        assert_eq!(crossing.hex_index, 2);
        assert!(crossing.compatible_categories.contains(&MinorCategory::Ferry));
        assert!(chain[2].is_slot);
        // only the crossing is required
        assert_eq!(slots.iter().filter(|s| s.required).count(), 1);
    }

    #[test]
    fn test_interval_and_pass_slots() {
        let n = 20;
        let mut elevations = vec![250.0; n];
        elevations[5] = 400.0;
        let mut chain = hexes(&vec![Terrain::Plains; n], &elevations);
        let slots = anchor_slots(&mut chain, ConnectorType::PilgrimPath);
        let ids: Vec<&str> = slots.iter().map(|s| s.slot_id.as_str()).collect();

        assert_eq!(&ids[..2], &["slot_start", "slot_end"]);
        assert!(ids.contains(&"slot_6") && ids.contains(&"slot_12") && ids.contains(&"slot_18"));
        // the jump up and the jump back down
        assert!(ids.contains(&"slot_pass_5") && ids.contains(&"slot_pass_6"));
        let stop = slots.iter().find(|s| s.slot_id == "slot_6").unwrap();
        assert!(stop.compatible_categories.contains(&MinorCategory::TempleSmall));
    }

    #[test]
    fn test_entry_points_at_both_ends() {
        let mut chain = hexes(&[Terrain::Plains, Terrain::Hills, Terrain::Forest], &[1.0, 2.0, 3.0]);
        let points = entry_points(&mut chain);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].hex_index, 2);
        assert_eq!(points[1].terrain, Terrain::Forest);
        assert!(chain[0].is_entry_point && chain[2].is_entry_point && !chain[1].is_entry_point);
    }
}
