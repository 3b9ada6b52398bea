//! Minor anchor placement along connectors

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::schema::{ConnectorCollection, MinorAnchor, MinorAnchorSlot};

/// Fills a connector's slots with anchors
///
/// Implementations may return anchors for any subset of the slots; the
/// assembler drops anchors whose slot id it does not know.
pub trait AnchorPlacer {
    fn place(&self, connector: &ConnectorCollection, rng: &mut ChaCha8Rng) -> Vec<MinorAnchor>;
}

/// Deterministic placement from slot rules
///
/// Every required slot gets its first compatible category. Optional slots
/// are then taken in order, at least `min_spacing` hexes from any anchor
/// already placed, with a random compatible category, until the connector
/// holds `max_anchors`.
#[derive(Clone, Copy, Debug)]
pub struct RuleBasedAnchors {
    pub max_anchors: usize,
    pub min_spacing: usize,
}

impl Default for RuleBasedAnchors {
    fn default() -> Self {
        Self {
            max_anchors: 5,
            min_spacing: 3,
        }
    }
}

impl RuleBasedAnchors {
    pub fn new(max_anchors: usize) -> Self {
        Self {
            max_anchors,
            ..Self::default()
        }
    }

    fn anchor(connector: &ConnectorCollection, slot: &MinorAnchorSlot, pick_first: bool, rng: &mut ChaCha8Rng) -> Option<MinorAnchor> {
        let category = if pick_first {
            slot.compatible_categories.first()
        } else {
            slot.compatible_categories.choose(rng)
        }?;
        let terrain = connector.hexes.get(slot.hex_index)?.terrain;
        Some(MinorAnchor::new(
            format!("anchor_{}_{}", connector.id, slot.slot_id),
            slot.slot_id.clone(),
            *category,
            terrain,
            &slot.narrative_context,
        ))
    }
}

impl AnchorPlacer for RuleBasedAnchors {
    fn place(&self, connector: &ConnectorCollection, rng: &mut ChaCha8Rng) -> Vec<MinorAnchor> {
        let mut anchors = Vec::new();
        let mut used: Vec<usize> = Vec::new();

        for slot in connector.minor_slots.iter().filter(|s| s.required) {
            if let Some(anchor) = Self::anchor(connector, slot, true, rng) {
                used.push(slot.hex_index);
                anchors.push(anchor);
            }
        }

        for slot in connector.minor_slots.iter().filter(|s| !s.required) {
            if anchors.len() >= self.max_anchors {
                break;
            }
            let crowded = used.iter().any(|&i| i.abs_diff(slot.hex_index) < self.min_spacing);
            if crowded {
                continue;
            }
            if let Some(anchor) = Self::anchor(connector, slot, false, rng) {
                used.push(slot.hex_index);
                anchors.push(anchor);
            }
        }

        debug!(connector = %connector.id, anchors = anchors.len(), slots = connector.minor_slots.len(), "anchors placed");
        anchors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectorGenerator, ConnectorRequest};
    use crate::hex::HexCoord;
    use crate::schema::{ConnectorType, MinorCategory};
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn connector(kind: ConnectorType) -> ConnectorCollection {
        let avoid = BTreeSet::new();
        let request = ConnectorRequest {
            id: "c1",
            connector_type: kind,
            start: HexCoord::new(-10, 0),
            end: HexCoord::new(10, 0),
            avoid: &avoid,
            elastic_segments: &[],
        };
        ConnectorGenerator::default().generate(&request, &mut ChaCha8Rng::seed_from_u64(42))
    }

    #[test]
    fn test_required_slots_always_covered() {
        let river = connector(ConnectorType::RiverMiddle);
        let required: Vec<&str> = river
            .minor_slots
            .iter()
            .filter(|s| s.required)
            .map(|s| s.slot_id.as_str())
            .collect();
        assert!(required.len() > 5);

        let anchors = RuleBasedAnchors::new(2).place(&river, &mut ChaCha8Rng::seed_from_u64(1));
        for id in &required {
            let anchor = anchors.iter().find(|a| a.slot_id == *id).unwrap();
            assert_eq!(anchor.category, MinorCategory::BridgeWood);
        }
    }

    #[test]
    fn test_optional_slots_capped_and_spaced() {
        let road = connector(ConnectorType::TradeRouteMajor);
        let anchors = RuleBasedAnchors::new(3).place(&road, &mut ChaCha8Rng::seed_from_u64(1));
        assert!(!anchors.is_empty() && anchors.len() <= 3);
        assert_eq!(anchors[0].slot_id, "slot_start");

        for anchor in &anchors {
            let slot = road.slot(&anchor.slot_id).unwrap();
            assert!(slot.compatible_categories.contains(&anchor.category));
            assert!(anchor.id.starts_with("anchor_c1_"));
        }
    }

    #[test]
    fn test_zero_budget_places_nothing_optional() {
        let road = connector(ConnectorType::MilitaryRoad);
        let anchors = RuleBasedAnchors::new(0).place(&road, &mut ChaCha8Rng::seed_from_u64(1));
        assert!(anchors.is_empty());
    }
}
