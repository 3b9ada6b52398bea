//! Minor anchors: small points of interest slotted along connectors

use std::fmt;

use serde::{Deserialize, Serialize};

use super::terrain::Terrain;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinorCategory {
    // Rest/services
    Inn,
    Tavern,
    Waystation,
    Camp,
    Caravanserai,
    // Crossings
    BridgeWood,
    BridgeStone,
    BridgeDwarf,
    FordImproved,
    Ferry,
    Tunnel,
    // Sacred
    Shrine,
    TempleSmall,
    StandingStone,
    SacredSpring,
    Memorial,
    // Military
    Watchtower,
    TollGate,
    BorderPost,
    SignalTower,
    // Economic
    MarketSmall,
    Mill,
    MineEntrance,
    LumberCamp,
    FishingVillage,
    // Mysterious
    HermitHut,
    WitchCottage,
    AbandonedCamp,
    UnmarkedGraves,
    AncientMarker,
}

impl MinorCategory {
    pub fn name(&self) -> &'static str {
        match self {
            MinorCategory::Inn => "inn",
            MinorCategory::Tavern => "tavern",
            MinorCategory::Waystation => "waystation",
            MinorCategory::Camp => "camp",
            MinorCategory::Caravanserai => "caravanserai",
            MinorCategory::BridgeWood => "bridge_wood",
            MinorCategory::BridgeStone => "bridge_stone",
            MinorCategory::BridgeDwarf => "bridge_dwarf",
            MinorCategory::FordImproved => "ford_improved",
            MinorCategory::Ferry => "ferry",
            MinorCategory::Tunnel => "tunnel",
            MinorCategory::Shrine => "shrine",
            MinorCategory::TempleSmall => "temple_small",
            MinorCategory::StandingStone => "standing_stone",
            MinorCategory::SacredSpring => "sacred_spring",
            MinorCategory::Memorial => "memorial",
            MinorCategory::Watchtower => "watchtower",
            MinorCategory::TollGate => "toll_gate",
            MinorCategory::BorderPost => "border_post",
            MinorCategory::SignalTower => "signal_tower",
            MinorCategory::MarketSmall => "market_small",
            MinorCategory::Mill => "mill",
            MinorCategory::MineEntrance => "mine_entrance",
            MinorCategory::LumberCamp => "lumber_camp",
            MinorCategory::FishingVillage => "fishing_village",
            MinorCategory::HermitHut => "hermit_hut",
            MinorCategory::WitchCottage => "witch_cottage",
            MinorCategory::AbandonedCamp => "abandoned_camp",
            MinorCategory::UnmarkedGraves => "unmarked_graves",
            MinorCategory::AncientMarker => "ancient_marker",
        }
    }

    /// "Bridge Wood" style display name
    pub fn title(&self) -> String {
        self.name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn provides_rest(&self) -> bool {
        matches!(self, MinorCategory::Inn | MinorCategory::Tavern | MinorCategory::Waystation)
    }

    pub fn provides_trade(&self) -> bool {
        matches!(self, MinorCategory::MarketSmall | MinorCategory::Caravanserai)
    }

    pub fn provides_information(&self) -> bool {
        matches!(self, MinorCategory::Shrine | MinorCategory::HermitHut)
    }

    pub fn blocks_passage(&self) -> bool {
        matches!(self, MinorCategory::TollGate | MinorCategory::BorderPost)
    }
}

impl fmt::Display for MinorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A small feature placed into a connector slot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinorAnchor {
    pub id: String,
    pub slot_id: String,
    pub category: MinorCategory,
    pub slot_contexts: Vec<String>,
    pub compatible_terrain: Vec<Terrain>,
    pub name_fragment: String,
    pub narrative_hook: String,
    pub provides_rest: bool,
    pub provides_trade: bool,
    pub provides_information: bool,
    pub blocks_passage: bool,
}

impl MinorAnchor {
    /// Build an anchor with service flags derived from its category
    pub fn new(
        id: impl Into<String>,
        slot_id: impl Into<String>,
        category: MinorCategory,
        terrain: Terrain,
        narrative_context: &str,
    ) -> Self {
        Self {
            id: id.into(),
            slot_id: slot_id.into(),
            category,
            slot_contexts: vec![narrative_context.to_string()],
            compatible_terrain: vec![terrain],
            name_fragment: format!("The {}", category.title()),
            narrative_hook: narrative_context.to_string(),
            provides_rest: category.provides_rest(),
            provides_trade: category.provides_trade(),
            provides_information: category.provides_information(),
            blocks_passage: category.blocks_passage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(MinorCategory::BridgeWood.title(), "Bridge Wood");
        assert_eq!(MinorCategory::Inn.title(), "Inn");
    }

    #[test]
    fn test_service_flags() {
        let a = MinorAnchor::new("a", "slot_1", MinorCategory::TollGate, Terrain::Plains, "Gate");
        assert!(a.blocks_passage);
        assert!(!a.provides_rest);
        assert_eq!(a.name_fragment, "The Toll Gate");
    }
}
