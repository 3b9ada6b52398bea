//! Terrain enumerations shared by every stage

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Concrete terrain of an assembled world hex
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    DeepWater,
    ShallowWater,
    Marsh,
    Plains,
    Hills,
    Forest,
    DenseForest,
    Mountains,
    HighMountains,
    Desert,
    Tundra,
    Volcanic,
    Glacier,
    Underground,
    Cavern,
}

impl Terrain {
    pub fn all() -> &'static [Terrain] {
        &[
            Terrain::DeepWater,
            Terrain::ShallowWater,
            Terrain::Marsh,
            Terrain::Plains,
            Terrain::Hills,
            Terrain::Forest,
            Terrain::DenseForest,
            Terrain::Mountains,
            Terrain::HighMountains,
            Terrain::Desert,
            Terrain::Tundra,
            Terrain::Volcanic,
            Terrain::Glacier,
            Terrain::Underground,
            Terrain::Cavern,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Terrain::DeepWater => "deep_water",
            Terrain::ShallowWater => "shallow_water",
            Terrain::Marsh => "marsh",
            Terrain::Plains => "plains",
            Terrain::Hills => "hills",
            Terrain::Forest => "forest",
            Terrain::DenseForest => "dense_forest",
            Terrain::Mountains => "mountains",
            Terrain::HighMountains => "high_mountains",
            Terrain::Desert => "desert",
            Terrain::Tundra => "tundra",
            Terrain::Volcanic => "volcanic",
            Terrain::Glacier => "glacier",
            Terrain::Underground => "underground",
            Terrain::Cavern => "cavern",
        }
    }

    /// Coarse terrain class used by the filler's transition table
    pub fn terrain_tag(&self) -> TerrainTag {
        match self {
            Terrain::Underground | Terrain::Cavern => TerrainTag::Underground,
            Terrain::DeepWater => TerrainTag::Underwater,
            Terrain::HighMountains => TerrainTag::Elevated,
            Terrain::ShallowWater
            | Terrain::Plains
            | Terrain::Hills
            | Terrain::Forest
            | Terrain::DenseForest
            | Terrain::Mountains
            | Terrain::Marsh
            | Terrain::Desert
            | Terrain::Tundra
            | Terrain::Volcanic
            | Terrain::Glacier => TerrainTag::Surface,
        }
    }

    /// Shallow water that a route has to ford or bridge
    pub fn is_water_crossing(&self) -> bool {
        matches!(self, Terrain::ShallowWater)
    }

    pub fn is_water(&self) -> bool {
        matches!(self, Terrain::DeepWater | Terrain::ShallowWater)
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coarse terrain class carried as a tag on content hexes.
///
/// The first four are the TERRAIN tag category; `elevated` and `peak`
/// also appear as elevation tags and give the filler high ground to collapse to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainTag {
    Underground,
    Surface,
    Underwater,
    Aerial,
    Elevated,
    Peak,
}

impl TerrainTag {
    pub fn all() -> &'static [TerrainTag] {
        &[
            TerrainTag::Underground,
            TerrainTag::Surface,
            TerrainTag::Underwater,
            TerrainTag::Aerial,
            TerrainTag::Elevated,
            TerrainTag::Peak,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TerrainTag::Underground => "underground",
            TerrainTag::Surface => "surface",
            TerrainTag::Underwater => "underwater",
            TerrainTag::Aerial => "aerial",
            TerrainTag::Elevated => "elevated",
            TerrainTag::Peak => "peak",
        }
    }

    /// Concrete terrain a filler hex of this class becomes
    pub fn terrain(&self) -> Terrain {
        match self {
            TerrainTag::Surface => Terrain::Plains,
            TerrainTag::Underground => Terrain::Underground,
            TerrainTag::Underwater => Terrain::DeepWater,
            TerrainTag::Aerial => Terrain::HighMountains,
            TerrainTag::Elevated => Terrain::Hills,
            TerrainTag::Peak => Terrain::HighMountains,
        }
    }
}

impl fmt::Display for TerrainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TerrainTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TerrainTag::all()
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Tag categories of the tag vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagCategory {
    Terrain,
    Culture,
    Function,
    Elevation,
}

/// How suitable a location is for each species (0.0-1.0)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesFitness {
    pub human: f32,
    pub dwarf: f32,
    pub elf: f32,
}

impl SpeciesFitness {
    pub fn neutral() -> Self {
        Self { human: 0.5, dwarf: 0.5, elf: 0.5 }
    }

    /// Rough fitness from terrain
    pub fn for_terrain(terrain: Terrain) -> Self {
        match terrain {
            Terrain::Underground | Terrain::Cavern => Self { human: 0.2, dwarf: 0.9, elf: 0.1 },
            Terrain::Mountains | Terrain::HighMountains => Self { human: 0.3, dwarf: 0.8, elf: 0.2 },
            Terrain::Forest | Terrain::DenseForest => Self { human: 0.5, dwarf: 0.2, elf: 0.9 },
            Terrain::Plains | Terrain::Hills => Self { human: 0.9, dwarf: 0.4, elf: 0.5 },
            Terrain::DeepWater | Terrain::Glacier | Terrain::Volcanic => {
                Self { human: 0.05, dwarf: 0.1, elf: 0.05 }
            }
            Terrain::ShallowWater
            | Terrain::Marsh
            | Terrain::Desert
            | Terrain::Tundra => Self { human: 0.4, dwarf: 0.3, elf: 0.3 },
        }
    }
}

impl Default for SpeciesFitness {
    fn default() -> Self {
        Self::neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_tag_parse() {
        for tag in TerrainTag::all() {
            assert_eq!(tag.name().parse::<TerrainTag>().unwrap(), *tag);
        }
        assert!("lava".parse::<TerrainTag>().is_err());
    }

    #[test]
    fn test_filler_terrain_maps_back_to_class() {
        // Every class except the aliases of high mountains survives a round trip
        for tag in [TerrainTag::Surface, TerrainTag::Underground, TerrainTag::Underwater] {
            assert_eq!(tag.terrain().terrain_tag(), tag);
        }
        assert_eq!(Terrain::Cavern.terrain_tag(), TerrainTag::Underground);
    }

    #[test]
    fn test_serde_names_match() {
        for t in Terrain::all() {
            let json = serde_json::to_string(t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.name()));
        }
    }
}
