//! Declarative tag configuration
//!
//! The tag vocabulary, adjacency constraints and filler transition table are
//! read once from TOML (`data/hex_tags.toml` is embedded as the default) and
//! converted into a typed, validated [`TagConfig`]. Nothing mutates it after
//! loading; stages share it behind an `Arc`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::schema::{TagCategory, TerrainTag};

const DEFAULT_TAGS: &str = include_str!("../data/hex_tags.toml");

// ---------------------------------------------------------------------------
// Raw layer: mirrors the TOML document
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    categories: BTreeMap<String, RawCategory>,
    #[serde(default)]
    constraints: RawConstraints,
    #[serde(default)]
    transitions: RawTransitions,
    #[serde(default)]
    filler: RawFiller,
}

#[derive(Debug, Default, Deserialize)]
struct RawCategory {
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConstraints {
    #[serde(default)]
    hard: RawHard,
    #[serde(default)]
    soft: RawSoft,
}

#[derive(Debug, Default, Deserialize)]
struct RawHard {
    #[serde(default)]
    incompatible_terrain: Vec<Vec<String>>,
    #[serde(default)]
    requires: Vec<RawRequirement>,
}

#[derive(Debug, Deserialize)]
struct RawRequirement {
    tag: String,
    requires: Option<String>,
    requires_one_of: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSoft {
    #[serde(default)]
    culture_tensions: Vec<Vec<String>>,
    #[serde(default)]
    function_clashes: Vec<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTransitions {
    #[serde(default)]
    allowed: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    weights: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFiller {
    #[serde(default)]
    profiles: BTreeMap<String, RawProfile>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    elevation: Option<[f32; 2]>,
    moisture: Option<[f32; 2]>,
    temperature: Option<f32>,
}

// ---------------------------------------------------------------------------
// Typed layer
// ---------------------------------------------------------------------------

/// A tag that only makes sense alongside other tags
#[derive(Clone, Debug, PartialEq)]
pub struct Requirement {
    pub tag: String,
    pub requires: Option<String>,
    pub requires_one_of: Vec<String>,
}

/// Value ranges used when materializing a filler hex of one terrain class
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillerProfile {
    pub elevation: (f32, f32),
    pub moisture: (f32, f32),
    pub temperature: f32,
}

impl FillerProfile {
    /// Built-in ranges per terrain class
    pub fn builtin(tag: TerrainTag) -> Self {
        let elevation = match tag {
            TerrainTag::Elevated => (400.0, 600.0),
            TerrainTag::Peak => (800.0, 1200.0),
            TerrainTag::Underground => (-300.0, -100.0),
            TerrainTag::Surface | TerrainTag::Underwater | TerrainTag::Aerial => (100.0, 200.0),
        };
        Self {
            elevation,
            moisture: (0.4, 0.6),
            temperature: 15.0,
        }
    }
}

/// Unordered pair of tags
type TagPair = (String, String);

fn pair_of(a: &str, b: &str) -> TagPair {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Validated tag configuration
#[derive(Clone, Debug)]
pub struct TagConfig {
    categories: BTreeMap<TagCategory, Vec<String>>,
    incompatible_terrain: BTreeSet<(TerrainTag, TerrainTag)>,
    requirements: Vec<Requirement>,
    culture_tensions: BTreeSet<TagPair>,
    function_clashes: BTreeSet<TagPair>,
    transitions: BTreeMap<TerrainTag, BTreeSet<TerrainTag>>,
    weights: BTreeMap<(TerrainTag, TerrainTag), f64>,
    profiles: BTreeMap<TerrainTag, FillerProfile>,
}

impl TagConfig {
    /// Configuration embedded in the crate
    pub fn builtin() -> std::result::Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_TAGS)
    }

    /// Load and validate a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.as_ref().display(), "loaded tag configuration");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> std::result::Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> std::result::Result<Self, ConfigError> {
        let mut categories = BTreeMap::new();
        for (name, category) in raw.categories {
            let key = match name.to_ascii_lowercase().as_str() {
                "terrain" => TagCategory::Terrain,
                "culture" => TagCategory::Culture,
                "function" => TagCategory::Function,
                "elevation" => TagCategory::Elevation,
                other => {
                    debug!(category = other, "ignoring unknown tag category");
                    continue;
                }
            };
            categories.insert(key, category.values);
        }

        if let Some(terrain) = categories.get(&TagCategory::Terrain) {
            for value in terrain {
                parse_terrain(value)?;
            }
        }

        let mut incompatible_terrain = BTreeSet::new();
        for pair in &raw.constraints.hard.incompatible_terrain {
            let [a, b] = two(pair)?;
            let (a, b) = (parse_terrain(a)?, parse_terrain(b)?);
            incompatible_terrain.insert((a.min(b), a.max(b)));
        }

        let mut requirements = Vec::new();
        for req in raw.constraints.hard.requires {
            if req.requires.is_none() && req.requires_one_of.as_ref().map_or(true, Vec::is_empty) {
                return Err(ConfigError::EmptyRequirement(req.tag));
            }
            requirements.push(Requirement {
                tag: req.tag,
                requires: req.requires,
                requires_one_of: req.requires_one_of.unwrap_or_default(),
            });
        }

        let culture_tensions = pair_set(&raw.constraints.soft.culture_tensions)?;
        let function_clashes = pair_set(&raw.constraints.soft.function_clashes)?;

        let mut transitions = BTreeMap::new();
        for (from, targets) in &raw.transitions.allowed {
            let from = parse_terrain(from)?;
            let targets = targets
                .iter()
                .map(|t| parse_terrain(t))
                .collect::<std::result::Result<BTreeSet<_>, _>>()?;
            transitions.insert(from, targets);
        }

        let mut weights = BTreeMap::new();
        for (from, row) in &raw.transitions.weights {
            let from_tag = parse_terrain(from)?;
            for (to, &weight) in row {
                if !weight.is_finite() || weight < 0.0 {
                    return Err(ConfigError::BadWeight {
                        from: from.clone(),
                        to: to.clone(),
                        weight,
                    });
                }
                weights.insert((from_tag, parse_terrain(to)?), weight);
            }
        }

        let mut profiles = BTreeMap::new();
        for (name, profile) in &raw.filler.profiles {
            let tag = parse_terrain(name)?;
            let base = FillerProfile::builtin(tag);
            let elevation = checked_range(name, profile.elevation)?.unwrap_or(base.elevation);
            let moisture = checked_range(name, profile.moisture)?.unwrap_or(base.moisture);
            profiles.insert(
                tag,
                FillerProfile {
                    elevation,
                    moisture,
                    temperature: profile.temperature.unwrap_or(base.temperature),
                },
            );
        }

        Ok(Self {
            categories,
            incompatible_terrain,
            requirements,
            culture_tensions,
            function_clashes,
            transitions,
            weights,
            profiles,
        })
    }

    /// Allowed values of one category
    pub fn values(&self, category: TagCategory) -> &[String] {
        self.categories.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn category_of(&self, tag: &str) -> Option<TagCategory> {
        self.categories
            .iter()
            .find(|(_, values)| values.iter().any(|v| v == tag))
            .map(|(category, _)| *category)
    }

    /// The first tag found in the terrain category
    pub fn terrain_tag_of(&self, tags: &[String]) -> Option<TerrainTag> {
        let terrain = self.values(TagCategory::Terrain);
        tags.iter()
            .find(|t| terrain.contains(*t))
            .and_then(|t| t.parse().ok())
    }

    pub fn tags_in<'a>(&self, category: TagCategory, tags: &'a [String]) -> Vec<&'a str> {
        let values = self.values(category);
        tags.iter()
            .filter(|t| values.contains(*t))
            .map(String::as_str)
            .collect()
    }

    pub fn culture_tags<'a>(&self, tags: &'a [String]) -> Vec<&'a str> {
        self.tags_in(TagCategory::Culture, tags)
    }

    pub fn function_tags<'a>(&self, tags: &'a [String]) -> Vec<&'a str> {
        self.tags_in(TagCategory::Function, tags)
    }

    pub fn terrain_incompatible(&self, a: TerrainTag, b: TerrainTag) -> bool {
        self.incompatible_terrain.contains(&(a.min(b), a.max(b)))
    }

    pub fn culture_tension(&self, a: &str, b: &str) -> bool {
        self.culture_tensions.contains(&pair_of(a, b))
    }

    pub fn function_clash(&self, a: &str, b: &str) -> bool {
        self.function_clashes.contains(&pair_of(a, b))
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Terrain classes the filler chooses among: the transition table's
    /// keys, or the terrain category when no table is configured
    pub fn filler_universe(&self) -> Vec<TerrainTag> {
        if !self.transitions.is_empty() {
            return self.transitions.keys().copied().collect();
        }
        self.values(TagCategory::Terrain)
            .iter()
            .filter_map(|v| v.parse().ok())
            .collect()
    }

    /// Classes allowed next to `tag`, if the table mentions it
    pub fn allowed_next_to(&self, tag: TerrainTag) -> Option<&BTreeSet<TerrainTag>> {
        self.transitions.get(&tag)
    }

    /// Transition multiplier from a neighbour class to a candidate class
    pub fn weight(&self, from: TerrainTag, to: TerrainTag) -> f64 {
        self.weights.get(&(from, to)).copied().unwrap_or(1.0)
    }

    pub fn profile(&self, tag: TerrainTag) -> FillerProfile {
        self.profiles
            .get(&tag)
            .copied()
            .unwrap_or_else(|| FillerProfile::builtin(tag))
    }
}

fn parse_terrain(value: &str) -> std::result::Result<TerrainTag, ConfigError> {
    value
        .parse::<TerrainTag>()
        .map_err(ConfigError::UnknownTerrain)
}

fn two(pair: &[String]) -> std::result::Result<[&str; 2], ConfigError> {
    match pair {
        [a, b] => Ok([a.as_str(), b.as_str()]),
        _ => Err(ConfigError::BadPair(pair.to_vec())),
    }
}

fn pair_set(pairs: &[Vec<String>]) -> std::result::Result<BTreeSet<TagPair>, ConfigError> {
    pairs
        .iter()
        .map(|p| two(p).map(|[a, b]| pair_of(a, b)))
        .collect()
}

fn checked_range(
    name: &str,
    range: Option<[f32; 2]>,
) -> std::result::Result<Option<(f32, f32)>, ConfigError> {
    match range {
        None => Ok(None),
        Some([lo, hi]) if lo <= hi => Ok(Some((lo, hi))),
        Some(_) => Err(ConfigError::BadRange(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_builtin_loads() {
        let config = TagConfig::builtin().unwrap();
        assert!(config.values(TagCategory::Terrain).contains(&"surface".to_string()));
        assert_eq!(config.category_of("dwarf"), Some(TagCategory::Culture));
        assert_eq!(config.category_of("military"), Some(TagCategory::Function));
        assert_eq!(config.category_of("nonsense"), None);
    }

    #[test]
    fn test_pairs_are_unordered() {
        let config = TagConfig::builtin().unwrap();
        assert!(config.terrain_incompatible(TerrainTag::Aerial, TerrainTag::Underground));
        assert!(config.terrain_incompatible(TerrainTag::Underground, TerrainTag::Aerial));
        assert!(config.culture_tension("elf", "dwarf"));
        assert!(!config.culture_tension("dwarf", "dwarf"));
    }

    #[test]
    fn test_terrain_tag_is_first_terrain_value() {
        let config = TagConfig::builtin().unwrap();
        let t = tags(&["dwarf", "underground", "surface"]);
        assert_eq!(config.terrain_tag_of(&t), Some(TerrainTag::Underground));
        assert_eq!(config.terrain_tag_of(&tags(&["dwarf"])), None);
    }

    #[test]
    fn test_universe_follows_transition_keys() {
        let config = TagConfig::builtin().unwrap();
        assert_eq!(config.filler_universe().len(), 6);

        let bare = TagConfig::from_toml_str(
            "[categories.terrain]\nvalues = [\"surface\", \"underground\"]\n",
        )
        .unwrap();
        assert_eq!(bare.filler_universe(), vec![TerrainTag::Surface, TerrainTag::Underground]);
        assert_eq!(bare.weight(TerrainTag::Surface, TerrainTag::Surface), 1.0);
    }

    #[test]
    fn test_rejects_bad_documents() {
        let bad_pair = "[constraints.hard]\nincompatible_terrain = [[\"surface\"]]\n";
        assert!(matches!(TagConfig::from_toml_str(bad_pair), Err(ConfigError::BadPair(_))));

        let bad_terrain = "[transitions.allowed]\nlava = [\"surface\"]\n";
        assert_eq!(
            TagConfig::from_toml_str(bad_terrain).unwrap_err(),
            ConfigError::UnknownTerrain("lava".to_string())
        );

        let bad_weight = "[transitions.weights.surface]\nsurface = -1.0\n";
        assert!(matches!(TagConfig::from_toml_str(bad_weight), Err(ConfigError::BadWeight { .. })));

        let empty_req = "[[constraints.hard.requires]]\ntag = \"deep\"\n";
        assert!(matches!(
            TagConfig::from_toml_str(empty_req),
            Err(ConfigError::EmptyRequirement(_))
        ));
    }

    #[test]
    fn test_profile_overrides() {
        let text = "[filler.profiles.underwater]\nelevation = [-200.0, -50.0]\n";
        let config = TagConfig::from_toml_str(text).unwrap();
        let p = config.profile(TerrainTag::Underwater);
        assert_eq!(p.elevation, (-200.0, -50.0));
        assert_eq!(p.moisture, (0.4, 0.6));
        assert_eq!(config.profile(TerrainTag::Peak).elevation, (800.0, 1200.0));
    }
}
