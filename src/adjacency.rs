//! Adjacency rule engine
//!
//! Hard rules (terrain incompatibility, mirrored edges, tag requirements,
//! forbidden founding tags) block a hex. Soft rules (culture tension,
//! function clash, missing preferred founding tags) only warn.

use std::sync::Arc;

use crate::config::TagConfig;
use crate::hex::opposite_edge;
use crate::schema::{FoundingContext, TaggedHex};

/// Outcome of a validation call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn from_parts(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.valid &= other.valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validates hex pairs and single hexes against a [`TagConfig`]
#[derive(Clone, Debug)]
pub struct AdjacencyValidator {
    config: Arc<TagConfig>,
}

impl AdjacencyValidator {
    pub fn new(config: Arc<TagConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TagConfig {
        &self.config
    }

    /// Check that `b` may sit across `edge` of `a`
    pub fn validate_adjacency(&self, a: &TaggedHex, b: &TaggedHex, edge: usize) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // Terrain
        if let (Some(ta), Some(tb)) = (
            self.config.terrain_tag_of(&a.tags),
            self.config.terrain_tag_of(&b.tags),
        ) {
            if self.config.terrain_incompatible(ta, tb) {
                errors.push(format!("TERRAIN incompatible: {} cannot adjoin {}", ta, tb));
            }
        }

        // Edges
        let back = opposite_edge(edge);
        let from_a = a.edge_types[edge % 6];
        let from_b = b.edge_types[back];
        if (from_a.must_match() || from_b.must_match()) && from_a != from_b {
            errors.push(format!(
                "Edge mismatch: hex_a edge {}={}, hex_b edge {}={}",
                edge, from_a, back, from_b
            ));
        }

        // Culture
        let cultures_b = self.config.culture_tags(&b.tags);
        for ca in self.config.culture_tags(&a.tags) {
            for &cb in &cultures_b {
                if self.config.culture_tension(ca, cb) {
                    warnings.push(format!("Culture tension: {} adjacent to {}", ca, cb));
                }
            }
        }

        // Function
        let functions_b = self.config.function_tags(&b.tags);
        for fa in self.config.function_tags(&a.tags) {
            for &fb in &functions_b {
                if self.config.function_clash(fa, fb) {
                    warnings.push(format!("Function clash: {} adjacent to {}", fa, fb));
                }
            }
        }

        ValidationResult::from_parts(errors, warnings)
    }

    /// Check tag requirements inside a single hex
    pub fn validate_hex_internal(&self, hex: &TaggedHex) -> ValidationResult {
        let mut errors = Vec::new();

        for req in self.config.requirements() {
            if !hex.has_tag(&req.tag) {
                continue;
            }
            if let Some(required) = &req.requires {
                if !hex.has_tag(required) {
                    errors.push(format!("Tag '{}' requires '{}'", req.tag, required));
                }
            }
            if !req.requires_one_of.is_empty() && !req.requires_one_of.iter().any(|t| hex.has_tag(t)) {
                errors.push(format!(
                    "Tag '{}' requires one of {:?}",
                    req.tag, req.requires_one_of
                ));
            }
        }

        ValidationResult::from_parts(errors, Vec::new())
    }

    /// Check a hex against settlement founding conditions
    pub fn validate_founding_constraints(
        &self,
        hex: &TaggedHex,
        context: Option<&FoundingContext>,
    ) -> ValidationResult {
        let Some(context) = context else {
            return ValidationResult::ok();
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let violations: Vec<&str> = hex
            .tags
            .iter()
            .filter(|t| context.bias_against.contains(*t))
            .map(String::as_str)
            .collect();
        if !violations.is_empty() {
            errors.push(format!(
                "FOUNDING violation: hex contains forbidden tags {:?}. Settlement founding conditions forbid: {:?}",
                violations, context.bias_against
            ));
        }

        if !context.bias_tags.is_empty() && !context.bias_tags.iter().any(|t| hex.has_tag(t)) {
            warnings.push(format!(
                "FOUNDING suggestion: hex has none of preferred tags {:?}",
                context.bias_tags
            ));
        }

        ValidationResult::from_parts(errors, warnings)
    }

    /// Internal consistency plus founding constraints
    pub fn validate_hex(&self, hex: &TaggedHex, context: Option<&FoundingContext>) -> ValidationResult {
        let mut result = self.validate_hex_internal(hex);
        result.merge(self.validate_founding_constraints(hex, context));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::HexCoord;
    use crate::schema::EdgeType::{self, Blocked, Road, Tunnel, Wilderness};

    fn validator() -> AdjacencyValidator {
        AdjacencyValidator::new(Arc::new(TagConfig::builtin().unwrap()))
    }

    fn hex(q: i32, r: i32, tags: &[&str], edges: [EdgeType; 6]) -> TaggedHex {
        TaggedHex::new(HexCoord::new(q, r), "Test", "Test hex", tags, edges)
    }

    fn underground() -> TaggedHex {
        hex(0, 0, &["underground", "dwarf", "industrial"], [Tunnel, Tunnel, Blocked, Blocked, Blocked, Blocked])
    }

    fn surface() -> TaggedHex {
        hex(1, 0, &["surface", "wild"], [Wilderness; 6])
    }

    #[test]
    fn test_underground_cannot_adjoin_aerial() {
        let aerial = hex(0, -1, &["aerial", "ancient"], [Blocked; 6]);
        let result = validator().validate_adjacency(&underground(), &aerial, 1);
        assert!(!result.valid);
        assert!(result.errors[0].contains("TERRAIN"));
    }

    #[test]
    fn test_edge_types_must_match() {
        let mismatched = hex(1, 0, &["underground", "dwarf"], [Road, Tunnel, Blocked, Blocked, Blocked, Blocked]);
        // edge 0 of a is tunnel; edge 3 of b is blocked
        let result = validator().validate_adjacency(&underground(), &mismatched, 0);
        assert!(!result.valid);
        assert!(result.errors[0].to_lowercase().contains("edge"));
    }

    #[test]
    fn test_asymmetric_soft_edges_allowed() {
        let a = hex(0, 0, &["surface"], [EdgeType::Entrance; 6]);
        let b = hex(1, 0, &["surface"], [Wilderness; 6]);
        assert!(validator().validate_adjacency(&a, &b, 0).valid);
    }

    #[test]
    fn test_dwarf_elf_adjacency_warns() {
        let dwarf = hex(0, 0, &["underground", "dwarf", "residential"], [Tunnel; 6]);
        let elf = hex(1, 0, &["underground", "elf", "residential"], [Tunnel; 6]);
        let result = validator().validate_adjacency(&dwarf, &elf, 0);
        assert!(result.valid);
        assert!(!result.warnings.is_empty());
        assert!(result.warnings[0].to_lowercase().contains("culture"));
    }

    #[test]
    fn test_function_clash_warns() {
        let a = hex(0, 0, &["surface", "sacred"], [Wilderness; 6]);
        let b = hex(1, 0, &["surface", "industrial"], [Wilderness; 6]);
        let result = validator().validate_adjacency(&a, &b, 0);
        assert!(result.valid);
        assert!(result.warnings.iter().any(|w| w.starts_with("Function clash")));
    }

    #[test]
    fn test_matching_tunnels_valid() {
        let a = hex(0, 0, &["underground", "passage"], [Tunnel, Blocked, Blocked, Blocked, Blocked, Blocked]);
        let b = hex(1, 0, &["underground", "passage"], [Blocked, Blocked, Blocked, Tunnel, Blocked, Blocked]);
        let result = validator().validate_adjacency(&a, &b, 0);
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_internal_requirements() {
        let v = validator();
        let deep = hex(0, 0, &["surface", "deep"], [Wilderness; 6]);
        let result = v.validate_hex_internal(&deep);
        assert!(!result.valid);
        assert!(result.errors[0].contains("'deep' requires 'underground'"));

        let peak = hex(0, 0, &["underground", "peak"], [Wilderness; 6]);
        assert!(v.validate_hex_internal(&peak).errors[0].contains("requires one of"));

        let fine = hex(0, 0, &["underground", "deep"], [Tunnel; 6]);
        assert!(v.validate_hex_internal(&fine).valid);
    }

    #[test]
    fn test_bias_against_creates_error() {
        let ctx = FoundingContext::new("winter").with_bias_against(&["wild"]);
        let result = validator().validate_founding_constraints(&surface(), Some(&ctx));
        assert!(!result.valid);
        assert!(result.errors[0].contains("FOUNDING"));
        assert!(result.errors[0].contains("wild"));
    }

    #[test]
    fn test_missing_bias_tags_warns_once() {
        let ctx = FoundingContext::new("summer").with_bias_tags(&["military", "defensive"]);
        let result = validator().validate_founding_constraints(&surface(), Some(&ctx));
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("FOUNDING suggestion"));
    }

    #[test]
    fn test_matching_bias_tag_is_clean() {
        let ctx = FoundingContext::new("summer").with_bias_tags(&["wild"]);
        let result = validator().validate_founding_constraints(&surface(), Some(&ctx));
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_no_context_always_valid() {
        let result = validator().validate_founding_constraints(&surface(), None);
        assert_eq!(result, ValidationResult::ok());
    }
}
