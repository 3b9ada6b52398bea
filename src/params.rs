//! Generation parameters
//!
//! Provides sensible defaults and presets for different use cases.

use serde::{Deserialize, Serialize};

use crate::schema::CLUSTER_SIZE;

/// How hex edges are decided when content arrives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMode {
    /// Keep the edges the content generator produced
    Explicit,
    /// Infer every edge from terrain and function tags
    Derived,
    /// Keep generated edges but fix the ones that contradict the tags
    #[default]
    Hybrid,
}

/// Configuration for one assembly run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    // Clusters
    /// Target hex count for settlement clusters
    pub cluster_size: usize,
    /// Candidates generated per position when a founding context is active
    pub founding_candidates: usize,
    /// Share of hexes one tag may hold before diversity hints kick in
    pub diversity_threshold: f32,
    pub edge_mode: EdgeMode,

    // Layout
    /// Random draws per cluster before the layout fails
    pub layout_attempts: usize,

    // Connectors
    /// Random bonus subtracted from A* priorities (0.0 = shortest path)
    pub elasticity: f32,
    /// Hexes a path may wander beyond the straight-line distance
    pub max_deviation: i32,

    // Anchors
    pub max_anchors_per_connector: usize,

    // Filler
    pub filler_max_iterations: usize,

    // External content
    /// Attempts per content request before the unit is skipped
    pub content_retries: u32,
    /// Base delay between attempts, doubled each retry
    pub retry_backoff_ms: u64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            cluster_size: CLUSTER_SIZE,
            founding_candidates: 2,
            diversity_threshold: 0.25,
            edge_mode: EdgeMode::default(),

            layout_attempts: 1000,

            elasticity: 0.3,
            max_deviation: 3,

            max_anchors_per_connector: 5,

            filler_max_iterations: 10_000,

            content_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl GenerationParams {
    /// Small clusters, straight roads; for quick previews and tests
    pub fn quick() -> Self {
        Self {
            cluster_size: 7,
            elasticity: 0.0,
            max_deviation: 1,
            content_retries: 1,
            retry_backoff_ms: 0,
            ..Default::default()
        }
    }

    /// Meandering connectors and more anchors
    pub fn scenic() -> Self {
        Self {
            elasticity: 0.8,
            max_deviation: 6,
            max_anchors_per_connector: 8,
            ..Default::default()
        }
    }

    /// Edges inferred strictly from tags
    pub fn strict_edges() -> Self {
        Self {
            edge_mode: EdgeMode::Derived,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let params: GenerationParams = serde_json::from_str(r#"{"elasticity": 0.5}"#).unwrap();
        assert_eq!(params.elasticity, 0.5);
        assert_eq!(params.cluster_size, 20);
        assert_eq!(params.layout_attempts, 1000);
        assert_eq!(params.edge_mode, EdgeMode::Hybrid);
    }
}
