//! Seed management for world assembly
//!
//! Provides separate seeds for each pipeline stage, so a change in one stage
//! (say, a different connector elasticity) leaves the others untouched.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeds for all assembly stages.
///
/// Each stage gets its own seed, derived from a master seed by default.
/// Individual seeds can be overridden for experimentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldSeeds {
    /// Master seed (the world seed id)
    pub master: u64,
    /// Cluster content growth
    pub clusters: u64,
    /// Cluster placement on the plane
    pub layout: u64,
    /// Connector pathfinding and sampling
    pub connectors: u64,
    /// Anchor selection along connectors
    pub anchors: u64,
    /// Filler wave collapse
    pub filler: u64,
}

impl WorldSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            clusters: derive_seed(master, "clusters"),
            layout: derive_seed(master, "layout"),
            connectors: derive_seed(master, "connectors"),
            anchors: derive_seed(master, "anchors"),
            filler: derive_seed(master, "filler"),
        }
    }

    /// Create a builder for customizing individual seeds
    pub fn builder(master: u64) -> WorldSeedsBuilder {
        WorldSeedsBuilder::new(master)
    }

    pub fn cluster_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.clusters)
    }

    pub fn layout_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.layout)
    }

    pub fn connector_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.connectors)
    }

    pub fn anchor_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.anchors)
    }

    pub fn filler_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.filler)
    }
}

/// Builder for customizing individual seeds while deriving others from master
pub struct WorldSeedsBuilder {
    seeds: WorldSeeds,
}

impl WorldSeedsBuilder {
    pub fn new(master: u64) -> Self {
        Self {
            seeds: WorldSeeds::from_master(master),
        }
    }

    pub fn clusters(mut self, seed: u64) -> Self {
        self.seeds.clusters = seed;
        self
    }

    pub fn layout(mut self, seed: u64) -> Self {
        self.seeds.layout = seed;
        self
    }

    pub fn connectors(mut self, seed: u64) -> Self {
        self.seeds.connectors = seed;
        self
    }

    pub fn anchors(mut self, seed: u64) -> Self {
        self.seeds.anchors = seed;
        self
    }

    pub fn filler(mut self, seed: u64) -> Self {
        self.seeds.filler = seed;
        self
    }

    pub fn build(self) -> WorldSeeds {
        self.seeds
    }
}

/// Derive a sub-seed from a master seed and a stage name.
fn derive_seed(master: u64, stage: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    stage.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for WorldSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WorldSeeds {{ master: {}, clusters: {}, layout: {}, connectors: {}, \
             anchors: {}, filler: {} }}",
            self.master, self.clusters, self.layout, self.connectors, self.anchors, self.filler,
        )
    }
}
