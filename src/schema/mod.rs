//! Data model shared by every generation stage

pub mod anchor;
pub mod connector;
pub mod seed;
pub mod tagged;
pub mod terrain;
pub mod world;

pub use anchor::{MinorAnchor, MinorCategory};
pub use connector::{
    ConnectorCollection, ConnectorHex, ConnectorType, ElasticSegment, EntryPoint, MinorAnchorSlot,
};
pub use seed::{ClusterKind, ClusterPlacement, ConnectorAssignment, LayoutHint, WorldSeed};
pub use tagged::{Adjacency, EdgeType, FoundingContext, HexCluster, TaggedHex, CLUSTER_SIZE, MAX_TAGS};
pub use terrain::{SpeciesFitness, TagCategory, Terrain, TerrainTag};
pub use world::{AssembledCluster, AssembledWorld, AssemblyStats, HexMap, WorldHex};
