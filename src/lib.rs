//! Hex world assembly library
//!
//! Grows tagged settlement clusters, lays them out on a hex disc, links them
//! with elastic connectors, slots minor anchors along the routes and fills
//! the rest of the disc by wave collapse. Re-exports modules for the CLI.

pub mod adjacency;
pub mod anchors;
pub mod ascii;
pub mod assembly;
pub mod cluster;
pub mod config;
pub mod connector;
pub mod content;
pub mod error;
pub mod export;
pub mod filler;
pub mod hex;
pub mod layout;
pub mod params;
pub mod schema;
pub mod seeds;

pub use assembly::WorldAssembler;
pub use config::TagConfig;
pub use error::{ConfigError, ContentError, Result, WorldgenError};
pub use hex::HexCoord;
pub use params::GenerationParams;
pub use seeds::WorldSeeds;
