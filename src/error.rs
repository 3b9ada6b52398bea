//! Error types for world generation

use thiserror::Error;

/// Errors raised by the generation pipeline
#[derive(Error, Debug)]
pub enum WorldgenError {
    /// Tag configuration could not be loaded or is inconsistent
    #[error("invalid tag configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The layout solver ran out of attempts for a cluster
    #[error("Could not place cluster {cluster}")]
    Layout { cluster: String },

    /// World radius below zero
    #[error("world radius must be non-negative, got {0}")]
    InvalidRadius(i32),

    /// A `"q,r"` key failed to parse
    #[error("invalid hex key '{0}'")]
    InvalidKey(String),

    #[error("content generation failed: {0}")]
    Content(#[from] ContentError),

    #[error("image export failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, WorldgenError>;

/// Problems with the declarative tag configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("toml parse error: {0}")]
    Parse(String),

    #[error("unknown terrain tag '{0}'")]
    UnknownTerrain(String),

    #[error("constraint pair must have exactly two tags, got {0:?}")]
    BadPair(Vec<String>),

    #[error("requirement for '{0}' names neither `requires` nor `requires_one_of`")]
    EmptyRequirement(String),

    #[error("weight {from}->{to} must be finite and non-negative, got {weight}")]
    BadWeight { from: String, to: String, weight: f64 },

    #[error("range for '{0}' must be [low, high] with low <= high")]
    BadRange(String),
}

/// Failures from an external content collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("empty response from content service")]
    EmptyResponse,

    /// Response parsed but violates the hex contract
    #[error("malformed hex: {0}")]
    Malformed(String),

    #[error("content service unavailable: {0}")]
    Unavailable(String),
}
