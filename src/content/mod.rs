//! Hex content collaborators
//!
//! Cluster growth asks a [`ContentGenerator`] for each new hex. Two are
//! provided: an offline procedural generator driven by the stage RNG, and an
//! LLM client speaking the OpenAI chat-completion protocol.

pub mod edges;
pub mod llm;
pub mod procedural;

pub use edges::EdgeHandler;
pub use llm::{LlmConfig, LlmContent};
pub use procedural::ProceduralContent;

use rand_chacha::ChaCha8Rng;

use crate::error::ContentError;
use crate::hex::HexCoord;
use crate::schema::{EdgeType, FoundingContext, TaggedHex, MAX_TAGS};

/// What an already placed neighbour looks like from the new hex
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborContext {
    /// Edge of the new hex that faces this neighbour
    pub edge: usize,
    pub name: String,
    pub tags: Vec<String>,
    /// The neighbour's edge type on the shared border
    pub facing_edge: EdgeType,
}

/// Everything a generator gets to know about the hex it must produce
#[derive(Clone, Debug, Default)]
pub struct HexRequest<'a> {
    pub coord: HexCoord,
    /// Template the cluster is grown from, e.g. `dwarf_hold_major`
    pub theme: &'a str,
    pub neighbors: Vec<NeighborContext>,
    pub founding: Option<&'a FoundingContext>,
    /// Tags a previous attempt was rejected for
    pub avoid_tags: Vec<String>,
    /// Tags that already dominate the cluster
    pub overused_tags: Vec<String>,
    /// Alternatives to the overused tags
    pub suggested_tags: Vec<String>,
}

impl<'a> HexRequest<'a> {
    pub fn new(coord: HexCoord, theme: &'a str) -> Self {
        Self {
            coord,
            theme,
            ..Default::default()
        }
    }

    /// Free-text hints for generators that read prose
    pub fn hints(&self) -> Vec<String> {
        let mut hints = Vec::new();
        if !self.avoid_tags.is_empty() {
            hints.push(format!("MUST FIX: avoid tags {}", self.avoid_tags.join(", ")));
        }
        if !self.overused_tags.is_empty() {
            hints.push(format!(
                "Diversity: the cluster already has many {} hexes; consider {}",
                self.overused_tags.join(", "),
                self.suggested_tags.join(", ")
            ));
        }
        hints
    }

    /// Every tag the generator must not emit
    pub fn forbidden(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.avoid_tags.iter().map(String::as_str).collect();
        if let Some(founding) = self.founding {
            tags.extend(founding.bias_against.iter().map(String::as_str));
        }
        tags
    }
}

/// Produces tagged hexes on demand
pub trait ContentGenerator {
    /// Short label for logs
    fn name(&self) -> &str;

    fn generate_hex(&self, request: &HexRequest<'_>, rng: &mut ChaCha8Rng) -> Result<TaggedHex, ContentError>;
}

/// The content contract: six edges (enforced by the type) and 1-10 tags
pub fn check_hex(hex: &TaggedHex) -> Result<(), ContentError> {
    if hex.tags.is_empty() {
        return Err(ContentError::Malformed("no tags".to_string()));
    }
    if hex.tags.len() > MAX_TAGS {
        return Err(ContentError::Malformed(format!("{} tags", hex.tags.len())));
    }
    Ok(())
}
