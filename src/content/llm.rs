//! LLM-backed hex content
//!
//! Connects to an OpenAI-compatible API server and asks it for one hex at a
//! time. Requests are blocking; failures are retried with exponential backoff
//! and then surfaced so the caller can skip that unit of work.

use std::time::Duration;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{check_hex, ContentGenerator, HexRequest};
use crate::error::ContentError;
use crate::hex::EDGE_NAMES;
use crate::schema::{EdgeType, TaggedHex};

const SYSTEM_PROMPT: &str = "You are a world-building AI that designs 100-meter hexes for a fantasy \
settlement map. Reply with a single JSON object and nothing else, shaped as \
{\"name\": str, \"description\": str, \"tags\": [str], \"edge_types\": [6 x str]}. \
Edge types are one of tunnel, road, water, wilderness, entrance, blocked and are \
listed clockwise starting East: E, NE, NW, W, SW, SE.";

/// Configuration for the LLM server
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the LLM server (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Model name to use (optional, server may have default)
    pub model: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Temperature for generation (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Attempts per hex before giving up
    pub retries: u32,
    /// Delay before the first retry; doubled after each failure
    pub backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            model: None,
            max_tokens: 512,
            temperature: 0.8,
            timeout_secs: 60,
            retries: 3,
            backoff_ms: 500,
        }
    }
}

/// OpenAI-compatible chat message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI-compatible chat completion request
#[derive(Serialize, Debug)]
struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

/// OpenAI-compatible chat completion response
#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessageResponse,
}

/// Response message - handles both standard and reasoning models
#[derive(Deserialize, Debug)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

impl ChatMessageResponse {
    fn get_content(&self) -> Option<String> {
        self.content
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.reasoning_content.clone())
    }
}

/// Hex as the model writes it, before the edge count is checked
#[derive(Deserialize, Debug)]
struct RawHex {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    edge_types: Vec<String>,
}

/// Content generator backed by a chat-completion endpoint
pub struct LlmContent {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl LlmContent {
    pub fn new(config: LlmConfig) -> Result<Self, ContentError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ContentError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Check if the LLM server is available
    pub fn health_check(&self) -> bool {
        let url = format!("{}/v1/models", self.config.base_url);
        self.client
            .get(&url)
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String, ContentError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| ContentError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(ContentError::Api(format!("Status {}: {}", status, body)));
        }

        let completion: ChatCompletionResponse =
            response.json().map_err(|e| ContentError::Parse(e.to_string()))?;

        completion
            .choices
            .first()
            .and_then(|c| c.message.get_content())
            .ok_or(ContentError::EmptyResponse)
    }

    fn attempt(&self, request: &HexRequest<'_>) -> Result<TaggedHex, ContentError> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: render_prompt(request),
            },
        ];
        let reply = self.chat_completion(messages)?;
        parse_hex_response(&reply, request)
    }
}

impl ContentGenerator for LlmContent {
    fn name(&self) -> &str {
        "llm"
    }

    fn generate_hex(&self, request: &HexRequest<'_>, _rng: &mut ChaCha8Rng) -> Result<TaggedHex, ContentError> {
        let attempts = self.config.retries.max(1);
        let mut delay = self.config.backoff_ms;
        let mut last_error = ContentError::Unavailable(self.config.base_url.clone());

        for attempt in 1..=attempts {
            match self.attempt(request) {
                Ok(hex) => return Ok(hex),
                Err(e) => {
                    warn!(attempt, coord = %request.coord, error = %e, "hex request failed");
                    last_error = e;
                }
            }
            if attempt < attempts {
                std::thread::sleep(Duration::from_millis(delay));
                delay = delay.saturating_mul(2);
            }
        }
        Err(last_error)
    }
}

/// User prompt for one hex
pub fn render_prompt(request: &HexRequest<'_>) -> String {
    let mut prompt = format!(
        "Design the hex at ({}, {}) of the settlement '{}'.\n",
        request.coord.q, request.coord.r, request.theme
    );

    if request.neighbors.is_empty() {
        prompt.push_str("This is the first hex of the settlement.\n");
    } else {
        prompt.push_str("Already placed neighbours:\n");
        for n in &request.neighbors {
            prompt.push_str(&format!(
                "- {} side: \"{}\" [{}], its edge facing you is {}\n",
                EDGE_NAMES[n.edge % 6],
                n.name,
                n.tags.join(", "),
                n.facing_edge
            ));
        }
        prompt.push_str("Tunnel, road and water edges must be mirrored exactly on the shared side.\n");
    }

    if let Some(founding) = request.founding {
        prompt.push_str(&format!("Founded in {}", founding.season));
        if let Some(event) = &founding.astronomical_event {
            prompt.push_str(&format!(" under {}", event));
        }
        prompt.push_str(".\n");
        if !founding.flavor.is_empty() {
            prompt.push_str(&format!("{}\n", founding.flavor));
        }
        if !founding.bias_tags.is_empty() {
            prompt.push_str(&format!("Prefer tags: {}\n", founding.bias_tags.join(", ")));
        }
        if !founding.bias_against.is_empty() {
            prompt.push_str(&format!("Never use tags: {}\n", founding.bias_against.join(", ")));
        }
    }

    for hint in request.hints() {
        prompt.push_str(&hint);
        prompt.push('\n');
    }
    prompt
}

/// Extract and check the JSON hex from a model reply
pub fn parse_hex_response(reply: &str, request: &HexRequest<'_>) -> Result<TaggedHex, ContentError> {
    let start = reply.find('{').ok_or_else(|| ContentError::Parse("no JSON object".to_string()))?;
    let end = reply.rfind('}').ok_or_else(|| ContentError::Parse("unterminated JSON".to_string()))?;
    if end < start {
        return Err(ContentError::Parse("unterminated JSON".to_string()));
    }

    let raw: RawHex = serde_json::from_str(&reply[start..=end]).map_err(|e| ContentError::Parse(e.to_string()))?;
    debug!(name = %raw.name, tags = ?raw.tags, "parsed hex reply");

    if raw.edge_types.len() != 6 {
        return Err(ContentError::Malformed(format!(
            "expected 6 edge types, got {}",
            raw.edge_types.len()
        )));
    }
    let mut edge_types = [EdgeType::Wilderness; 6];
    for (slot, value) in edge_types.iter_mut().zip(&raw.edge_types) {
        *slot = value
            .parse()
            .map_err(|bad| ContentError::Malformed(format!("unknown edge type '{}'", bad)))?;
    }

    let hex = TaggedHex {
        q: request.coord.q,
        r: request.coord.r,
        name: raw.name,
        description: raw.description,
        tags: raw.tags.into_iter().map(|t| t.trim().to_ascii_lowercase()).collect(),
        edge_types,
        founding_context: request.founding.cloned(),
        founding_cluster_id: None,
    };
    check_hex(&hex)?;
    Ok(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::NeighborContext;
    use crate::hex::HexCoord;
    use crate::schema::FoundingContext;
    use rand::SeedableRng;

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"name\": \"Forge Hall\", \"description\": \"Hot\", \
            \"tags\": [\"Underground\", \"dwarf\"], \
            \"edge_types\": [\"tunnel\", \"tunnel\", \"blocked\", \"blocked\", \"blocked\", \"Entrance\"]}\n```";
        let req = HexRequest::new(HexCoord::new(3, -2), "hold");
        let hex = parse_hex_response(reply, &req).unwrap();
        assert_eq!(hex.coord(), HexCoord::new(3, -2));
        assert_eq!(hex.tags, vec!["underground", "dwarf"]);
        assert_eq!(hex.edge_types[5], EdgeType::Entrance);
    }

    #[test]
    fn test_rejects_wrong_edge_count_and_empty_tags() {
        let req = HexRequest::new(HexCoord::ORIGIN, "hold");
        let five = r#"{"name": "x", "tags": ["surface"], "edge_types": ["road","road","road","road","road"]}"#;
        assert!(matches!(parse_hex_response(five, &req), Err(ContentError::Malformed(_))));

        let no_tags = r#"{"name": "x", "tags": [], "edge_types": ["road","road","road","road","road","road"]}"#;
        assert!(matches!(parse_hex_response(no_tags, &req), Err(ContentError::Malformed(_))));

        assert!(matches!(parse_hex_response("sorry", &req), Err(ContentError::Parse(_))));
    }

    #[test]
    fn test_prompt_mentions_context() {
        let ctx = FoundingContext::new("deep_winter")
            .with_bias_tags(&["defensive"])
            .with_bias_against(&["wild"]);
        let mut req = HexRequest::new(HexCoord::new(1, 0), "ironhold");
        req.founding = Some(&ctx);
        req.neighbors.push(NeighborContext {
            edge: 3,
            name: "Gate".to_string(),
            tags: vec!["surface".to_string()],
            facing_edge: EdgeType::Road,
        });
        req.avoid_tags.push("wild".to_string());

        let prompt = render_prompt(&req);
        assert!(prompt.contains("ironhold"));
        assert!(prompt.contains("W side: \"Gate\""));
        assert!(prompt.contains("Never use tags: wild"));
        assert!(prompt.contains("MUST FIX: avoid tags wild"));
    }

    #[test]
    fn test_unreachable_server_fails_after_retries() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            retries: 2,
            backoff_ms: 1,
            ..Default::default()
        };
        let llm = LlmContent::new(config).unwrap();
        let req = HexRequest::new(HexCoord::ORIGIN, "hold");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(llm.generate_hex(&req, &mut rng).is_err());
    }
}
