//! Client for the text-generation proxy (`POST /api/generate-text`).
//!
//! The proxy holds the upstream API key; this side only speaks its small
//! JSON contract and turns every failure into a [`GatewayError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GENERATE_PATH: &str = "/api/generate-text";
pub const NO_CONTENT: &str = "No content generated";
const FALLBACK_ERROR: &str = "Failed to generate text";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("Missing prompt")]
    MissingPrompt,
    #[error("AI Service Error: {0}")]
    Upstream(String),
    #[error("AI Service Error: {0}")]
    Network(String),
    #[error("AI Service Error: invalid response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Text written into a node when generation fails.
    pub fn node_text(&self) -> String {
        format!("Error: {}", self)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Rejects blank prompts before anything goes on the wire.
pub fn validate_prompt(prompt: &str) -> Result<&str, GatewayError> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        Err(GatewayError::MissingPrompt)
    } else {
        Ok(trimmed)
    }
}

/// Interprets a proxy response from its status code and raw body.
pub fn decode_response(status: u16, body: &str) -> Result<String, GatewayError> {
    if (200..300).contains(&status) {
        let response: GenerateResponse =
            serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
        return Ok(response
            .content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| NO_CONTENT.to_string()));
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| {
            if let Some(detail) = &b.detail {
                log::debug!("gateway error detail: {}", detail);
            }
            b.error
        })
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR.to_string());
    Err(GatewayError::Upstream(message))
}

/// Generated content, optionally structured as `{"text", "color", "emoji"}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generated {
    pub text: String,
    pub color: Option<String>,
    pub emoji: Option<String>,
}

#[derive(Deserialize)]
struct StructuredContent {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    emoji: Option<String>,
}

impl Generated {
    /// Text with the emoji prefix applied, as shown on a node.
    pub fn display_text(&self) -> String {
        match self.emoji.as_deref().map(str::trim) {
            Some(emoji) if !emoji.is_empty() => format!("{} {}", emoji, self.text),
            _ => self.text.clone(),
        }
    }
}

/// Content that parses as a JSON object contributes its fields; anything
/// else is used verbatim.
pub fn parse_generated(content: &str) -> Generated {
    match serde_json::from_str::<StructuredContent>(content) {
        Ok(parsed) => Generated {
            text: parsed
                .text
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| content.to_string()),
            color: parsed.color.filter(|c| !c.is_empty()),
            emoji: parsed.emoji,
        },
        Err(_) => Generated {
            text: content.to_string(),
            ..Generated::default()
        },
    }
}

#[derive(Clone)]
pub struct GatewayClient {
    base_url: String,
    http: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), GENERATE_PATH)
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, GatewayError> {
        let prompt = validate_prompt(prompt)?;
        log::info!("requesting generation ({} chars)", prompt.len());

        let response = self
            .http
            .post(self.endpoint())
            .json(&GenerateRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let result = decode_response(status, &body);
        if let Err(e) = &result {
            log::warn!("generation failed with status {}: {}", status, e);
        }
        result
    }
}
