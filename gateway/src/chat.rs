//! Chat collaborator
//!
//! Thin client for a Gemini-style `generateContent` endpoint. Callers always
//! get a displayable string back: provider failures are folded into the reply
//! text and logged here.

use emitter_catalog::{Affiliation, Emitter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::LlmConfig;

pub const OFFLINE_REPLY: &str = "AI system offline - API key not configured";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_PROMPT: &str = "You are the analyst console of an electronic warfare decision-support \
system. You can draw on live emitter data to help with threat identification, countermeasure \
selection, signal classification and kill-chain assessment. Answer briefly in operational \
language, state your confidence, and end with recommended actions when discussing a threat.";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("provider returned no text")]
    EmptyReply,
}

/// Situation summary attached to a chat query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatContext {
    pub active_emitters: usize,
    pub hostile_count: usize,
    pub threat_types: Vec<String>,
}

impl ChatContext {
    pub fn from_emitters(emitters: &[Emitter]) -> Self {
        let threat_types: BTreeSet<&str> =
            emitters.iter().map(|e| e.emitter_type.as_str()).collect();
        Self {
            active_emitters: emitters.len(),
            hostile_count: emitters
                .iter()
                .filter(|e| e.affiliation == Affiliation::Hostile)
                .count(),
            threat_types: threat_types.into_iter().map(str::to_string).collect(),
        }
    }

    fn render(&self) -> String {
        format!(
            "{} active emitters, {} hostile; emitter types: {}",
            self.active_emitters,
            self.hostile_count,
            self.threat_types.join(", ")
        )
    }
}

// Wire types for generateContent

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

pub struct ChatClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Ask the provider. Never fails; errors come back as reply text.
    pub async fn complete(&self, query: &str, context: Option<&ChatContext>) -> String {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return OFFLINE_REPLY.to_string();
        };

        let prompt = match context {
            Some(ctx) => format!("Context: {}\n\nQuery: {}", ctx.render(), query),
            None => query.to_string(),
        };

        match self.generate(api_key, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Chat provider error: {}", e);
                format!("AI analysis unavailable: {}", e)
            }
        }
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, ChatError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part { text: SYSTEM_PROMPT }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: prompt }],
            }],
        };

        debug!("Chat request to model {}", self.config.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            Err(ChatError::EmptyReply)
        } else {
            Ok(text)
        }
    }
}
