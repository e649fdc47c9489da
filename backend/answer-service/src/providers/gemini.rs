//! Google Gemini `generateContent` adapter
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{
    check_status, non_empty_answer, read_json, with_deadline, Answer, BackendClient,
    GenerationParams,
};
use crate::error::{BackendError, BackendResult};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    params: GenerationParams,
}

// ============================================
// Request types
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

// ============================================
// Response types
// ============================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_client(Client::new(), DEFAULT_ENDPOINT, DEFAULT_MODEL, api_key)
    }

    pub fn with_client(client: Client, endpoint: &str, model: &str, api_key: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn request(&self, prompt: &str, timeout: Duration) -> BackendResult<Answer> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.params.temperature,
                max_output_tokens: self.params.max_tokens,
            },
        };

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(e, timeout))?;

        let response = check_status(response).await?;
        let parsed: GenerateContentResponse = read_json(response, timeout).await?;

        let text = parsed.first_text().ok_or_else(|| {
            BackendError::MalformedResponse("no candidate text in response".to_string())
        })?;
        debug!("Gemini answered with {} chars", text.len());
        non_empty_answer(text)
    }
}

#[async_trait]
impl BackendClient for GeminiClient {
    async fn ask(&self, prompt: &str, timeout: Duration) -> BackendResult<Answer> {
        with_deadline(timeout, self.request(prompt, timeout)).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
