//! LLaMA completion adapter (Ollama-style `{model, prompt, stream}` API)
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

pub const DEFAULT_ENDPOINT: &str = "https://api.llmapi.com/";
pub const DEFAULT_MODEL: &str = "llama2";

pub struct LlamaClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    params: GenerationParams,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: CompletionOptions,
}

#[derive(Debug, Serialize)]
struct CompletionOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    response: String,
}

impl LlamaClient {
    pub fn new() -> Self {
        Self::with_client(Client::new(), DEFAULT_ENDPOINT, DEFAULT_MODEL)
    }

    pub fn with_client(client: Client, endpoint: &str, model: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: None,
            params: GenerationParams::default(),
        }
    }

    /// Bearer token for hosted endpoints
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    async fn request(&self, prompt: &str, timeout: Duration) -> BackendResult<Answer> {
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: CompletionOptions {
                temperature: self.params.temperature,
                num_predict: self.params.max_tokens,
            },
        };

        let mut request = self.client.post(&self.endpoint).timeout(timeout).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(e, timeout))?;

        let response = check_status(response).await?;
        let parsed: CompletionResponse = read_json(response, timeout).await?;
        debug!("LLaMA answered with {} chars", parsed.response.len());
        non_empty_answer(&parsed.response)
    }
}

impl Default for LlamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendClient for LlamaClient {
    async fn ask(&self, prompt: &str, timeout: Duration) -> BackendResult<Answer> {
        with_deadline(timeout, self.request(prompt, timeout)).await
    }

    fn name(&self) -> &str {
        "llama"
    }
}
