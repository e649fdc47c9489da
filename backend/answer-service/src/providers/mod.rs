//! Generative backend adapters
//!
//! Each adapter issues one request to one backend and normalizes whatever
//! comes back into an `Answer` or a `BackendError`.

pub mod gemini;
pub mod llama;

pub use gemini::GeminiClient;
pub use llama::LlamaClient;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::error::{BackendError, BackendResult};

/// Longest slice of an error body kept for diagnostics
const MAX_ERROR_BODY: usize = 512;

/// Plain answer text, with no trace of which backend produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    text: String,
}

impl Answer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Issue one query; must resolve within `timeout`
    async fn ask(&self, prompt: &str, timeout: Duration) -> BackendResult<Answer>;

    /// Backend name, for logs only
    fn name(&self) -> &str;
}

/// Run a backend call under a deadline
pub(crate) async fn with_deadline<F>(timeout: Duration, call: F) -> BackendResult<Answer>
where
    F: Future<Output = BackendResult<Answer>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(BackendError::Timeout(timeout)))
}

/// Answers that are empty after trimming count as malformed
pub(crate) fn non_empty_answer(text: &str) -> BackendResult<Answer> {
    let text = text.trim();
    if text.is_empty() {
        return Err(BackendError::MalformedResponse(
            "empty answer text".to_string(),
        ));
    }
    Ok(Answer::new(text))
}

/// Turn a non-2xx response into `NonSuccess`, keeping a bounded body excerpt
pub(crate) async fn check_status(response: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let cut = (0..=MAX_ERROR_BODY)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    Err(BackendError::NonSuccess {
        status: status.as_u16(),
        body,
    })
}

/// Read the body and deserialize it, mapping any mismatch to `MalformedResponse`
pub(crate) async fn read_json<T>(response: reqwest::Response, timeout: Duration) -> BackendResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::from_reqwest(e, timeout))?;
    serde_json::from_str(&body).map_err(|e| BackendError::MalformedResponse(e.to_string()))
}
