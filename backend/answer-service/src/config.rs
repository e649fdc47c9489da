//! Configuration for answer-service
use serde::Deserialize;
use std::time::Duration;

use crate::providers::{gemini, llama, GenerationParams};
use crate::services::SynthesisSettings;

/// Which backend performs the merge call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergerChoice {
    A,
    B,
}

/// Main configuration struct, loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerConfig {
    /// Gemini API key (backend A)
    #[serde(default)]
    pub gemini_api_key: String,

    #[serde(default = "default_gemini_endpoint")]
    pub gemini_endpoint: String,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// LLaMA completion endpoint (backend B)
    #[serde(default = "default_llama_endpoint")]
    pub llama_endpoint: String,

    #[serde(default = "default_llama_model")]
    pub llama_model: String,

    /// Optional bearer token for hosted LLaMA endpoints
    #[serde(default)]
    pub llama_api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub answer_temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub answer_max_tokens: u32,

    /// Shared deadline for the two parallel calls, in milliseconds
    #[serde(default = "default_backend_timeout_ms")]
    pub answer_backend_timeout_ms: u64,

    /// Deadline for the merge call, in milliseconds
    #[serde(default = "default_merge_timeout_ms")]
    pub answer_merge_timeout_ms: u64,

    #[serde(default = "default_assistant_name")]
    pub answer_assistant_name: String,

    #[serde(default = "default_merger")]
    pub answer_merger: MergerChoice,
}

fn default_gemini_endpoint() -> String {
    gemini::DEFAULT_ENDPOINT.to_string()
}

fn default_gemini_model() -> String {
    gemini::DEFAULT_MODEL.to_string()
}

fn default_llama_endpoint() -> String {
    llama::DEFAULT_ENDPOINT.to_string()
}

fn default_llama_model() -> String {
    llama::DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_backend_timeout_ms() -> u64 {
    30_000
}

fn default_merge_timeout_ms() -> u64 {
    30_000
}

fn default_assistant_name() -> String {
    "Firebox".to_string()
}

fn default_merger() -> MergerChoice {
    MergerChoice::A
}

impl AnswerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.answer_temperature,
            max_tokens: self.answer_max_tokens,
        }
    }

    pub fn synthesis_settings(&self) -> SynthesisSettings {
        SynthesisSettings {
            backend_timeout: Duration::from_millis(self.answer_backend_timeout_ms),
            merge_timeout: Duration::from_millis(self.answer_merge_timeout_ms),
            assistant_name: self.answer_assistant_name.clone(),
        }
    }
}
