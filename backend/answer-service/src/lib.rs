//! Answer Service - one answer from two generative backends
//!
//! This crate provides:
//! - `BackendClient` adapters for Gemini and LLaMA that normalize every
//!   failure into a typed `BackendError`
//! - `AnswerSynthesizer`: parallel dispatch, merge of two drafts into one
//!   unattributed reply, and fallback when a backend fails

pub mod config;
pub mod error;
pub mod providers;
pub mod services;

pub use config::{AnswerConfig, MergerChoice};
pub use error::{AskError, BackendError, BackendErrorKind, BackendResult};
pub use providers::{Answer, BackendClient, GeminiClient, GenerationParams, LlamaClient};
pub use services::{AnswerSynthesizer, DispatchOutcome, SynthesisSettings};

pub use tokio_util::sync::CancellationToken;
