//! Service layer for answer-service
//!
//! - synthesizer: parallel dispatch, failure policy, merge
//! - merge_prompt: the prompt used to fuse two drafts into one reply

pub mod merge_prompt;
pub mod synthesizer;

pub use synthesizer::{AnswerSynthesizer, DispatchOutcome, SynthesisSettings};
