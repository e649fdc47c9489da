//! Feed Service - durable posts with likes and comments
//!
//! This crate provides:
//! - A row codec for the post collection that reads legacy records
//! - Pluggable durable storage (JSON Lines file or in-memory), with a one-way
//!   import of the first release's `posts.csv`
//! - `FeedStore`: create/list posts and serialized read-modify-write mutation
//! - `InteractionGuard`: one like per user per post, append-only comments

pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod services;
pub mod session;

pub use config::FeedConfig;
pub use domain::{Comment, Post};
pub use error::{FeedError, FeedResult, ValidationError};
pub use repository::{FileStorage, MemoryStorage, PostStorage, Row};
pub use services::{CommentOutcome, FeedStore, InteractionGuard, LikeOutcome, Mutation};
pub use session::{IdentityVerifier, RequestContext};
