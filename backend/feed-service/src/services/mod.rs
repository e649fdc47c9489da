//! Service layer for feed-service
//!
//! - feed_store: durable post collection with exclusive read-modify-write
//! - interactions: idempotent likes and ordered comments on top of the store

pub mod feed_store;
pub mod interactions;

pub use feed_store::{FeedStore, Mutation};
pub use interactions::{CommentOutcome, InteractionGuard, LikeOutcome};
