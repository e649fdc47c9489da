use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::feed_store::{FeedStore, Mutation};
use crate::domain::{Comment, Post};
use crate::error::{FeedResult, ValidationError};
use crate::session::RequestContext;

/// Result of a like request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeOutcome {
    pub post: Post,
    /// False when the user had already liked the post
    pub newly_liked: bool,
}

/// Result of a comment request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    Appended(Post),
    /// Rejected locally; the store was not touched
    Dropped(ValidationError),
}

/// Like/comment rules layered over `FeedStore::mutate_post`
///
/// - Likes are idempotent per user: a repeated like is a no-op, even when the
///   repeats race each other, because the check and the insert happen inside
///   one exclusive mutate window.
/// - Comments are appended in arrival order and never deduplicated.
#[derive(Clone)]
pub struct InteractionGuard {
    store: Arc<FeedStore>,
}

impl InteractionGuard {
    pub fn new(store: Arc<FeedStore>) -> Self {
        Self { store }
    }

    pub async fn like(&self, ctx: &RequestContext, post_id: Uuid) -> FeedResult<LikeOutcome> {
        let user = ctx.username();
        let mut newly_liked = false;

        let post = self
            .store
            .mutate_post(post_id, |post| {
                if post.add_like(user) {
                    newly_liked = true;
                    Mutation::Applied
                } else {
                    Mutation::Unchanged
                }
            })
            .await?;

        if newly_liked {
            info!("{} liked post {} ({} likes)", user, post_id, post.like_count());
        } else {
            debug!("{} already liked post {}", user, post_id);
        }

        Ok(LikeOutcome { post, newly_liked })
    }

    pub async fn comment(
        &self,
        ctx: &RequestContext,
        post_id: Uuid,
        text: &str,
    ) -> FeedResult<CommentOutcome> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Dropping empty comment from {} on post {}", ctx.username(), post_id);
            return Ok(CommentOutcome::Dropped(ValidationError::EmptyComment));
        }

        let comment = Comment::new(ctx.username(), text, Utc::now());
        let post = self
            .store
            .mutate_post(post_id, move |post| {
                post.append_comment(comment);
                Mutation::Applied
            })
            .await?;

        info!(
            "{} commented on post {} ({} comments)",
            ctx.username(),
            post_id,
            post.comments().len()
        );
        Ok(CommentOutcome::Appended(post))
    }
}
