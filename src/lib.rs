//! Firebox - social feed and AI answers behind one boundary
//!
//! The UI layer talks to `Firebox` only:
//! - `create_post` / `list_feed` / `like` / `comment` go to the feed service
//! - `ask` goes to the answer service
//!
//! Identity checks, page rendering and media upload stay with the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

pub use answer_service::{Answer, AnswerConfig, AnswerSynthesizer, AskError, CancellationToken};
pub use feed_service::{
    Comment, CommentOutcome, FeedConfig, FeedError, FeedResult, FeedStore, InteractionGuard,
    LikeOutcome, Post, RequestContext, ValidationError,
};

pub struct Firebox {
    feed: Arc<FeedStore>,
    interactions: InteractionGuard,
    answers: AnswerSynthesizer,
}

impl Firebox {
    pub fn new(feed: Arc<FeedStore>, answers: AnswerSynthesizer) -> Self {
        Self {
            interactions: InteractionGuard::new(feed.clone()),
            feed,
            answers,
        }
    }

    /// Build from environment variables (a `.env` file is honoured)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let feed_config = FeedConfig::from_env().context("Failed to load feed configuration")?;
        let answer_config =
            AnswerConfig::from_env().context("Failed to load answer configuration")?;

        info!(
            "Firebox configured: store={}, backend_timeout_ms={}",
            feed_config.store_path.display(),
            answer_config.answer_backend_timeout_ms
        );

        Ok(Self::new(
            Arc::new(FeedStore::open(&feed_config)),
            AnswerSynthesizer::from_config(&answer_config),
        ))
    }

    // ========== Feed ==========

    pub async fn create_post(
        &self,
        ctx: &RequestContext,
        content: &str,
        image_ref: Option<&str>,
    ) -> FeedResult<Post> {
        self.feed
            .create_post(ctx.username(), content, image_ref)
            .await
    }

    pub async fn list_feed(&self) -> FeedResult<Vec<Post>> {
        self.feed.list_feed().await
    }

    pub async fn like(&self, ctx: &RequestContext, post_id: Uuid) -> FeedResult<LikeOutcome> {
        self.interactions.like(ctx, post_id).await
    }

    pub async fn comment(
        &self,
        ctx: &RequestContext,
        post_id: Uuid,
        text: &str,
    ) -> FeedResult<CommentOutcome> {
        self.interactions.comment(ctx, post_id, text).await
    }

    // ========== Answers ==========

    pub async fn ask(&self, prompt: &str, cancel: &CancellationToken) -> Result<Answer, AskError> {
        self.answers.ask(prompt, cancel).await
    }
}

/// Install the global tracing subscriber (`RUST_LOG` overrides the default filter)
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firebox=info,feed_service=info,answer_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Tracing subscriber already installed")
}
