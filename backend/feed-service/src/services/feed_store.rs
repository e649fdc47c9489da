use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::domain::Post;
use crate::error::{FeedError, FeedResult};
use crate::repository::{codec, FileStorage, PostStorage};

/// Result of applying a mutation to a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The record changed and must be written back
    Applied,
    /// Nothing changed; the write-back is skipped
    Unchanged,
}

/// Durable owner of every post
///
/// Architecture:
/// - Reads (`list_feed`, `get_post`) load straight from the medium on every
///   call and never wait on writers.
/// - Writes (`create_post`, `mutate_post`) run one at a time behind
///   `write_gate`: read full state, change it, replace full state.
/// - The medium replaces atomically, so readers observe either the state
///   before or after an in-flight write.
pub struct FeedStore {
    storage: Arc<dyn PostStorage>,
    write_gate: Mutex<()>,
}

impl FeedStore {
    pub fn new(storage: Arc<dyn PostStorage>) -> Self {
        Self {
            storage,
            write_gate: Mutex::new(()),
        }
    }

    /// File-backed store at the configured path, importing the legacy CSV
    /// file when one is configured and the store does not exist yet
    pub fn open(config: &FeedConfig) -> Self {
        info!("Opening feed store at {}", config.store_path.display());
        let mut storage = FileStorage::new(config.store_path.clone());
        if let Some(csv_path) = &config.legacy_csv_path {
            storage = storage.with_legacy_csv(csv_path.clone());
        }
        Self::new(Arc::new(storage))
    }

    // ========== Reads ==========

    /// All posts, newest first; posts created at the same instant keep
    /// insertion order
    pub async fn list_feed(&self) -> FeedResult<Vec<Post>> {
        let mut posts = self.load_posts().await?;
        // sort_by is stable, so equal timestamps stay in file order
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    pub async fn get_post(&self, id: Uuid) -> FeedResult<Post> {
        self.load_posts()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(FeedError::NotFound(id))
    }

    // ========== Writes ==========

    /// Append a new post.
    ///
    /// Also holds `write_gate`: the medium is replaced wholesale, so an append
    /// racing a `mutate_post` write-back would drop one of the two changes.
    pub async fn create_post(
        &self,
        author: &str,
        content: &str,
        image_ref: Option<&str>,
    ) -> FeedResult<Post> {
        let post = Post::new(author, content, image_ref);

        let _guard = self.write_gate.lock().await;
        let mut posts = self.load_posts().await?;
        posts.push(post.clone());
        self.persist(&posts).await?;

        info!("Created post {} by {}", post.id, post.author);
        Ok(post)
    }

    /// Read-modify-write of a single post under exclusive access.
    ///
    /// The whole cycle holds `write_gate`; without it two concurrent
    /// mutations would each write back a state missing the other's change.
    pub async fn mutate_post<F>(&self, id: Uuid, mutation: F) -> FeedResult<Post>
    where
        F: FnOnce(&mut Post) -> Mutation + Send,
    {
        let _guard = self.write_gate.lock().await;

        let mut posts = self.load_posts().await?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(FeedError::NotFound(id))?;

        let outcome = mutation(post);
        let updated = post.clone();

        if outcome == Mutation::Applied {
            self.persist(&posts).await?;
            debug!("Mutated post {}", id);
        } else {
            debug!("Mutation left post {} unchanged", id);
        }

        Ok(updated)
    }

    // ========== Helpers ==========

    async fn load_posts(&self) -> FeedResult<Vec<Post>> {
        let rows = self.storage.load().await?;
        rows.iter()
            .enumerate()
            .map(|(idx, row)| {
                codec::decode(row, idx).map_err(|e| {
                    warn!("Undecodable feed record at line {}: {}", idx + 1, e);
                    FeedError::Corrupt {
                        line: idx + 1,
                        reason: e.to_string(),
                    }
                })
            })
            .collect()
    }

    async fn persist(&self, posts: &[Post]) -> FeedResult<()> {
        let rows: Vec<_> = posts.iter().map(codec::encode).collect();
        self.storage.replace(&rows).await
    }
}
