use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Post entity - a single feed entry with its like/comment sub-state
///
/// Identity and content fields never change after creation. Likes and
/// comments are only changed through `FeedStore::mutate_post`, which is how
/// `InteractionGuard` reaches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub(crate) id: Uuid,
    pub(crate) author: String,
    pub(crate) content: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) image_ref: Option<String>,
    pub(crate) like_count: u64,
    pub(crate) liked_by: BTreeSet<String>,
    pub(crate) comments: Vec<Comment>,
}

/// Comment entity - one entry in a post's append-only comment sequence
///
/// Position in `Post::comments` is the insertion order. `posted_at` is absent
/// for comments read from records written before comment times were stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub posted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub(crate) fn new(author: &str, content: &str, image_ref: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author: author.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            image_ref: image_ref
                .filter(|r| !r.is_empty())
                .map(|r| r.to_string()),
            like_count: 0,
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    /// Always equal to the number of distinct users in `liked_by`
    pub fn like_count(&self) -> u64 {
        self.like_count
    }

    pub fn liked_by(&self) -> impl Iterator<Item = &str> {
        self.liked_by.iter().map(String::as_str)
    }

    pub fn is_liked_by(&self, user: &str) -> bool {
        self.liked_by.contains(user)
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Record a like from `user`. Returns false if the user already liked the post.
    pub(crate) fn add_like(&mut self, user: &str) -> bool {
        if !self.liked_by.insert(user.to_string()) {
            return false;
        }
        self.like_count = self.liked_by.len() as u64;
        true
    }

    pub(crate) fn append_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }
}

impl Comment {
    pub fn new(author: &str, text: &str, posted_at: DateTime<Utc>) -> Self {
        Self {
            author: author.to_string(),
            text: text.to_string(),
            posted_at: Some(posted_at),
        }
    }
}
