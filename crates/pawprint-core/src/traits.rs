//! Repository traits for pawprint.
//!
//! These define the seams between request handlers and the relational store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::feed::{FeedPage, FeedParams};
use crate::models::*;

// =============================================================================
// FEED
// =============================================================================

/// Read-only paginated view over non-deleted posts.
#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Return one page of posts matching `params`, fully hydrated.
    ///
    /// Never errors on empty results; only store failures propagate.
    async fn query_feed(&self, params: &FeedParams) -> Result<FeedPage<Post>>;
}

// =============================================================================
// TAGS
// =============================================================================

/// Canonical tag storage.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Map free-text tags to persisted records, creating missing ones.
    ///
    /// Output follows first-seen input order with duplicates collapsed.
    async fn normalize_tags(&self, names: &[String]) -> Result<Vec<Tag>>;

    /// Replace a post's entire tag set with `tags`.
    async fn set_for_post(&self, post_id: Uuid, tags: &[Tag]) -> Result<()>;

    /// Tags currently attached to a post, by name.
    async fn get_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>>;

    /// Most-used tags first.
    async fn list_popular(&self, limit: i64) -> Result<Vec<Tag>>;
}

// =============================================================================
// POSTS
// =============================================================================

/// Post lifecycle: create, edit, soft-delete, engagement counters.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a post owned by `author_id`.
    async fn create(&self, author_id: Uuid, req: CreatePostRequest) -> Result<Post>;

    /// Fetch one live post.
    async fn fetch(&self, id: Uuid) -> Result<Post>;

    /// Patch a post. Only its author may do so.
    async fn update(&self, actor_id: Uuid, id: Uuid, req: UpdatePostRequest) -> Result<Post>;

    /// Soft-delete a post. Only its author may do so.
    async fn soft_delete(&self, actor_id: Uuid, id: Uuid) -> Result<()>;

    /// Atomically bump one engagement counter, never below zero.
    async fn adjust_counter(
        &self,
        id: Uuid,
        counter: Counter,
        delta: CounterDelta,
    ) -> Result<PostCounters>;
}
