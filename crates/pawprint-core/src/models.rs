//! Core data models for pawprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::{
    HOT_WEIGHT_COMMENT, HOT_WEIGHT_LIKE, HOT_WEIGHT_SHARE, MAX_MEDIA_URLS, POST_CONTENT_MAX_LEN,
};
use crate::error::{Error, Result};
use crate::tags::validate_tag_input;

// =============================================================================
// RELATION TARGETS (identity/profile store)
// =============================================================================

/// Display record for a post author, resolved from the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Display record for the pet a post is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

// =============================================================================
// TAGS
// =============================================================================

/// A canonical, persisted tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    /// Canonical name: trimmed, lowercase, no leading `#`.
    pub name: String,
    /// Number of live posts carrying this tag.
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// POSTS
// =============================================================================

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            _ => Err(format!("Invalid media type: {}", s)),
        }
    }
}

/// Engagement counters on a post.
///
/// Never negative; only ever changed by atomic increment/decrement in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostCounters {
    pub like_count: i32,
    pub comment_count: i32,
    pub share_count: i32,
}

impl PostCounters {
    /// Weighted engagement score used by the `hot` sort.
    ///
    /// Computed on demand, never stored. Must agree with the SQL expression
    /// the feed query orders by.
    pub fn hot_score(&self) -> i64 {
        i64::from(self.like_count) * HOT_WEIGHT_LIKE
            + i64::from(self.comment_count) * HOT_WEIGHT_COMMENT
            + i64::from(self.share_count) * HOT_WEIGHT_SHARE
    }
}

/// A fully hydrated post as returned by the feed and by single fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    /// Author display record; `None` if the profile store has no row for it.
    pub author: Option<AuthorSummary>,
    pub pet_id: Option<Uuid>,
    pub pet: Option<PetSummary>,
    pub content: String,
    pub media_type: Option<MediaType>,
    pub media_urls: Vec<String>,
    #[serde(flatten)]
    pub counters: PostCounters,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which engagement counter to adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Counter {
    Like,
    Comment,
    Share,
}

impl Counter {
    /// Column backing this counter.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Like => "like_count",
            Self::Comment => "comment_count",
            Self::Share => "share_count",
        }
    }
}

/// Direction of a counter adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterDelta {
    Increment,
    Decrement,
}

/// Request body for creating a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub pet_id: Option<Uuid>,
    #[serde(default)]
    pub content: String,
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    /// Free-text tags; normalized and upserted on create.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreatePostRequest {
    /// Boundary validation. Tag normalization itself never rejects input.
    pub fn validate(&self) -> Result<()> {
        validate_content(&self.content, !self.media_urls.is_empty())?;
        validate_media(self.media_type, &self.media_urls)?;
        validate_tag_input(&self.tags)?;
        Ok(())
    }
}

/// Request body for updating a post. Absent fields are left unchanged.
///
/// When `tags` is present it replaces the post's whole tag set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub pet_id: Option<Uuid>,
    pub content: Option<String>,
    pub media_type: Option<MediaType>,
    pub media_urls: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl UpdatePostRequest {
    /// Field-local checks only. Rules that span fields are checked on the
    /// merged result in [`Self::apply`], since absent fields keep their
    /// stored values.
    pub fn validate(&self) -> Result<()> {
        if let Some(content) = &self.content {
            validate_content_len(content)?;
        }
        if let Some(urls) = &self.media_urls {
            validate_media_count(urls)?;
        }
        if let Some(tags) = &self.tags {
            validate_tag_input(tags)?;
        }
        Ok(())
    }

    /// Patch the stored body of a post and validate the result.
    ///
    /// Clearing `mediaUrls` also clears the media type.
    pub fn apply(&self, current: PostBody) -> Result<PostBody> {
        let media_urls = self.media_urls.clone().unwrap_or(current.media_urls);
        let media_type = if media_urls.is_empty() {
            None
        } else {
            self.media_type.or(current.media_type)
        };
        let merged = PostBody {
            content: self.content.clone().unwrap_or(current.content),
            media_type,
            media_urls,
        };
        merged.validate()?;
        Ok(merged)
    }

    /// True if no field would change.
    pub fn is_empty(&self) -> bool {
        self.pet_id.is_none()
            && self.content.is_none()
            && self.media_type.is_none()
            && self.media_urls.is_none()
            && self.tags.is_none()
    }
}

/// Content and media of a post as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostBody {
    pub content: String,
    pub media_type: Option<MediaType>,
    pub media_urls: Vec<String>,
}

impl PostBody {
    pub fn validate(&self) -> Result<()> {
        validate_content(&self.content, !self.media_urls.is_empty())?;
        validate_media(self.media_type, &self.media_urls)
    }
}

fn validate_content(content: &str, has_media: bool) -> Result<()> {
    if content.trim().is_empty() && !has_media {
        return Err(Error::InvalidInput(
            "Post must have content or media".to_string(),
        ));
    }
    validate_content_len(content)
}

fn validate_content_len(content: &str) -> Result<()> {
    if content.chars().count() > POST_CONTENT_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "Post content must be {} characters or less",
            POST_CONTENT_MAX_LEN
        )));
    }
    Ok(())
}

fn validate_media(media_type: Option<MediaType>, urls: &[String]) -> Result<()> {
    validate_media_count(urls)?;
    if !urls.is_empty() && media_type.is_none() {
        return Err(Error::InvalidInput(
            "mediaType is required when mediaUrls are given".to_string(),
        ));
    }
    Ok(())
}

fn validate_media_count(urls: &[String]) -> Result<()> {
    if urls.len() > MAX_MEDIA_URLS {
        return Err(Error::InvalidInput(format!(
            "A post may carry at most {} media URLs",
            MAX_MEDIA_URLS
        )));
    }
    Ok(())
}
