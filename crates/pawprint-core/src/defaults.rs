//! Centralized default constants for pawprint.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic numbers.

// =============================================================================
// FEED PAGINATION
// =============================================================================

/// Page used when the caller omits one or supplies a value below 1.
pub const FEED_PAGE: i64 = 1;

/// Page size used when the caller omits one or supplies a value below 1.
pub const FEED_LIMIT: i64 = 20;

/// Upper bound on the feed page size.
pub const FEED_LIMIT_MAX: i64 = 50;

/// Default number of tags returned by the popular-tags listing.
pub const TAG_LIST_LIMIT: i64 = 20;

/// Upper bound for the popular-tags listing.
pub const TAG_LIST_LIMIT_MAX: i64 = 100;

// =============================================================================
// HOT SCORE WEIGHTS
// =============================================================================

/// Weight of a like in the hot score.
pub const HOT_WEIGHT_LIKE: i64 = 2;

/// Weight of a comment in the hot score.
pub const HOT_WEIGHT_COMMENT: i64 = 3;

/// Weight of a share in the hot score.
pub const HOT_WEIGHT_SHARE: i64 = 5;

// =============================================================================
// TAGS
// =============================================================================

/// Marker character stripped (once) from the front of a tag.
pub const TAG_MARKER: char = '#';

/// Maximum number of tags a single post may carry.
pub const MAX_TAGS_PER_POST: usize = 10;

/// Maximum length (in characters) of a canonical tag name.
pub const TAG_NAME_MAX_LEN: usize = 50;

// =============================================================================
// POSTS
// =============================================================================

/// Maximum length (in characters) of a post body.
pub const POST_CONTENT_MAX_LEN: usize = 2000;

/// Maximum number of media URLs attached to a post.
pub const MAX_MEDIA_URLS: usize = 9;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;
