//! Feed query parameters, sort strategies and paged results.
//!
//! Raw caller input ([`FeedQuery`]) is resolved into [`FeedParams`] before any
//! store access. Resolution never fails: out-of-range pagination is clamped
//! and unknown sort names fall back to [`SortBy::Latest`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::{FEED_LIMIT, FEED_LIMIT_MAX, FEED_PAGE};
use crate::tags::normalize_tag_name;

/// Feed ordering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Newest first.
    #[default]
    Latest,
    /// Most liked first.
    Popular,
    /// Highest weighted engagement score first.
    Hot,
}

impl SortBy {
    /// Parse a caller-supplied sort name, falling back to `Latest`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Popular => "popular",
            Self::Hot => "hot",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Ok(Self::Latest),
            "popular" => Ok(Self::Popular),
            "hot" => Ok(Self::Hot),
            _ => Err(format!("Invalid sort: {}", s)),
        }
    }
}

/// Unvalidated feed request as it arrives from a handler.
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    /// Exact-match filter on the author.
    pub author_id: Option<Uuid>,
    /// Exact-match filter on the associated pet.
    pub pet_id: Option<Uuid>,
    /// Filter on tag name; compared in canonical form.
    pub tag: Option<String>,
}

impl FeedQuery {
    /// Clamp and default every field.
    pub fn resolve(&self) -> FeedParams {
        let page = match self.page {
            Some(p) if p >= 1 => p,
            _ => FEED_PAGE,
        };
        let limit = match self.limit {
            Some(l) if l > FEED_LIMIT_MAX => FEED_LIMIT_MAX,
            Some(l) if l >= 1 => l,
            _ => FEED_LIMIT,
        };

        FeedParams {
            page,
            limit,
            sort_by: SortBy::parse_lenient(self.sort_by.as_deref()),
            author_id: self.author_id,
            pet_id: self.pet_id,
            tag: self.tag.as_deref().and_then(normalize_tag_name),
        }
    }
}

/// Resolved feed request. Every field is within bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedParams {
    /// 1-based page number.
    pub page: i64,
    /// Page size in `1..=FEED_LIMIT_MAX`.
    pub limit: i64,
    pub sort_by: SortBy,
    pub author_id: Option<Uuid>,
    pub pet_id: Option<Uuid>,
    /// Canonical tag name.
    pub tag: Option<String>,
}

impl Default for FeedParams {
    fn default() -> Self {
        FeedQuery::default().resolve()
    }
}

impl FeedParams {
    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of feed results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage<T> {
    pub items: Vec<T>,
    /// Matching rows across all pages.
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> FeedPage<T> {
    pub fn new(items: Vec<T>, total: i64, params: &FeedParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages: total_pages(total, params.limit),
        }
    }

    /// Page with no items; `total` still reflects the whole result set.
    pub fn empty(total: i64, params: &FeedParams) -> Self {
        Self::new(Vec::new(), total, params)
    }
}

/// `ceil(total / limit)`, or 0 when either side is not positive.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    total / limit + i64::from(total % limit != 0)
}

/// Arrange `items` in the order given by `ids`.
///
/// Items whose id is not listed are dropped, ids with no matching item are
/// skipped, and each id yields at most one item.
pub fn order_by_ids<T, F>(ids: &[Uuid], items: Vec<T>, id_of: F) -> Vec<T>
where
    F: Fn(&T) -> Uuid,
{
    let mut by_id: HashMap<Uuid, T> = items.into_iter().map(|i| (id_of(&i), i)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let params = FeedQuery::default().resolve();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 20);
        assert_eq!(params.sort_by, SortBy::Latest);
        assert_eq!(params.offset(), 0);
        assert!(params.tag.is_none());
    }

    #[test]
    fn test_resolve_clamps_page() {
        for page in [0, -1, i64::MIN] {
            let params = FeedQuery {
                page: Some(page),
                ..Default::default()
            }
            .resolve();
            assert_eq!(params.page, 1, "page {} should clamp to 1", page);
        }
    }

    #[test]
    fn test_resolve_limit_below_one_uses_default() {
        for limit in [0, -5] {
            let params = FeedQuery {
                limit: Some(limit),
                ..Default::default()
            }
            .resolve();
            assert_eq!(params.limit, FEED_LIMIT);
        }
    }

    #[test]
    fn test_resolve_limit_above_cap_uses_cap() {
        let params = FeedQuery {
            limit: Some(500),
            ..Default::default()
        }
        .resolve();
        assert_eq!(params.limit, FEED_LIMIT_MAX);
    }

    #[test]
    fn test_resolve_limit_in_range_kept() {
        for limit in [1, 7, 50] {
            let params = FeedQuery {
                limit: Some(limit),
                ..Default::default()
            }
            .resolve();
            assert_eq!(params.limit, limit);
        }
    }

    #[test]
    fn test_resolve_unknown_sort_falls_back() {
        let params = FeedQuery {
            sort_by: Some("trending".to_string()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(params.sort_by, SortBy::Latest);
    }

    #[test]
    fn test_resolve_sort_case_insensitive() {
        let params = FeedQuery {
            sort_by: Some("HOT".to_string()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(params.sort_by, SortBy::Hot);
    }

    #[test]
    fn test_resolve_tag_is_canonical() {
        let params = FeedQuery {
            tag: Some(" #Cats ".to_string()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(params.tag.as_deref(), Some("cats"));

        let params = FeedQuery {
            tag: Some("#".to_string()),
            ..Default::default()
        }
        .resolve();
        assert!(params.tag.is_none());
    }

    #[test]
    fn test_offset() {
        let params = FeedQuery {
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        }
        .resolve();
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_offset_saturates() {
        let params = FeedQuery {
            page: Some(i64::MAX),
            limit: Some(50),
            ..Default::default()
        }
        .resolve();
        assert_eq!(params.offset(), i64::MAX);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(100, 7), 15);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_feed_page_metadata() {
        let params = FeedQuery {
            page: Some(2),
            limit: Some(10),
            ..Default::default()
        }
        .resolve();
        let page = FeedPage::new(vec![1, 2, 3], 13, &params);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 10);

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalPages"], 2);
    }

    #[test]
    fn test_empty_page_keeps_total() {
        let params = FeedQuery {
            page: Some(9),
            limit: Some(10),
            ..Default::default()
        }
        .resolve();
        let page: FeedPage<u8> = FeedPage::empty(30, &params);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 30);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn test_order_by_ids_restores_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let items = vec![(c, "c"), (a, "a"), (b, "b")];

        let ordered = order_by_ids(&[a, b, c], items, |i| i.0);
        let names: Vec<_> = ordered.iter().map(|i| i.1).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_order_by_ids_drops_missing_and_duplicates() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let missing = Uuid::new_v4();
        let items = vec![(b, "b"), (a, "a")];

        let ordered = order_by_ids(&[b, missing, a, b], items, |i| i.0);
        let names: Vec<_> = ordered.iter().map(|i| i.1).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_order_by_ids_drops_unrequested() {
        let a = Uuid::new_v4();
        let stray = Uuid::new_v4();
        let ordered = order_by_ids(&[a], vec![(stray, "x"), (a, "a")], |i| i.0);
        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].1, "a");
    }
}
