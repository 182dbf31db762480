//! Query string types for the feed and tag endpoints.
//!
//! Malformed values (`page=abc`, `authorId=42`) are treated as if they were
//! absent rather than rejecting the request. Range clamping happens later in
//! [`FeedQuery::resolve`].

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};
use uuid::Uuid;

use pawprint_core::defaults::TAG_LIST_LIMIT;
use pawprint_core::FeedQuery;

/// A query value that parses as `T` or quietly becomes `None`.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Deserialize)]
/// struct Query {
///     #[serde(default)]
///     page: Lenient<i64>,
/// }
/// // ?page=3   -> Lenient(Some(3))
/// // ?page=abc -> Lenient(None)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lenient<T>(pub Option<T>);

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Lenient<T> {
    pub fn into_inner(self) -> Option<T> {
        self.0
    }
}

impl<'de, T> Deserialize<'de> for Lenient<T>
where
    T: FromStr,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LenientVisitor(PhantomData))
    }
}

struct LenientVisitor<T>(PhantomData<T>);

impl<T: FromStr> LenientVisitor<T> {
    fn parse(s: &str) -> Lenient<T> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Lenient(None);
        }
        Lenient(trimmed.parse().ok())
    }
}

impl<'de, T: FromStr> de::Visitor<'de> for LenientVisitor<T> {
    type Value = Lenient<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a query string value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Self::parse(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Self::parse(&v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Self::parse(&v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Self::parse(&v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Lenient(None))
    }
}

/// `GET /api/v1/posts` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQueryParams {
    #[serde(default)]
    pub page: Lenient<i64>,
    #[serde(default)]
    pub limit: Lenient<i64>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub author_id: Lenient<Uuid>,
    #[serde(default)]
    pub pet_id: Lenient<Uuid>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl From<FeedQueryParams> for FeedQuery {
    fn from(q: FeedQueryParams) -> Self {
        FeedQuery {
            page: q.page.into_inner(),
            limit: q.limit.into_inner(),
            sort_by: q.sort_by,
            author_id: q.author_id.into_inner(),
            pet_id: q.pet_id.into_inner(),
            tag: q.tag,
        }
    }
}

/// `GET /api/v1/tags` query string.
#[derive(Debug, Default, Deserialize)]
pub struct TagListParams {
    #[serde(default)]
    pub limit: Lenient<i64>,
}

impl TagListParams {
    pub fn limit(&self) -> i64 {
        self.limit.0.unwrap_or(TAG_LIST_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawprint_core::SortBy;

    fn parse(qs: &str) -> FeedQueryParams {
        serde_json::from_value(serde_json::Value::Object(
            qs.split('&')
                .filter(|kv| !kv.is_empty())
                .filter_map(|kv| kv.split_once('='))
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect(),
        ))
        .unwrap()
    }

    #[test]
    fn test_well_formed_values() {
        let author = Uuid::new_v4();
        let q = parse(&format!(
            "page=2&limit=10&sortBy=hot&authorId={}&tag=%23cats",
            author
        ));
        assert_eq!(q.page, Lenient(Some(2)));
        assert_eq!(q.limit, Lenient(Some(10)));
        assert_eq!(q.sort_by.as_deref(), Some("hot"));
        assert_eq!(q.author_id, Lenient(Some(author)));
    }

    #[test]
    fn test_malformed_values_become_absent() {
        let q = parse("page=abc&limit=&authorId=42&petId=zzz");
        assert_eq!(q.page, Lenient(None));
        assert_eq!(q.limit, Lenient(None));
        assert_eq!(q.author_id, Lenient(None));
        assert_eq!(q.pet_id, Lenient(None));

        let params = FeedQuery::from(q).resolve();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 20);
    }

    #[test]
    fn test_empty_query_resolves_to_defaults() {
        let params = FeedQuery::from(parse("")).resolve();
        assert_eq!(params.sort_by, SortBy::Latest);
        assert!(params.author_id.is_none());
        assert!(params.tag.is_none());
    }

    #[test]
    fn test_tag_list_limit_default() {
        assert_eq!(TagListParams::default().limit(), TAG_LIST_LIMIT);
        let params = TagListParams {
            limit: Lenient(Some(5)),
        };
        assert_eq!(params.limit(), 5);
    }
}
