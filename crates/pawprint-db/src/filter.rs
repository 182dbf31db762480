//! SQL fragment builders for feed filtering and ordering.
//!
//! Every read path over `post` goes through [`live_post_predicate`] so that a
//! soft-deleted row can never leak into a result. Queries alias the post
//! table as `p`.

use uuid::Uuid;

use pawprint_core::defaults::{HOT_WEIGHT_COMMENT, HOT_WEIGHT_LIKE, HOT_WEIGHT_SHARE};
use pawprint_core::{FeedParams, SortBy};

/// Type-safe parameter binding for dynamically built SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    /// Single UUID parameter.
    Uuid(Uuid),
    /// String parameter.
    String(String),
}

/// Bind a slice of [`QueryParam`]s onto a `sqlx` query in order.
macro_rules! bind_query_params {
    ($query:expr, $params:expr) => {{
        let mut q = $query;
        for param in $params {
            q = match param {
                $crate::filter::QueryParam::Uuid(id) => q.bind(*id),
                $crate::filter::QueryParam::String(s) => q.bind(s.clone()),
            };
        }
        q
    }};
}
pub(crate) use bind_query_params;

/// Predicate excluding soft-deleted posts. Applied by every read path.
pub fn live_post_predicate() -> &'static str {
    "p.is_deleted = FALSE"
}

/// Query-time hot score expression. Mirrors `PostCounters::hot_score`.
pub fn hot_score_expr() -> String {
    format!(
        "(p.like_count::bigint * {} + p.comment_count::bigint * {} + p.share_count::bigint * {})",
        HOT_WEIGHT_LIKE, HOT_WEIGHT_COMMENT, HOT_WEIGHT_SHARE
    )
}

/// ORDER BY clause for a sort strategy.
///
/// Every strategy ends with `created_at DESC, id DESC` so ties resolve the
/// same way on every call and pages never drift.
pub fn order_clause(sort_by: SortBy) -> String {
    const TIE_BREAK: &str = "p.created_at DESC, p.id DESC";
    match sort_by {
        SortBy::Latest => TIE_BREAK.to_string(),
        SortBy::Popular => format!("p.like_count DESC, {}", TIE_BREAK),
        SortBy::Hot => format!("{} DESC, {}", hot_score_expr(), TIE_BREAK),
    }
}

/// Result of building a feed WHERE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilter {
    /// SQL fragment, always starting with the live-post predicate.
    pub where_clause: String,
    /// Parameters in placeholder order.
    pub params: Vec<QueryParam>,
}

impl FeedFilter {
    /// Index of the next free `$n` placeholder.
    pub fn next_param(&self, param_offset: usize) -> usize {
        param_offset + self.params.len() + 1
    }
}

/// Builds the WHERE clause shared by the feed's id and count queries.
///
/// # Example
///
/// ```rust,ignore
/// let params = FeedQuery { tag: Some("Cats".into()), ..Default::default() }.resolve();
/// let filter = FeedFilterQueryBuilder::new(&params, 0).build();
/// // filter.where_clause:
/// //   "p.is_deleted = FALSE AND EXISTS (SELECT 1 FROM post_tag pt JOIN tag t ... t.name = $1)"
/// // filter.params: [QueryParam::String("cats")]
/// ```
pub struct FeedFilterQueryBuilder<'a> {
    params: &'a FeedParams,
    param_offset: usize,
}

impl<'a> FeedFilterQueryBuilder<'a> {
    /// `param_offset` is the number of placeholders already used by the
    /// surrounding query.
    pub fn new(params: &'a FeedParams, param_offset: usize) -> Self {
        Self {
            params,
            param_offset,
        }
    }

    pub fn build(&self) -> FeedFilter {
        let mut clauses = vec![live_post_predicate().to_string()];
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        if let Some(author_id) = self.params.author_id {
            param_idx += 1;
            clauses.push(format!("p.author_id = ${}", param_idx));
            params.push(QueryParam::Uuid(author_id));
        }

        if let Some(pet_id) = self.params.pet_id {
            param_idx += 1;
            clauses.push(format!("p.pet_id = ${}", param_idx));
            params.push(QueryParam::Uuid(pet_id));
        }

        // Semi-join: at most one row per post no matter how many tags it has.
        if let Some(tag) = &self.params.tag {
            param_idx += 1;
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM post_tag pt JOIN tag t ON t.id = pt.tag_id WHERE pt.post_id = p.id AND t.name = ${})",
                param_idx
            ));
            params.push(QueryParam::String(tag.clone()));
        }

        FeedFilter {
            where_clause: clauses.join(" AND "),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawprint_core::FeedQuery;

    #[test]
    fn test_empty_filter_is_live_only() {
        let params = FeedParams::default();
        let filter = FeedFilterQueryBuilder::new(&params, 0).build();

        assert_eq!(filter.where_clause, "p.is_deleted = FALSE");
        assert!(filter.params.is_empty());
        assert_eq!(filter.next_param(0), 1);
    }

    #[test]
    fn test_all_filters_numbered_in_order() {
        let author = Uuid::new_v4();
        let pet = Uuid::new_v4();
        let params = FeedQuery {
            author_id: Some(author),
            pet_id: Some(pet),
            tag: Some("#Cats".to_string()),
            ..Default::default()
        }
        .resolve();
        let filter = FeedFilterQueryBuilder::new(&params, 0).build();

        assert!(filter.where_clause.starts_with("p.is_deleted = FALSE AND "));
        assert!(filter.where_clause.contains("p.author_id = $1"));
        assert!(filter.where_clause.contains("p.pet_id = $2"));
        assert!(filter.where_clause.contains("t.name = $3"));
        assert_eq!(
            filter.params,
            vec![
                QueryParam::Uuid(author),
                QueryParam::Uuid(pet),
                QueryParam::String("cats".to_string()),
            ]
        );
        assert_eq!(filter.next_param(0), 4);
    }

    #[test]
    fn test_param_offset_shifts_placeholders() {
        let params = FeedQuery {
            pet_id: Some(Uuid::new_v4()),
            ..Default::default()
        }
        .resolve();
        let filter = FeedFilterQueryBuilder::new(&params, 2).build();

        assert!(filter.where_clause.contains("p.pet_id = $3"));
        assert_eq!(filter.next_param(2), 4);
    }

    #[test]
    fn test_tag_filter_uses_semi_join() {
        let params = FeedQuery {
            tag: Some("dogs".to_string()),
            ..Default::default()
        }
        .resolve();
        let filter = FeedFilterQueryBuilder::new(&params, 0).build();

        assert!(filter.where_clause.contains("EXISTS (SELECT 1 FROM post_tag"));
        assert!(!filter.where_clause.contains("LEFT JOIN"));
    }

    #[test]
    fn test_order_clauses_share_tie_break() {
        for sort in [SortBy::Latest, SortBy::Popular, SortBy::Hot] {
            assert!(
                order_clause(sort).ends_with("p.created_at DESC, p.id DESC"),
                "{} must end with the deterministic tie-break",
                sort
            );
        }
        assert!(order_clause(SortBy::Popular).starts_with("p.like_count DESC"));
    }

    #[test]
    fn test_hot_order_uses_weights() {
        let clause = order_clause(SortBy::Hot);
        assert!(clause.contains("p.like_count::bigint * 2"));
        assert!(clause.contains("p.comment_count::bigint * 3"));
        assert!(clause.contains("p.share_count::bigint * 5"));
    }
}
