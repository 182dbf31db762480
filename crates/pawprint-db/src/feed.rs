//! Feed repository: two-phase paginated query over live posts.
//!
//! Phase one selects only post ids, with filters, ordering and LIMIT/OFFSET
//! applied. Phase two hydrates exactly those ids (see `hydrate`) and puts
//! them back into phase-one order. LIMIT never touches a query that joins
//! the many-to-many tag relation.
//!
//! An empty id list skips hydration only. A page past the end still reports
//! the real `total` and `total_pages = ceil(total / limit)` rather than 0;
//! `total_pages` is 0 only when nothing matches.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use pawprint_core::{Error, FeedPage, FeedParams, FeedRepository, Post, Result};

use crate::filter::{bind_query_params, order_clause, FeedFilterQueryBuilder};
use crate::hydrate::hydrate_posts;

/// PostgreSQL implementation of FeedRepository.
#[derive(Clone)]
pub struct PgFeedRepository {
    pool: Pool<Postgres>,
}

impl PgFeedRepository {
    /// Create a new PgFeedRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Phase one: ordered ids for the requested page.
    async fn page_ids(&self, params: &FeedParams) -> Result<Vec<Uuid>> {
        let filter = FeedFilterQueryBuilder::new(params, 0).build();
        let limit_param = filter.next_param(0);
        let sql = format!(
            "SELECT p.id FROM post p WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            filter.where_clause,
            order_clause(params.sort_by),
            limit_param,
            limit_param + 1
        );

        let q = bind_query_params!(sqlx::query_scalar::<_, Uuid>(&sql), &filter.params);
        q.bind(params.limit)
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }

    /// Matching rows across all pages, same filter as [`Self::page_ids`].
    async fn count(&self, params: &FeedParams) -> Result<i64> {
        let filter = FeedFilterQueryBuilder::new(params, 0).build();
        let sql = format!("SELECT COUNT(*) FROM post p WHERE {}", filter.where_clause);

        let q = bind_query_params!(sqlx::query_scalar::<_, i64>(&sql), &filter.params);
        q.fetch_one(&self.pool).await.map_err(Error::Database)
    }
}

#[async_trait]
impl FeedRepository for PgFeedRepository {
    async fn query_feed(&self, params: &FeedParams) -> Result<FeedPage<Post>> {
        let start = Instant::now();

        // Independent of each other; hydration waits on the id list.
        let (ids, total) = tokio::try_join!(self.page_ids(params), self.count(params))?;

        if ids.is_empty() {
            debug!(
                subsystem = "database",
                component = "feed",
                op = "query_feed",
                sort_by = %params.sort_by,
                page = params.page,
                total,
                "Feed page is empty"
            );
            return Ok(FeedPage::empty(total, params));
        }

        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        let items = hydrate_posts(&mut conn, &ids).await?;

        debug!(
            subsystem = "database",
            component = "feed",
            op = "query_feed",
            sort_by = %params.sort_by,
            page = params.page,
            limit = params.limit,
            author_id = ?params.author_id,
            pet_id = ?params.pet_id,
            tag = params.tag.as_deref().unwrap_or(""),
            result_count = items.len(),
            total,
            duration_ms = start.elapsed().as_millis() as u64,
            "Feed page served"
        );

        Ok(FeedPage::new(items, total, params))
    }
}
