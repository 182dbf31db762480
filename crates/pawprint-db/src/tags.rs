//! Tag repository: canonical upsert and post association.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use pawprint_core::defaults::{TAG_LIST_LIMIT, TAG_LIST_LIMIT_MAX};
use pawprint_core::{new_v7, normalize_tag_names, Error, Result, Tag, TagRepository};

use crate::filter::live_post_predicate;

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Look up a tag by canonical name.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        sqlx::query_as::<_, Tag>(
            "SELECT id, name, usage_count, created_at FROM tag WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn insert(&self, name: &str) -> Result<Tag> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tag (id, name, usage_count, created_at) VALUES ($1, $2, 0, $3)
             RETURNING id, name, usage_count, created_at",
        )
        .bind(new_v7())
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    /// Return the tag named `name` (already canonical), creating it if needed.
    ///
    /// Two callers racing to create the same new name both succeed: the loser
    /// hits the unique constraint and re-reads the winner's row.
    pub async fn resolve_or_create(&self, name: &str) -> Result<Tag> {
        if let Some(tag) = self.get_by_name(name).await? {
            debug!(
                subsystem = "database",
                component = "tags",
                op = "resolve",
                tag = name,
                "Reusing existing tag"
            );
            return Ok(tag);
        }

        self.create_or_reread(name).await
    }

    /// Insert a tag the caller did not find. If another writer created the
    /// same name in the meantime, return that writer's row instead.
    pub async fn create_or_reread(&self, name: &str) -> Result<Tag> {
        match self.insert(name).await {
            Ok(tag) => {
                debug!(
                    subsystem = "database",
                    component = "tags",
                    op = "resolve",
                    tag = name,
                    "Created tag"
                );
                Ok(tag)
            }
            Err(e) if e.is_unique_violation() => {
                warn!(
                    subsystem = "database",
                    component = "tags",
                    op = "resolve",
                    tag = name,
                    "Tag created concurrently, re-resolving"
                );
                self.get_by_name(name).await?.ok_or_else(|| {
                    Error::Internal(format!("Tag '{}' missing after unique violation", name))
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Replace a post's tag set inside an existing transaction.
    ///
    /// Locks the live post row so concurrent replacements on the same post
    /// serialize, then applies the difference and adjusts usage counters.
    /// A soft-deleted post is `PostNotFound`: its tags no longer count.
    pub async fn set_for_post_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        post_id: Uuid,
        tags: &[Tag],
    ) -> Result<()> {
        let sql = format!(
            "SELECT p.id FROM post p WHERE p.id = $1 AND {} FOR UPDATE",
            live_post_predicate()
        );
        let locked: Option<Uuid> = sqlx::query_scalar(&sql)
            .bind(post_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;
        if locked.is_none() {
            return Err(Error::PostNotFound(post_id));
        }

        let current: HashSet<Uuid> =
            sqlx::query_scalar::<_, Uuid>("SELECT tag_id FROM post_tag WHERE post_id = $1")
                .bind(post_id)
                .fetch_all(&mut **tx)
                .await
                .map_err(Error::Database)?
                .into_iter()
                .collect();
        let wanted: HashSet<Uuid> = tags.iter().map(|t| t.id).collect();

        let removed: Vec<Uuid> = current.difference(&wanted).copied().collect();
        let added: Vec<Uuid> = wanted.difference(&current).copied().collect();

        if !removed.is_empty() {
            sqlx::query("DELETE FROM post_tag WHERE post_id = $1 AND tag_id = ANY($2)")
                .bind(post_id)
                .bind(&removed)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;

            sqlx::query(
                "UPDATE tag SET usage_count = GREATEST(usage_count - 1, 0) WHERE id = ANY($1)",
            )
            .bind(&removed)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        }

        if !added.is_empty() {
            sqlx::query(
                "INSERT INTO post_tag (post_id, tag_id, created_at)
                 SELECT $1, tag_id, $3 FROM UNNEST($2::uuid[]) AS tag_id
                 ON CONFLICT (post_id, tag_id) DO NOTHING",
            )
            .bind(post_id)
            .bind(&added)
            .bind(Utc::now())
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

            sqlx::query("UPDATE tag SET usage_count = usage_count + 1 WHERE id = ANY($1)")
                .bind(&added)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
        }

        debug!(
            subsystem = "database",
            component = "tags",
            op = "set_for_post",
            post_id = %post_id,
            added = added.len(),
            removed = removed.len(),
            "Replaced post tag set"
        );
        Ok(())
    }

    /// Drop a post's contribution to tag usage counters (on soft delete).
    ///
    /// The association rows stay; only the counters change.
    pub async fn release_for_post_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        post_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE tag SET usage_count = GREATEST(usage_count - 1, 0)
             WHERE id IN (SELECT tag_id FROM post_tag WHERE post_id = $1)",
        )
        .bind(post_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn normalize_tags(&self, names: &[String]) -> Result<Vec<Tag>> {
        let canonical = normalize_tag_names(names);
        let mut tags = Vec::with_capacity(canonical.len());
        for name in &canonical {
            tags.push(self.resolve_or_create(name).await?);
        }
        Ok(tags)
    }

    async fn set_for_post(&self, post_id: Uuid, tags: &[Tag]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        self.set_for_post_tx(&mut tx, post_id, tags).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn get_for_post(&self, post_id: Uuid) -> Result<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name, t.usage_count, t.created_at
            FROM post_tag pt
            JOIN tag t ON t.id = pt.tag_id
            WHERE pt.post_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn list_popular(&self, limit: i64) -> Result<Vec<Tag>> {
        let limit = if limit < 1 {
            TAG_LIST_LIMIT
        } else {
            limit.min(TAG_LIST_LIMIT_MAX)
        };

        sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, usage_count, created_at
            FROM tag
            WHERE usage_count > 0
            ORDER BY usage_count DESC, name ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }
}
