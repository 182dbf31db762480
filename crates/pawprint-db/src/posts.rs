//! Post repository: create, fetch, patch, soft delete, engagement counters.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use pawprint_core::{
    new_v7, Counter, CounterDelta, CreatePostRequest, Error, Post, PostBody, PostCounters,
    PostRepository, Result, TagRepository, UpdatePostRequest,
};

use crate::filter::live_post_predicate;
use crate::hydrate::hydrate_posts;
use crate::tags::PgTagRepository;

/// PostgreSQL implementation of PostRepository.
#[derive(Clone)]
pub struct PgPostRepository {
    pool: Pool<Postgres>,
    tags: PgTagRepository,
}

impl PgPostRepository {
    /// Create a new PgPostRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        let tags = PgTagRepository::new(pool.clone());
        Self { pool, tags }
    }

    /// Lock a live post and check that `actor_id` owns it.
    async fn lock_owned_tx(
        tx: &mut Transaction<'_, Postgres>,
        actor_id: Uuid,
        id: Uuid,
    ) -> Result<()> {
        let sql = format!(
            "SELECT p.author_id FROM post p WHERE p.id = $1 AND {} FOR UPDATE",
            live_post_predicate()
        );
        let author_id: Option<Uuid> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;

        match author_id {
            None => Err(Error::PostNotFound(id)),
            Some(author_id) if author_id != actor_id => Err(Error::Forbidden(format!(
                "Post {} belongs to another user",
                id
            ))),
            Some(_) => Ok(()),
        }
    }

    /// A post may only reference a pet owned by its author.
    async fn check_pet_tx(
        tx: &mut Transaction<'_, Postgres>,
        author_id: Uuid,
        pet_id: Uuid,
    ) -> Result<()> {
        let owner_id: Option<Uuid> = sqlx::query_scalar("SELECT owner_id FROM pet WHERE id = $1")
            .bind(pet_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;

        match owner_id {
            None => Err(Error::InvalidInput(format!("Unknown pet: {}", pet_id))),
            Some(owner_id) if owner_id != author_id => Err(Error::Forbidden(format!(
                "Pet {} belongs to another user",
                pet_id
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Stored content and media of a post already locked by this transaction.
    async fn body_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<PostBody> {
        let (content, media_type, media_urls): (String, Option<String>, Vec<String>) =
            sqlx::query_as("SELECT content, media_type, media_urls FROM post WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(Error::Database)?
                .ok_or(Error::PostNotFound(id))?;

        Ok(PostBody {
            content,
            media_type: media_type.and_then(|m| m.parse().ok()),
            media_urls,
        })
    }

    async fn hydrate_one_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Post> {
        hydrate_posts(&mut **tx, &[id])
            .await?
            .pop()
            .ok_or(Error::PostNotFound(id))
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, author_id: Uuid, req: CreatePostRequest) -> Result<Post> {
        req.validate()?;

        // Resolved on the pool: a lost creation race must not abort the post
        // transaction below.
        let tags = self.tags.normalize_tags(&req.tags).await?;

        let id = new_v7();
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        if let Some(pet_id) = req.pet_id {
            Self::check_pet_tx(&mut tx, author_id, pet_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO post (id, author_id, pet_id, content, media_type, media_urls,
                              like_count, comment_count, share_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, 0, 0, $7, $7)
            "#,
        )
        .bind(id)
        .bind(author_id)
        .bind(req.pet_id)
        .bind(&req.content)
        .bind(
            req.media_type
                .filter(|_| !req.media_urls.is_empty())
                .map(|m| m.as_str()),
        )
        .bind(&req.media_urls)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        self.tags.set_for_post_tx(&mut tx, id, &tags).await?;
        let post = Self::hydrate_one_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "posts",
            op = "create",
            post_id = %id,
            author_id = %author_id,
            tag_count = tags.len(),
            "Post created"
        );
        Ok(post)
    }

    async fn fetch(&self, id: Uuid) -> Result<Post> {
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        hydrate_posts(&mut conn, &[id])
            .await?
            .pop()
            .ok_or(Error::PostNotFound(id))
    }

    async fn update(&self, actor_id: Uuid, id: Uuid, req: UpdatePostRequest) -> Result<Post> {
        req.validate()?;

        let tags = match &req.tags {
            Some(names) => Some(self.tags.normalize_tags(names).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        Self::lock_owned_tx(&mut tx, actor_id, id).await?;
        let body = req.apply(Self::body_tx(&mut tx, id).await?)?;

        if let Some(pet_id) = req.pet_id {
            Self::check_pet_tx(&mut tx, actor_id, pet_id).await?;
        }

        sqlx::query(
            r#"
            UPDATE post SET
                pet_id = COALESCE($2, pet_id),
                content = $3,
                media_type = $4,
                media_urls = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.pet_id)
        .bind(&body.content)
        .bind(body.media_type.map(|m| m.as_str()))
        .bind(&body.media_urls)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if let Some(tags) = &tags {
            self.tags.set_for_post_tx(&mut tx, id, tags).await?;
        }

        let post = Self::hydrate_one_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "posts",
            op = "update",
            post_id = %id,
            tags_replaced = tags.is_some(),
            "Post updated"
        );
        Ok(post)
    }

    async fn soft_delete(&self, actor_id: Uuid, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        Self::lock_owned_tx(&mut tx, actor_id, id).await?;

        let now = Utc::now();
        sqlx::query("UPDATE post SET is_deleted = TRUE, deleted_at = $2, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        self.tags.release_for_post_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "posts",
            op = "soft_delete",
            post_id = %id,
            "Post soft-deleted"
        );
        Ok(())
    }

    async fn adjust_counter(
        &self,
        id: Uuid,
        counter: Counter,
        delta: CounterDelta,
    ) -> Result<PostCounters> {
        let sql = format!(
            "UPDATE post p SET {col} = {expr} WHERE p.id = $1 AND {live}
             RETURNING p.like_count, p.comment_count, p.share_count",
            col = counter.column(),
            expr = counter_expr(counter, delta),
            live = live_post_predicate()
        );

        let counters = sqlx::query_as::<_, PostCounters>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::PostNotFound(id))?;

        debug!(
            subsystem = "database",
            component = "posts",
            op = "adjust_counter",
            post_id = %id,
            counter = counter.column(),
            delta = ?delta,
            "Counter adjusted"
        );
        Ok(counters)
    }
}

/// Right-hand side of the counter SET clause. Decrement floors at zero.
fn counter_expr(counter: Counter, delta: CounterDelta) -> String {
    let col = counter.column();
    match delta {
        CounterDelta::Increment => format!("{} + 1", col),
        CounterDelta::Decrement => format!("GREATEST({} - 1, 0)", col),
    }
}
