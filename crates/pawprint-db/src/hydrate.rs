//! Hydration of post ids into full [`Post`] records.
//!
//! Hydration never paginates, so the many-to-many tag relation cannot
//! multiply rows or shift page boundaries. Tags for the whole id set come
//! from one extra query rather than one per post.

use std::collections::HashMap;

use sqlx::{PgConnection, Row};
use tracing::warn;
use uuid::Uuid;

use pawprint_core::{
    order_by_ids, AuthorSummary, Error, PetSummary, Post, PostCounters, Result, Tag,
};

use crate::filter::live_post_predicate;

/// Fetch live posts for `ids`, returned in the order of `ids`.
///
/// Ids that are missing or soft-deleted by the time this runs are dropped.
pub(crate) async fn hydrate_posts(conn: &mut PgConnection, ids: &[Uuid]) -> Result<Vec<Post>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        r#"
        SELECT
            p.id, p.author_id, p.pet_id, p.content, p.media_type, p.media_urls,
            p.like_count, p.comment_count, p.share_count, p.created_at, p.updated_at,
            u.username AS author_username, u.avatar_url AS author_avatar_url,
            pet.name AS pet_name, pet.avatar_url AS pet_avatar_url
        FROM post p
        LEFT JOIN user_profile u ON u.id = p.author_id
        LEFT JOIN pet ON pet.id = p.pet_id
        WHERE p.id = ANY($1) AND {}
        "#,
        live_post_predicate()
    );

    let rows = sqlx::query(&sql)
        .bind(ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(Error::Database)?;

    let mut tags = tags_for_posts(conn, ids).await?;

    let mut posts = Vec::with_capacity(rows.len());
    for row in rows {
        let id: Uuid = row.try_get("id").map_err(Error::Database)?;
        let author_id: Uuid = row.try_get("author_id").map_err(Error::Database)?;
        let pet_id: Option<Uuid> = row.try_get("pet_id").map_err(Error::Database)?;

        let author = row
            .try_get::<Option<String>, _>("author_username")
            .map_err(Error::Database)?
            .map(|username| -> Result<AuthorSummary> {
                Ok(AuthorSummary {
                    id: author_id,
                    username,
                    avatar_url: row.try_get("author_avatar_url").map_err(Error::Database)?,
                })
            })
            .transpose()?;

        let pet = match (
            pet_id,
            row.try_get::<Option<String>, _>("pet_name")
                .map_err(Error::Database)?,
        ) {
            (Some(pet_id), Some(name)) => Some(PetSummary {
                id: pet_id,
                name,
                avatar_url: row.try_get("pet_avatar_url").map_err(Error::Database)?,
            }),
            _ => None,
        };

        posts.push(Post {
            id,
            author_id,
            author,
            pet_id,
            pet,
            content: row.try_get("content").map_err(Error::Database)?,
            media_type: row
                .try_get::<Option<String>, _>("media_type")
                .map_err(Error::Database)?
                .and_then(|m| m.parse().ok()),
            media_urls: row.try_get("media_urls").map_err(Error::Database)?,
            counters: PostCounters {
                like_count: row.try_get("like_count").map_err(Error::Database)?,
                comment_count: row.try_get("comment_count").map_err(Error::Database)?,
                share_count: row.try_get("share_count").map_err(Error::Database)?,
            },
            tags: tags.remove(&id).unwrap_or_default(),
            created_at: row.try_get("created_at").map_err(Error::Database)?,
            updated_at: row.try_get("updated_at").map_err(Error::Database)?,
        });
    }

    let ordered = order_by_ids(ids, posts, |p| p.id);
    if ordered.len() < ids.len() {
        warn!(
            subsystem = "database",
            component = "feed",
            op = "hydrate",
            requested = ids.len(),
            hydrated = ordered.len(),
            "Some post ids did not hydrate; dropping them"
        );
    }
    Ok(ordered)
}

/// Tags for every post in `ids`, keyed by post id, each list sorted by name.
async fn tags_for_posts(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Tag>>> {
    let rows = sqlx::query(
        r#"
        SELECT pt.post_id, t.id, t.name, t.usage_count, t.created_at
        FROM post_tag pt
        JOIN tag t ON t.id = pt.tag_id
        WHERE pt.post_id = ANY($1)
        ORDER BY t.name
        "#,
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(Error::Database)?;

    let mut by_post: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in rows {
        let post_id: Uuid = row.try_get("post_id").map_err(Error::Database)?;
        by_post.entry(post_id).or_default().push(Tag {
            id: row.try_get("id").map_err(Error::Database)?,
            name: row.try_get("name").map_err(Error::Database)?,
            usage_count: row.try_get("usage_count").map_err(Error::Database)?,
            created_at: row.try_get("created_at").map_err(Error::Database)?,
        });
    }
    Ok(by_post)
}
