//! Post and feed HTTP handlers.
//!
//! Reads are open. Writes require an [`ActorId`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use pawprint_core::{
    Counter, CounterDelta, CreatePostRequest, FeedPage, FeedQuery, FeedRepository, Post,
    PostCounters, PostRepository, Tag, TagRepository, UpdatePostRequest,
};

use crate::extract::ActorId;
use crate::query_types::FeedQueryParams;
use crate::{ApiError, AppState};

/// Paginated feed.
///
/// # Query Parameters
/// - `page`, `limit`: 1-based page and page size (defaults 1 and 20, max 50)
/// - `sortBy`: `latest` (default), `popular` or `hot`
/// - `authorId`, `petId`: exact-match filters
/// - `tag`: tag name in any spelling (`Cats`, `#cats`)
pub async fn list_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQueryParams>,
) -> Result<Json<FeedPage<Post>>, ApiError> {
    let params = FeedQuery::from(query).resolve();
    let page = state.db.feed.query_feed(&params).await?;
    Ok(Json(page))
}

/// Create a post owned by the caller.
///
/// # Returns
/// - 201 Created with the hydrated post
/// - 400 Bad Request on validation failure (e.g. more than 10 tags)
/// - 401 Unauthorized without a valid `X-User-Id`
pub async fn create_post(
    State(state): State<AppState>,
    ActorId(author_id): ActorId,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state.db.posts.create(author_id, body).await?;
    info!(
        subsystem = "api",
        op = "create_post",
        post_id = %post.id,
        "Post created"
    );
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.db.posts.fetch(id).await?))
}

/// Patch a post. A `tags` field replaces the whole tag set.
pub async fn update_post(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    Ok(Json(state.db.posts.update(actor_id, id, body).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    ActorId(actor_id): ActorId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.posts.soft_delete(actor_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_post_tags(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    // 404 for soft-deleted posts, same as a direct fetch.
    state.db.posts.fetch(id).await?;
    Ok(Json(state.db.tags.get_for_post(id).await?))
}

async fn adjust(
    state: &AppState,
    id: Uuid,
    counter: Counter,
    delta: CounterDelta,
) -> Result<Json<PostCounters>, ApiError> {
    Ok(Json(
        state.db.posts.adjust_counter(id, counter, delta).await?,
    ))
}

pub async fn like_post(
    State(state): State<AppState>,
    ActorId(_): ActorId,
    Path(id): Path<Uuid>,
) -> Result<Json<PostCounters>, ApiError> {
    adjust(&state, id, Counter::Like, CounterDelta::Increment).await
}

pub async fn unlike_post(
    State(state): State<AppState>,
    ActorId(_): ActorId,
    Path(id): Path<Uuid>,
) -> Result<Json<PostCounters>, ApiError> {
    adjust(&state, id, Counter::Like, CounterDelta::Decrement).await
}

pub async fn share_post(
    State(state): State<AppState>,
    ActorId(_): ActorId,
    Path(id): Path<Uuid>,
) -> Result<Json<PostCounters>, ApiError> {
    adjust(&state, id, Counter::Share, CounterDelta::Increment).await
}

/// Called by the comment service when a comment is added.
pub async fn increment_comments(
    State(state): State<AppState>,
    ActorId(_): ActorId,
    Path(id): Path<Uuid>,
) -> Result<Json<PostCounters>, ApiError> {
    adjust(&state, id, Counter::Comment, CounterDelta::Increment).await
}

/// Called by the comment service when a comment is removed.
pub async fn decrement_comments(
    State(state): State<AppState>,
    ActorId(_): ActorId,
    Path(id): Path<Uuid>,
) -> Result<Json<PostCounters>, ApiError> {
    adjust(&state, id, Counter::Comment, CounterDelta::Decrement).await
}
