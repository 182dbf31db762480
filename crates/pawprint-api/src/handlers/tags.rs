//! Tag HTTP handlers.

use axum::{
    extract::{Query, State},
    Json,
};

use pawprint_core::{Tag, TagRepository};

use crate::query_types::TagListParams;
use crate::{ApiError, AppState};

/// Most-used tags first.
///
/// # Query Parameters
/// - `limit`: number of tags (default 20, max 100)
pub async fn list_popular_tags(
    State(state): State<AppState>,
    Query(query): Query<TagListParams>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.db.tags.list_popular(query.limit()).await?))
}
