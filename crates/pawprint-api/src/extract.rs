//! Request extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the acting user's id, set by the upstream session layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user performing a write.
///
/// Rejects with 401 when the header is missing or not a UUID.
///
/// ```ignore
/// async fn like_post(ActorId(user_id): ActorId, Path(id): Path<Uuid>) -> ... {}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        Uuid::parse_str(raw.trim())
            .map(ActorId)
            .map_err(|_| ApiError::Unauthorized("Invalid user id".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(req: Request<()>) -> Result<ActorId, ApiError> {
        let (mut parts, _) = req.into_parts();
        ActorId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header() {
        let id = Uuid::new_v4();
        let req = Request::builder()
            .header(USER_ID_HEADER, id.to_string())
            .body(())
            .unwrap();
        assert_eq!(extract(req).await.unwrap(), ActorId(id));
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let req = Request::builder().body(()).unwrap();
        let err = extract(req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_header_is_unauthorized() {
        let req = Request::builder()
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        let err = extract(req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
