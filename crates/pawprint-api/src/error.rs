//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    Internal(pawprint_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<pawprint_core::Error> for ApiError {
    fn from(err: pawprint_core::Error) -> Self {
        use pawprint_core::Error;

        if err.is_unique_violation() {
            return ApiError::Conflict(err.to_string());
        }
        match err {
            Error::NotFound(_) | Error::PostNotFound(_) => ApiError::NotFound(err.to_string()),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(err) => {
                // Store details stay in the log.
                error!(subsystem = "api", error = %err, "Request failed");
                "Internal server error".to_string()
            }
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg) => msg,
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawprint_core::Error;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::PostNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (Error::NotFound("tag".into()), StatusCode::NOT_FOUND),
            (Error::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (Error::Forbidden("nope".into()), StatusCode::FORBIDDEN),
            (Error::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                Error::Database(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response = ApiError::from(Error::Internal("secret detail".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
