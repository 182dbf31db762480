//! # pawprint-api
//!
//! HTTP surface for the pawprint feed: the paginated feed, post lifecycle,
//! engagement counters and tag listing.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod query_types;
pub mod state;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use config::ApiConfig;
pub use error::ApiError;
pub use extract::{ActorId, USER_ID_HEADER};
pub use state::AppState;

use handlers::{health, posts, tags};

/// Build the application router.
pub fn router(state: AppState, cors_origins: Vec<HeaderValue>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Feed and posts
        .route("/api/v1/posts", get(posts::list_feed).post(posts::create_post))
        .route(
            "/api/v1/posts/:id",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/api/v1/posts/:id/tags", get(posts::get_post_tags))
        // Engagement counters
        .route(
            "/api/v1/posts/:id/like",
            post(posts::like_post).delete(posts::unlike_post),
        )
        .route("/api/v1/posts/:id/share", post(posts::share_post))
        .route(
            "/api/v1/posts/:id/comments-count",
            post(posts::increment_comments).delete(posts::decrement_comments),
        )
        // Tags
        .route("/api/v1/tags", get(tags::list_popular_tags))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    HeaderName::from_static(USER_ID_HEADER),
                ])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .with_state(state)
}
