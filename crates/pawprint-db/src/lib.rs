//! # pawprint-db
//!
//! PostgreSQL database layer for the pawprint feed.
//!
//! This crate provides:
//! - Connection pool management
//! - The two-phase feed query (ids first, then hydration)
//! - Canonical tag upsert and post/tag association
//! - Post lifecycle and engagement counters
//!
//! ## Example
//!
//! ```rust,ignore
//! use pawprint_db::{Database, FeedQuery, FeedRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/pawprint").await?;
//!
//!     let params = FeedQuery {
//!         sort_by: Some("hot".to_string()),
//!         tag: Some("#Cats".to_string()),
//!         ..Default::default()
//!     }
//!     .resolve();
//!     let page = db.feed.query_feed(&params).await?;
//!
//!     println!("{} of {} posts", page.items.len(), page.total);
//!     Ok(())
//! }
//! ```
pub mod feed;
pub mod filter;
mod hydrate;
pub mod pool;
pub mod posts;
pub mod tags;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use pawprint_core::*;

pub use feed::PgFeedRepository;
pub use filter::{FeedFilter, FeedFilterQueryBuilder, QueryParam};
pub use pool::{create_lazy_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use posts::PgPostRepository;
pub use tags::PgTagRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Paginated feed reads.
    pub feed: PgFeedRepository,
    /// Post lifecycle and counters.
    pub posts: PgPostRepository,
    /// Canonical tags.
    pub tags: PgTagRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            feed: PgFeedRepository::new(pool.clone()),
            posts: PgPostRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Create without opening any connection until first use.
    pub fn connect_lazy(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_lazy_pool(url, config)?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
