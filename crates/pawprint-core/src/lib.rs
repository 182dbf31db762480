//! # pawprint-core
//!
//! Core types, traits, and abstractions for the pawprint feed.
//!
//! This crate provides the data structures, tag canonicalization and
//! repository traits that the database and API crates depend on.

pub mod defaults;
pub mod error;
pub mod feed;
pub mod models;
pub mod tags;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use feed::{order_by_ids, total_pages, FeedPage, FeedParams, FeedQuery, SortBy};
pub use models::*;
pub use tags::{normalize_tag_name, normalize_tag_names, validate_tag_input};
pub use traits::*;
pub use uuid_utils::new_v7;
