//! HTTP handlers for pawprint-api.

pub mod health;
pub mod posts;
pub mod tags;
