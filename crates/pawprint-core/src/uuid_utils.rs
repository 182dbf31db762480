//! UUIDv7 helpers for post and tag identifiers.
//!
//! UUIDv7 embeds a millisecond Unix timestamp in its first 48 bits, so ids
//! minted later compare greater. The feed relies on this for its final
//! `id DESC` tie-break staying roughly chronological.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// ```
/// use pawprint_core::uuid_utils::{is_v7, new_v7};
///
/// assert!(is_v7(&new_v7()));
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// True if `id` is a version 7 UUID.
pub fn is_v7(id: &Uuid) -> bool {
    id.get_version_num() == 7
}
