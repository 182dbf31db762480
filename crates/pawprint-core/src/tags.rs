//! Tag name canonicalization.
//!
//! Every lookup and insert of a tag goes through [`normalize_tag_name`] first,
//! so "#Cats", "cats" and " CATS " all resolve to the same stored record.

use std::collections::HashSet;

use crate::defaults::{MAX_TAGS_PER_POST, TAG_MARKER, TAG_NAME_MAX_LEN};
use crate::error::{Error, Result};

/// Canonicalize a single free-text tag.
///
/// Trims, lowercases and strips exactly one leading `#`. Returns `None` if
/// nothing is left.
///
/// ```
/// use pawprint_core::normalize_tag_name;
///
/// assert_eq!(normalize_tag_name(" #Cats "), Some("cats".to_string()));
/// assert_eq!(normalize_tag_name("##dogs"), Some("#dogs".to_string()));
/// assert_eq!(normalize_tag_name("#"), None);
/// ```
pub fn normalize_tag_name(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let stripped = lowered
        .strip_prefix(TAG_MARKER)
        .unwrap_or(lowered.as_str())
        .trim();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// Canonicalize a list of tags, dropping empties and collapsing duplicates.
///
/// The first occurrence of each canonical name keeps its position.
pub fn normalize_tag_names<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|t| normalize_tag_name(t.as_ref()))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Boundary validation for a caller-supplied tag list.
///
/// Rejects more than [`MAX_TAGS_PER_POST`] entries and any entry whose
/// canonical form is longer than [`TAG_NAME_MAX_LEN`].
pub fn validate_tag_input<S: AsRef<str>>(raw: &[S]) -> Result<()> {
    if raw.len() > MAX_TAGS_PER_POST {
        return Err(Error::InvalidInput(format!(
            "A post may carry at most {} tags (got {})",
            MAX_TAGS_PER_POST,
            raw.len()
        )));
    }
    for tag in raw {
        if let Some(name) = normalize_tag_name(tag.as_ref()) {
            if name.chars().count() > TAG_NAME_MAX_LEN {
                return Err(Error::InvalidInput(format!(
                    "Tag '{}' must be {} characters or less",
                    name, TAG_NAME_MAX_LEN
                )));
            }
        }
    }
    Ok(())
}
