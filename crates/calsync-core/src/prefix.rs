//! Title policies used by reconcile.
//!
//! Matching is an exact literal prefix match: case-sensitive, no trimming. An empty
//! prefix is treated as "no prefix configured" and never matches.

/// True if `prefix` is non-empty and `title` starts with it.
pub fn has_prefix(title: &str, prefix: &str) -> bool {
    !prefix.is_empty() && title.starts_with(prefix)
}

/// Whether a title is excluded by an optional filter prefix.
pub fn is_filtered(title: &str, filter_prefix: Option<&str>) -> bool {
    filter_prefix.is_some_and(|prefix| has_prefix(title, prefix))
}

/// Prepend `prefix` to `title` unless it is already there.
///
/// Returns `None` when the title is left unchanged.
pub fn apply_prefix(title: &str, prefix: &str) -> Option<String> {
    if prefix.is_empty() || title.starts_with(prefix) {
        None
    } else {
        Some(format!("{}{}", prefix, title))
    }
}
