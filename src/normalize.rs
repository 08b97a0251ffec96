//! Input normalisation helpers for URLs, group lists and rule names.
//!
//! User- and backend-supplied strings pass through one of these functions
//! before they are displayed or compared.

use url::Url;

use crate::constants::{MIN_CONSTRAINT_MARKER, PATCH_MARKER};

/// Normalise the `original_url` query parameter of the blocked request.
///
/// An absolute URL is returned in canonical form; anything else is assumed to
/// be a bare host or path and gets `https://` prepended. Returns `None` when
/// the parameter is absent or blank.
pub fn normalize_original_url(input: Option<&str>) -> Option<String> {
    let trimmed = input.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Some(format!("https://{}", trimmed)),
    }
}

/// Filter groups by a case-insensitive substring and sort them alphabetically.
pub fn filter_groups<S: AsRef<str>>(groups: &[S], search: &str) -> Vec<String> {
    let needle = search.trim().to_lowercase();
    let mut matched: Vec<String> = groups
        .iter()
        .map(|g| g.as_ref())
        .filter(|g| needle.is_empty() || g.to_lowercase().contains(&needle))
        .map(str::to_string)
        .collect();

    matched.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    matched
}

/// Classify an OS version rule by name: `(is_min_constraint, is_patch)`.
pub fn classify_os_rule_name(rule_name: &str) -> (bool, bool) {
    let lower = rule_name.to_lowercase();
    (
        lower.contains(MIN_CONSTRAINT_MARKER),
        lower.contains(PATCH_MARKER),
    )
}
