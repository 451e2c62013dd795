//! URL slug generation and validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 200;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid regex"));

/// Derive a slug from free text: lowercase ASCII alphanumerics separated by
/// single hyphens.
///
/// ```
/// use eduportal_core::slug::slugify;
///
/// assert_eq!(slugify("  Rust for Beginners: Part 2! "), "rust-for-beginners-part-2");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Validate a caller-supplied slug.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.len() > MAX_SLUG_LEN {
        return Err(CoreError::Validation(format!(
            "Slug must be at most {MAX_SLUG_LEN} characters"
        )));
    }
    if !SLUG_RE.is_match(slug) {
        return Err(CoreError::Validation(format!(
            "Invalid slug '{slug}'. Use lowercase letters, digits and single hyphens"
        )));
    }
    Ok(())
}

/// Use the supplied slug if present, otherwise derive one from `fallback`.
/// The result is always validated.
pub fn resolve_slug(explicit: Option<&str>, fallback: &str) -> Result<String, CoreError> {
    let slug = match explicit {
        Some(s) => s.trim().to_string(),
        None => slugify(fallback),
    };
    validate_slug(&slug)?;
    Ok(slug)
}
