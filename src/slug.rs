//! URL-safe identifiers for shareable release links.

/// Number of leading id characters appended to a release slug.
pub const ID_FRAGMENT_LEN: usize = 8;

/// Lowercase the text, collapse every run of characters outside `[a-z0-9]`
/// into a single `-`, and trim dashes from both ends.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split(|ch: char| !(ch.is_ascii_lowercase() || ch.is_ascii_digit()))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `<slugified-title>-<first 8 chars of id>`, or just the id fragment when the
/// title has no sluggable characters.
pub fn release_slug(title: &str, id: &str) -> String {
    let fragment: String = id.chars().take(ID_FRAGMENT_LEN).collect();
    with_suffix(title, &fragment)
}

/// Fallback used when the short fragment is already taken by another release.
pub fn release_slug_full(title: &str, id: &str) -> String {
    with_suffix(title, id)
}

fn with_suffix(title: &str, suffix: &str) -> String {
    let base = slugify(title);
    if base.is_empty() {
        suffix.to_string()
    } else {
        format!("{base}-{suffix}")
    }
}
