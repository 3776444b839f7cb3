//! Free-text normalization for predicates, object and attribute names.
//!
//! Normalized text is lowercase, contains only alphanumeric word tokens, and
//! separates tokens with exactly one space. An empty result means the input
//! had no usable content; callers discard such candidates.

/// Normalize a raw annotation string.
///
/// - Letters are lowercased.
/// - Apostrophes are dropped in place (`"man's"` becomes `"mans"`).
/// - Any other non-alphanumeric character separates tokens.
/// - Runs of separators collapse to a single space; no leading or trailing space.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c == '\'' || c == '\u{2019}' {
            continue;
        }
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// Split normalized text into its tokens.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}

/// Number of tokens in normalized text.
pub fn token_count(normalized: &str) -> usize {
    tokens(normalized).count()
}
