//! SQL identifier validation.
//!
//! Table and column names arrive via configuration and are interpolated into
//! query strings, so they must never carry anything beyond `[A-Za-z0-9_]`.

/// True iff `name` is non-empty and contains only ASCII alphanumerics or `_`.
pub fn is_safe_ident(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// Returns `candidate` when it passes [`is_safe_ident`], else `fallback`.
pub fn safe_ident<'a>(candidate: &'a str, fallback: &'a str) -> &'a str {
    if is_safe_ident(candidate) {
        candidate
    } else {
        fallback
    }
}
