// src/site/normalize.rs
// =============================================================================
// Canonical form for site URLs.
//
// Every key in the site store is a URL in this form, so anything that
// compares URLs (mirror de-duplication, redirect detection) goes through here.
// =============================================================================

/// Canonicalizes a raw URL string.
///
/// - Strips exactly one trailing `/`
/// - Prefixes `https://` when no `http://` / `https://` scheme is present
/// - Empty input stays empty (not an error), and so does a lone `/`
///
/// Example:
///   "example.com/"  -> "https://example.com"
///   "http://a.com"  -> "http://a.com"
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let url = raw.strip_suffix('/').unwrap_or(raw);
    if url.is_empty() {
        return String::new();
    }

    if has_http_scheme(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Removes one trailing slash, leaving the scheme alone.
pub fn strip_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

fn has_http_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
