//! Request URL to manifest path normalization.

use percent_encoding::percent_decode_str;

/// Normalize a request URL into a manifest lookup path.
///
/// Strips the query and fragment, percent-decodes, drops empty and `.`
/// segments and keeps a trailing slash. Returns `None` for `..` segments
/// or undecodable input.
pub fn normalize_url(url: &str) -> Option<String> {
    let raw = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;

    // Backslashes are separators for some clients
    let decoded = decoded.replace('\\', "/");

    let mut path = String::with_capacity(decoded.len() + 1);
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            segment => {
                path.push('/');
                path.push_str(segment);
            }
        }
    }

    if path.is_empty() || decoded.ends_with('/') {
        path.push('/');
    }
    Some(path)
}

/// Route part of a request URL (no query or fragment), undecoded.
pub fn route_of(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or_default()
}
