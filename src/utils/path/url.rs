//! Output path → URL path conversion.

use std::path::{Component, Path};

/// Convert a path relative to an output root into a URL path.
///
/// `assets\app.css` and `assets/app.css` both become `/assets/app.css`.
/// Non-normal components (`..`, `.`, prefixes) are dropped.
pub fn to_url_path(relative: &Path) -> String {
    let mut url = String::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            url.push('/');
            url.push_str(&part.to_string_lossy());
        }
    }
    if url.is_empty() {
        url.push('/');
    }
    url
}
