//! Request path resolution against a store snapshot.
//!
//! Pure: no I/O, so every rule is testable without a socket.
//!
//! ```text
//! /app.css        -> asset
//! /docs/          -> /docs/index.html
//! /docs           -> /docs (or /docs/index.html)
//! /app/dashboard  -> root document (SPA fallback, extension-less only)
//! /missing.png    -> 404 (404.html if published)
//! ```

use super::path::normalize_url;
use crate::asset::{Asset, Snapshot};
use crate::utils::mime::extension_of;

/// Custom not-found page, when the build has one.
const NOT_FOUND_PAGE: &str = "/404.html";

const INDEX: &str = "index.html";

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub spa_fallback: bool,
    pub root_document: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            spa_fallback: true,
            root_document: "/index.html".to_string(),
        }
    }
}

/// How to answer a request.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// The requested asset (or its directory index)
    Asset(&'a Asset),
    /// Root document for a client-side route
    Fallback(&'a Asset),
    /// Nothing matched; carries the build's 404 page if any
    NotFound(Option<&'a Asset>),
    /// No build published yet
    Loading,
}

pub fn resolve<'a>(snapshot: &'a Snapshot, url: &str, options: &ResolveOptions) -> Resolved<'a> {
    if !snapshot.is_ready() {
        return Resolved::Loading;
    }

    let not_found = || Resolved::NotFound(snapshot.lookup(NOT_FOUND_PAGE));

    let Some(path) = normalize_url(url) else {
        return not_found();
    };

    if let Some(asset) = lookup_with_index(snapshot, &path) {
        return Resolved::Asset(asset);
    }

    if options.spa_fallback
        && extension_of(&path).is_none()
        && let Some(root) = snapshot.lookup(&options.root_document)
    {
        return Resolved::Fallback(root);
    }

    not_found()
}

/// Exact match, then `index.html` inside the directory.
fn lookup_with_index<'a>(snapshot: &'a Snapshot, path: &str) -> Option<&'a Asset> {
    if let Some(dir) = path.strip_suffix('/') {
        return snapshot.lookup(&format!("{dir}/{INDEX}"));
    }

    snapshot
        .lookup(path)
        .or_else(|| snapshot.lookup(&format!("{path}/{INDEX}")))
}
