//! Build manifest: the complete output of one compile run.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::AssetKind;
use crate::utils::{hash, mime};

/// One built output file.
///
/// Cloning is cheap: content is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    path: String,
    content: Arc<[u8]>,
    content_type: String,
    hash: String,
}

impl Asset {
    /// Create an asset, inferring content type from the path extension.
    ///
    /// `path` is normalized to a URL path (`assets\app.css` → `/assets/app.css`).
    pub fn new(path: impl AsRef<str>, content: impl Into<Vec<u8>>) -> Self {
        let path = normalize_output_path(path.as_ref());
        let content: Vec<u8> = content.into();
        let content: Arc<[u8]> = content.into();
        Self {
            content_type: mime::from_url_path(&path).to_string(),
            hash: hash::content_hash(&*content),
            path,
            content,
        }
    }

    /// Override the inferred content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Hex blake3 digest of the content.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Quoted entity tag for HTTP caching headers.
    pub fn etag(&self) -> String {
        format!("\"{}\"", hash::short(&self.hash))
    }

    pub fn kind(&self) -> AssetKind {
        AssetKind::from_url_path(&self.path)
    }
}

/// Ordered set of assets keyed by output path.
///
/// A manifest is built once by a compiler and then only read; publishing
/// wraps it in an `Arc` so no further mutation is possible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    assets: BTreeMap<String, Asset>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an asset, replacing any previous asset at the same path.
    pub fn insert(&mut self, asset: Asset) {
        self.assets.insert(asset.path.clone(), asset);
    }

    pub fn get(&self, path: &str) -> Option<&Asset> {
        self.assets.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.assets.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Assets in output path order.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    /// Total content size in bytes.
    pub fn total_size(&self) -> usize {
        self.assets.values().map(|a| a.content.len()).sum()
    }
}

impl FromIterator<Asset> for Manifest {
    fn from_iter<I: IntoIterator<Item = Asset>>(iter: I) -> Self {
        let mut manifest = Self::new();
        for asset in iter {
            manifest.insert(asset);
        }
        manifest
    }
}

fn normalize_output_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let trimmed = path.trim_start_matches("./").trim_start_matches('/');
    format!("/{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_metadata() {
        let asset = Asset::new("assets\\app.css", "body{}");
        assert_eq!(asset.path(), "/assets/app.css");
        assert_eq!(asset.content_type(), mime::types::CSS);
        assert_eq!(asset.kind(), AssetKind::Stylesheet);
        assert_eq!(asset.hash(), hash::content_hash("body{}"));
        assert_eq!(asset.etag().len(), hash::SHORT_LEN + 2);
    }

    #[test]
    fn test_content_type_override() {
        let asset = Asset::new("/feed", "<rss/>").with_content_type("application/rss+xml");
        assert_eq!(asset.content_type(), "application/rss+xml");
    }

    #[test]
    fn test_manifest_is_ordered_by_path() {
        let manifest: Manifest = [
            Asset::new("/main.js", "a"),
            Asset::new("/index.html", "b"),
            Asset::new("/assets/app.css", "c"),
        ]
        .into_iter()
        .collect();

        let paths: Vec<_> = manifest.paths().collect();
        assert_eq!(paths, ["/assets/app.css", "/index.html", "/main.js"]);
        assert_eq!(manifest.total_size(), 3);
    }

    #[test]
    fn test_manifest_insert_replaces_same_path() {
        let mut manifest = Manifest::new();
        manifest.insert(Asset::new("main.js", "old"));
        manifest.insert(Asset::new("/main.js", "new"));
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("/main.js").unwrap().content(), b"new");
    }
}
