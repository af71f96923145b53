//! Asset kind definitions.

use crate::utils::mime::extension_of;

/// Kind of built asset, as far as live reload cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `.css` (and its source map). Can be swapped in place.
    Stylesheet,
    /// JavaScript / WebAssembly modules. Need a full reload.
    Script,
    /// HTML documents.
    Document,
    /// Images, fonts, data files.
    Other,
}

impl AssetKind {
    /// Classify an output URL path by extension.
    ///
    /// Source maps take the kind of the file they map (`app.css.map` is a
    /// stylesheet).
    pub fn from_url_path(path: &str) -> Self {
        let path = path.strip_suffix(".map").unwrap_or(path);
        match extension_of(path).map(str::to_ascii_lowercase).as_deref() {
            Some("css") => Self::Stylesheet,
            Some("js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" | "wasm") => Self::Script,
            Some("html" | "htm") => Self::Document,
            _ => Self::Other,
        }
    }

    /// Whether a change to this asset can be applied without navigation.
    pub fn is_hot_swappable(self) -> bool {
        matches!(self, Self::Stylesheet)
    }
}
