//! Built output held in memory.
//!
//! ```text
//! Compiler --Manifest--> AssetStore::publish --Snapshot--> HTTP handlers
//! ```
//!
//! - `manifest` - immutable set of assets produced by one compile
//! - `kind` - asset classification (stylesheet / script / document)
//! - `store` - atomically swapped current manifest + generation
//! - `scan` - build a manifest from a directory on disk

mod kind;
mod manifest;
mod scan;
mod store;

pub use kind::AssetKind;
pub use manifest::{Asset, Manifest};
pub use scan::scan_dir;
pub use store::{AssetStore, Snapshot};
