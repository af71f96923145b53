//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects beyond
//! `canonicalize` lookups.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `expand_path`)
//! - [`url`]: Output path → URL path conversion (`to_url_path`)

pub mod fs;
pub mod url;

pub use fs::{expand_path, is_editor_artifact, normalize_path};
pub use url::to_url_path;
