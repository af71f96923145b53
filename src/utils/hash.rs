//! Content hashing for build output.
//!
//! Manifest assets are hashed with blake3 so the digest is stable across
//! runs and can double as an HTTP entity tag.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let digest = hash::content_hash(b"body { color: red }"); // 64 hex chars
//! let tag = hash::short(&digest); // first 16 hex chars
//! ```

/// Number of hex characters kept by [`short`].
pub const SHORT_LEN: usize = 16;

/// Hex-encoded blake3 digest of `data`.
#[inline]
pub fn content_hash<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    hex::encode(blake3::hash(data.as_ref()).as_bytes())
}

/// Shortened digest for ETags and log output.
#[inline]
pub fn short(hash: &str) -> &str {
    &hash[..hash.len().min(SHORT_LEN)]
}
