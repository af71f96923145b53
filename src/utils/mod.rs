//! Shared helpers with no dependency on server state.

pub mod hash;
pub mod html;
pub mod mime;
pub mod path;
