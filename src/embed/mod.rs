//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server resources (hotreload.js, loading.html)
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{HOTRELOAD_JS, HotreloadVars};
//!
//! let js = HOTRELOAD_JS.render(&HotreloadVars { ws_path: "/__hotserve/ws" });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Variables for hotreload.js.
    pub struct HotreloadVars<'a> {
        pub ws_path: &'a str,
    }

    impl TemplateVars for HotreloadVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replace("__HOTSERVE_WS_PATH__", self.ws_path)
        }
    }

    /// Variables for loading.html.
    pub struct LoadingVars<'a> {
        pub version: &'a str,
        pub title: &'a str,
        /// Pre-rendered, escaped HTML
        pub status: &'a str,
    }

    impl TemplateVars for LoadingVars<'_> {
        fn apply(&self, content: &str) -> String {
            // Status last: it carries compiler output
            content
                .replace("__VERSION__", self.version)
                .replace("__TITLE__", self.title)
                .replace("__STATUS__", self.status)
        }
    }

    /// Live reload client, templated with the WebSocket path.
    pub const HOTRELOAD_JS: Template<HotreloadVars<'static>> =
        Template::new(include_str!("serve/hotreload.js"));

    /// Page shown until the first build is published.
    pub const LOADING_HTML: Template<LoadingVars<'static>> =
        Template::new(include_str!("serve/loading.html"));
}
