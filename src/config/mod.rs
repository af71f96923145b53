//! Server configuration from `hotserve.toml` and CLI flags.
//!
//! # Example
//!
//! ```toml
//! source_root = "src"                 # watched (and served, without a command)
//! output_root = "dist"                # where `command` writes its output
//! command = ["npx", "vite", "build"]  # omit to serve source_root as-is
//! port = "auto"                       # or a number
//! debounce_ms = 200
//! spa_fallback = true
//! root_document = "/index.html"
//! interface = "127.0.0.1"
//! live_reload = true
//! watch = ["../shared"]               # extra paths to watch
//! max_errors = 10                     # diagnostics shown per failed compile
//! max_warnings = 10
//! ```
//!
//! camelCase spellings (`sourceRoot`, `debounceMs`, ...) are accepted too.
//! Relative paths resolve against the config file's directory; CLI paths
//! resolve against the working directory.

mod error;
mod port;

pub use error::ConfigError;
pub use port::PortSetting;

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::{Cli, Commands, ServeArgs};
use crate::compiler::DiagnosticLimits;
use crate::log;
use crate::utils::path::{expand_path, normalize_path};

/// Default config file name.
pub const CONFIG_FILE: &str = "hotserve.toml";

/// Upper bound for `debounce_ms`.
const MAX_DEBOUNCE_MS: u64 = 60_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root: the config file's directory, or cwd without one
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(alias = "sourceRoot")]
    pub source_root: PathBuf,

    #[serde(alias = "outputRoot")]
    pub output_root: PathBuf,

    /// Extra paths to watch besides `source_root`
    pub watch: Vec<PathBuf>,

    pub port: PortSetting,

    #[serde(alias = "debounceMs")]
    pub debounce_ms: u64,

    #[serde(alias = "spaFallback")]
    pub spa_fallback: bool,

    pub interface: IpAddr,

    /// Document served by the SPA fallback
    #[serde(alias = "rootDocument")]
    pub root_document: String,

    /// Inject the live reload client into HTML responses
    #[serde(alias = "liveReload")]
    pub live_reload: bool,

    /// Build command argv; empty serves `source_root` as-is
    pub command: Vec<String>,

    /// Errors shown in the overlay and terminal per failed compile
    #[serde(alias = "maxErrors")]
    pub max_errors: usize,

    #[serde(alias = "maxWarnings")]
    pub max_warnings: usize,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            source_root: PathBuf::from("src"),
            output_root: PathBuf::from("dist"),
            watch: Vec::new(),
            port: PortSetting::Auto,
            debounce_ms: 200,
            spa_fallback: true,
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            root_document: "/index.html".to_string(),
            live_reload: true,
            command: Vec::new(),
            max_errors: DiagnosticLimits::default().max_errors,
            max_warnings: DiagnosticLimits::default().max_warnings,
        }
    }
}

impl ServeConfig {
    /// Load configuration for the parsed command line.
    ///
    /// The config file is searched upward from cwd. A missing default file
    /// means all defaults; a missing file named with `--config` is an error.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let Commands::Serve { args } = &cli.command;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = path;
                config
            }
            None if cli.config != Path::new(CONFIG_FILE) => {
                return Err(ConfigError::MissingFile(cwd.join(&cli.config)).into());
            }
            None => Self {
                root: cwd.clone(),
                ..Self::default()
            },
        };

        config.finalize(args, &cwd);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "unknown fields in {} ignored: {}", name, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Resolve paths and apply CLI overrides.
    fn finalize(&mut self, args: &ServeArgs, cwd: &Path) {
        crate::logger::set_verbose(args.verbose);

        let root = normalize_path(&self.root);
        self.source_root = expand_path(&self.source_root, &root);
        self.output_root = expand_path(&self.output_root, &root);
        self.watch = self.watch.iter().map(|p| expand_path(p, &root)).collect();
        self.root = root;

        self.apply_serve_args(args, cwd);

        self.source_root = normalize_path(&self.source_root);
        self.output_root = normalize_path(&self.output_root);
        self.watch = self.watch.iter().map(|p| normalize_path(p)).collect();
    }

    fn apply_serve_args(&mut self, args: &ServeArgs, cwd: &Path) {
        if let Some(source) = &args.source {
            self.source_root = expand_path(source, cwd);
        }
        if let Some(output) = &args.output {
            self.output_root = expand_path(output, cwd);
        }
        self.watch
            .extend(args.watch.iter().map(|p| expand_path(p, cwd)));
        if !args.command.is_empty() {
            self.command = args.command.clone();
        }

        Self::update_option(&mut self.port, args.port.as_ref());
        Self::update_option(&mut self.interface, args.interface.as_ref());
        Self::update_option(&mut self.debounce_ms, args.debounce.as_ref());
        Self::update_option(&mut self.spa_fallback, args.spa.as_ref());
        Self::update_option(&mut self.live_reload, args.live_reload.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root_document.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "root_document `{}` must be a URL path starting with `/`",
                self.root_document
            )));
        }

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Validation(format!(
                "debounce_ms {} exceeds {MAX_DEBOUNCE_MS}",
                self.debounce_ms
            )));
        }

        if self.max_errors == 0 {
            return Err(ConfigError::Validation(
                "max_errors must be at least 1".into(),
            ));
        }

        if self.command.first().is_some_and(|program| program.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "command must start with a program name".into(),
            ));
        }

        // The watcher ignores the output root, so sources inside it would
        // never trigger a rebuild.
        if self.has_command() && self.source_root.starts_with(&self.output_root) {
            return Err(ConfigError::Validation(format!(
                "source_root `{}` is inside output_root `{}`",
                self.source_root.display(),
                self.output_root.display()
            )));
        }

        Ok(())
    }

    /// Whether an external build command produces the output.
    pub fn has_command(&self) -> bool {
        !self.command.is_empty()
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn diagnostic_limits(&self) -> DiagnosticLimits {
        DiagnosticLimits {
            max_errors: self.max_errors,
            max_warnings: self.max_warnings,
        }
    }
}

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}
