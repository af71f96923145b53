//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::PortSetting;

/// Development server: runs your build, serves it from memory, live-reloads
/// the browser
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: hotserve.toml, searched upward from cwd)
    #[arg(short = 'C', long, default_value = crate::config::CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build, serve and watch
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },
}

/// Serve command arguments. Every option overrides the config file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Source directory to watch (relative to cwd)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub source: Option<PathBuf>,

    /// Directory the build command writes to (relative to cwd)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Extra path to watch (repeatable)
    #[arg(short, long = "watch", value_name = "PATH", value_hint = clap::ValueHint::AnyPath)]
    pub watch: Vec<PathBuf>,

    /// Port number, or `auto` for the first free port from 5277
    #[arg(short, long)]
    pub port: Option<PortSetting>,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Debounce window for file changes, in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub debounce: Option<u64>,

    /// Serve the root document for unknown extension-less paths
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub spa: Option<bool>,

    /// Inject the live reload client into HTML responses
    #[arg(long = "live-reload", action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub live_reload: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,

    /// Build command, e.g. `-- npx vite build`
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
