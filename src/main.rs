//! hotserve - development server that runs your build, serves it from
//! memory and live-reloads the browser.

mod actor;
mod asset;
mod cli;
mod compiler;
mod config;
mod core;
mod embed;
mod logger;
mod reload;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ServeConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = ServeConfig::load(&cli)?;

    match cli.command {
        Commands::Serve { .. } => cli::serve::serve(config),
    }
}
