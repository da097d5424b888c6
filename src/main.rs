//! distpress - post-process a build output directory.
//!
//! Writes `.gz` / `.br` siblings for static assets and losslessly
//! optimizes images in place.

mod asset;
mod cli;
mod config;
mod image;
mod logger;
mod task;
mod utils;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::ToolConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let config = ToolConfig::load(&cli)?;
    debug!("dist"; "{}", config.dist_dir().display());

    match cli.command().tasks() {
        [task] => task::run(*task, &config),
        tasks => task::run_all(&config, tasks),
    }
}
