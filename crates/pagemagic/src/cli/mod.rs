/// Clap argument definitions
mod args;

/// HTTP client for the backend
mod api_client;

/// Config command handlers
mod config;

/// `diff` command
mod diff;

/// `render` and `annotate` commands
mod render;

/// `replay` command
mod replay;

/// Shared CLI utilities
mod util;

/// `watch` command
mod watch;

use clap::Parser;
use std::path::Path;

use pagemagic_core::config::Config;

use args::{Cli, Commands};

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Some(config) => config,
        None => std::process::exit(1),
    };

    let success = match cli.command {
        Commands::Diff { old, new, json } => diff::handle_diff(&old, &new, json),

        Commands::Render { file, inline } => render::handle_render(&config, &file, inline),

        Commands::Annotate { file } => render::handle_annotate(&config, &file),

        Commands::Replay {
            versions,
            index,
            frames,
            json,
        } => replay::handle_replay(&config, &versions, index, frames, json),

        Commands::Watch { job_id, html } => watch::handle_watch(&config, &job_id, html),

        Commands::Config { command } => {
            config::handle_config_command(command, &config, cli.config.as_deref())
        }
    };

    if !success {
        std::process::exit(1);
    }
}

/// Warnings by default; `-v` for debug, `-vv` for trace. `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Load the config file (explicit path or default location) and apply environment overrides.
fn load_config(path: Option<&Path>) -> Option<Config> {
    let config = match path {
        Some(path) if path.exists() => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ {}", e);
                return None;
            }
        },
        Some(path) => {
            log::debug!("{} does not exist, using defaults", path.display());
            Config::default()
        }
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("⚠ Could not load config, using defaults: {}", e);
            Config::default()
        }),
    };
    Some(config.with_env_overrides())
}
