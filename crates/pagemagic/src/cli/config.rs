//! Config command handlers

use std::path::{Path, PathBuf};

use pagemagic_core::config::Config;

use crate::cli::args::ConfigCommands;

pub fn handle_config_command(
    command: Option<ConfigCommands>,
    config: &Config,
    config_override: Option<&Path>,
) -> bool {
    let path = config_override
        .map(Path::to_path_buf)
        .or_else(Config::config_path);

    match command {
        None | Some(ConfigCommands::Show) => show_config(config, path.as_deref()),
        Some(ConfigCommands::Path) => match path {
            Some(path) => {
                println!("{}", path.display());
                true
            }
            None => {
                eprintln!("✗ Could not determine config directory");
                false
            }
        },
        Some(ConfigCommands::Init { force }) => init_config(path, force),
    }
}

/// Show the effective configuration (file values plus environment overrides)
fn show_config(config: &Config, path: Option<&Path>) -> bool {
    println!("Page Magic Configuration");
    println!("========================");
    match path {
        Some(path) if path.exists() => println!("Config file: {}", path.display()),
        Some(path) => println!("Config file: {} (not created, using defaults)", path.display()),
        None => println!("Config file: (no config directory)"),
    }
    println!();

    let mut shown = config.clone();
    if shown.api.token.is_some() {
        shown.api.token = Some("********".to_string());
    }
    match toml::to_string_pretty(&shown) {
        Ok(s) => {
            print!("{}", s);
            true
        }
        Err(e) => {
            eprintln!("✗ Failed to serialize config: {}", e);
            false
        }
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> bool {
    let Some(path) = path else {
        eprintln!("✗ Could not determine config directory");
        return false;
    };

    if path.exists() && !force {
        eprintln!("✗ Config file already exists: {}", path.display());
        eprintln!("  Use --force to overwrite it.");
        return false;
    }

    match Config::default().save_to(&path) {
        Ok(()) => {
            println!("✓ Wrote default config to {}", path.display());
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}
