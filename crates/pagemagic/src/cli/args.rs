//! Command-line argument structures and enums

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagemagic")]
#[command(version)]
#[command(about = "Word diffs, sanitized rendering and animated replays of page content versions", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/pagemagic/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Word-diff two text or markdown files
    Diff {
        /// Previous version ("-" for stdin)
        old: PathBuf,

        /// Current version
        new: PathBuf,

        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render markdown to sanitized HTML
    Render {
        /// Markdown file ("-" for stdin)
        file: PathBuf,

        /// Inline mode: phrase-level tags only, no wrapping paragraph
        #[arg(short, long)]
        inline: bool,
    },

    /// List headings and list items with their positions
    Annotate {
        /// Markdown file ("-" for stdin)
        file: PathBuf,
    },

    /// Replay the animation of a version from a JSON version list
    Replay {
        /// JSON array of content versions, original first
        versions: PathBuf,

        /// History index to replay (default: latest)
        #[arg(short, long)]
        index: Option<usize>,

        /// Print the displayed text after every tick
        #[arg(long)]
        frames: bool,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Poll a backend job and replay each new version as it arrives
    Watch {
        /// Job identifier
        job_id: String,

        /// Print the final HTML of every version
        #[arg(long)]
        html: bool,
    },

    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file location
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
