//! `pagemagic render` and `pagemagic annotate` commands

use std::path::Path;

use pagemagic_core::config::Config;
use pagemagic_core::markdown::{MarkdownRenderer, RenderMode};

use crate::cli::util::{print_error, read_input};

/// Handle the render command
/// Returns true on success, false on error
pub fn handle_render(config: &Config, file: &Path, inline: bool) -> bool {
    let markdown = match read_input(file) {
        Ok(text) => text,
        Err(e) => {
            print_error(&e);
            return false;
        }
    };

    let mode = if inline {
        RenderMode::Inline
    } else {
        RenderMode::Block
    };
    let renderer = MarkdownRenderer::new(config.render.clone());
    print!("{}", renderer.render(&markdown, mode));
    if inline {
        println!();
    }
    true
}

/// Handle the annotate command
/// Returns true on success, false on error
pub fn handle_annotate(config: &Config, file: &Path) -> bool {
    let markdown = match read_input(file) {
        Ok(text) => text,
        Err(e) => {
            print_error(&e);
            return false;
        }
    };

    let renderer = MarkdownRenderer::new(config.render.clone());
    let annotations = renderer.annotate(&markdown);
    match serde_json::to_string_pretty(&annotations) {
        Ok(s) => {
            println!("{}", s);
            true
        }
        Err(e) => {
            eprintln!("✗ Failed to serialize annotations: {}", e);
            false
        }
    }
}
