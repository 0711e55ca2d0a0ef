//! `pagemagic diff` command

use std::path::Path;

use pagemagic_core::diff::{DiffSegment, DiffStats, SegmentKind, diff_words};

use crate::cli::util::{print_error, read_input};

const GREEN: &str = "\x1b[32m";
const RED_STRUCK: &str = "\x1b[31;9m";
const RESET: &str = "\x1b[0m";

/// Handle the diff command
/// Returns true on success, false on error
pub fn handle_diff(old: &Path, new: &Path, json: bool) -> bool {
    let previous = match read_input(old) {
        Ok(text) => text,
        Err(e) => {
            print_error(&e);
            return false;
        }
    };
    let current = match read_input(new) {
        Ok(text) => text,
        Err(e) => {
            print_error(&e);
            return false;
        }
    };

    let segments = diff_words(&previous, &current);
    let stats = DiffStats::from_segments(&segments);

    if json {
        let output = serde_json::json!({ "segments": segments, "stats": stats });
        match serde_json::to_string_pretty(&output) {
            Ok(s) => println!("{}", s),
            Err(e) => {
                eprintln!("✗ Failed to serialize diff: {}", e);
                return false;
            }
        }
        return true;
    }

    println!("{}", colorize(&segments));
    println!();
    println!(
        "{} words added, {} removed, {} unchanged",
        stats.added_words, stats.removed_words, stats.unchanged_words
    );
    true
}

/// Terminal rendering: additions green, removals red and struck through.
fn colorize(segments: &[DiffSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment.kind {
            SegmentKind::Unchanged => out.push_str(&segment.value),
            SegmentKind::Added => {
                out.push_str(GREEN);
                out.push_str(&segment.value);
                out.push_str(RESET);
            }
            SegmentKind::Removed => {
                out.push_str(RED_STRUCK);
                out.push_str(&segment.value);
                out.push_str(RESET);
            }
        }
    }
    out
}
