//! `pagemagic replay` command

use std::path::Path;
use std::time::Duration;

use pagemagic_core::config::Config;
use pagemagic_core::error::Result;
use pagemagic_core::markdown::MarkdownRenderer;
use pagemagic_core::sequencer::{Sequencer, SequencerEvent};
use pagemagic_core::version::{ContentVersion, VersionHistory};

use crate::cli::util::{describe_event, print_error, read_input};

/// Load a JSON array of versions into a validated history.
pub fn load_history(path: &Path) -> Result<VersionHistory> {
    let json = read_input(path)?;
    let versions: Vec<ContentVersion> = serde_json::from_str(&json)?;
    VersionHistory::from_versions(versions)
}

/// Handle the replay command
/// Returns true on success, false on error
pub fn handle_replay(
    config: &Config,
    path: &Path,
    index: Option<usize>,
    frames: bool,
    json: bool,
) -> bool {
    let history = match load_history(path) {
        Ok(history) => history,
        Err(e) => {
            print_error(&e);
            return false;
        }
    };
    let index = index.unwrap_or_else(|| history.len().saturating_sub(1));

    let mut sequencer = Sequencer::new(config.animation.clone());
    if let Err(e) = sequencer.show(&history, index) {
        print_error(&e);
        return false;
    }

    if let Some(diff) = sequencer.diff()
        && !json
    {
        println!(
            "Replaying version {} ({}) against version {}",
            diff.version,
            diff.rule_processed.as_deref().unwrap_or("original"),
            diff.baseline_version
        );
    }

    if frames {
        print_events(&sequencer.take_events(), Some(sequencer.now()), json);
        while let Some(due) = sequencer.next_due() {
            let events = sequencer.advance(due.saturating_sub(sequencer.now()));
            if events.is_empty() {
                continue;
            }
            print_events(&events, Some(sequencer.now()), json);
            if !json
                && let Some(frame) = sequencer.frame()
                && let Some(body) = frame.body()
            {
                println!("    | {}", body.text().replace('\n', "\n    | "));
            }
        }
    } else {
        let events = sequencer.run_to_completion();
        print_events(&events, None, json);
    }

    if !json && let Some(frame) = sequencer.frame() {
        let renderer = MarkdownRenderer::new(config.render.clone());
        println!();
        print!("{}", frame.to_html(&renderer));
    }
    true
}

fn print_events(events: &[SequencerEvent], at: Option<Duration>, json: bool) {
    for event in events {
        if json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{}", line),
                Err(e) => log::warn!("Could not serialize event: {}", e),
            }
            continue;
        }
        match at {
            Some(at) => println!("[{:>6}ms] {}", at.as_millis(), describe_event(event)),
            None => println!("{}", describe_event(event)),
        }
    }
}
