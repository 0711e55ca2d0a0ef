//! Shared CLI utilities

use std::io::Read;
use std::path::Path;

use pagemagic_core::error::{PageMagicError, Result};
use pagemagic_core::sequencer::SequencerEvent;

/// Read a file, or stdin when the path is "-".
pub fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }

    std::fs::read_to_string(path).map_err(|e| PageMagicError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Print an error, with a hint for plan limits.
pub fn print_error(err: &PageMagicError) {
    eprintln!("✗ {}", err);
    if err.is_plan_limit() {
        eprintln!();
        eprintln!("Your plan does not allow more page improvements.");
        eprintln!("Upgrade the organization's plan, then run the job again.");
    }
}

/// One-line description of a sequencer event.
pub fn describe_event(event: &SequencerEvent) -> String {
    match event {
        SequencerEvent::PhaseChanged { from, to } => format!("phase {:?} -> {:?}", from, to),
        SequencerEvent::ScrollIntoView { version } => format!("scroll to version {}", version),
        SequencerEvent::Revealed { field, text } => format!("+ {}: {:?}", field.label(), text),
        SequencerEvent::Struck { field, text } => format!("~ {}: {:?}", field.label(), text),
        SequencerEvent::Completed { index, version } => {
            format!("version {} (index {}) complete", version, index)
        }
    }
}
