#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Backend contracts (error envelope, plan limit)
pub mod api;

/// Configuration options
pub mod config;

/// Word-level diffing
pub mod diff;

/// Error (common error types)
pub mod error;

/// Displayed state of a version
pub mod frame;

/// Markdown rendering, sanitizing and annotation
pub mod markdown;

/// Job status polling
pub mod poll;

/// Virtual-clock tick scheduling
pub mod scheduler;

/// Animated replay state machine
pub mod sequencer;

/// Content versions and per-field diffs
pub mod version;

#[cfg(test)]
pub mod test_utils;
