//! Test utilities for pagemagic_core
//!
//! Shared fixtures: a small version history, a counting completion callback
//! and a scripted job source.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{PageMagicError, Result};
use crate::poll::{JobSnapshot, JobSource, JobStatus};
use crate::sequencer::{Completion, CompletionCallback};
use crate::version::{ContentVersion, VersionHistory};

/// Three versions of a short page.
///
/// - 0: original, with a title and a meta description
/// - 1: body expanded, title extended, meta description dropped
/// - 2: one more word in the body, new meta description
pub fn sample_history() -> VersionHistory {
    VersionHistory::from_versions([
        ContentVersion::original("The cat sat.")
            .with_title("Cats")
            .with_meta_description("Shoes for cats"),
        ContentVersion::derived(1, "Expand", "The black cat sat on the mat.").with_title("Cats today"),
        ContentVersion::derived(2, "Polish", "The black cat sat on the warm mat.")
            .with_title("Cats today")
            .with_meta_description("Mats for cats"),
    ])
    .unwrap()
}

/// A completion callback and the number of times it ran.
pub fn counting_callback() -> (CompletionCallback, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let callback: CompletionCallback = Arc::new(move |_: &Completion| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (callback, count)
}

/// A job snapshot for "job-1".
pub fn snapshot(status: JobStatus, versions: Vec<ContentVersion>) -> JobSnapshot {
    JobSnapshot {
        job_id: "job-1".to_string(),
        status,
        versions,
        error: None,
    }
}

/// A [`JobSource`] that replays canned responses in order.
pub struct ScriptedSource {
    responses: VecDeque<Result<JobSnapshot>>,
    /// Number of fetches made
    pub fetches: usize,
}

impl ScriptedSource {
    /// Create a source answering with `responses`, then erroring.
    pub fn new(responses: impl IntoIterator<Item = Result<JobSnapshot>>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            fetches: 0,
        }
    }
}

impl JobSource for ScriptedSource {
    fn fetch(&mut self, _job_id: &str) -> Result<JobSnapshot> {
        self.fetches += 1;
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(PageMagicError::PollStopped("script exhausted".to_string())))
    }
}
