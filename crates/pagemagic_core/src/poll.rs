//! Job status polling.
//!
//! The improvement pipeline runs as a backend job. While it runs, the viewer
//! re-fetches the job and appends any new versions to its [`VersionHistory`].
//! Polling stops for good once the job reaches a terminal status or the
//! poller is cancelled; after that, [`JobPoller::poll_once`] never calls the
//! source again.
//!
//! Fetching is behind the [`JobSource`] trait so the core stays free of any
//! HTTP client; the CLI implements it with `reqwest`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::ApiConfig;
use crate::error::{PageMagicError, Result};
use crate::version::{ContentVersion, VersionHistory};

/// Lifecycle of a backend job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum JobStatus {
    /// Queued
    Pending,
    /// Rules are being applied
    Running,
    /// Every rule applied
    Completed,
    /// Stopped with an error
    Failed,
    /// Stopped by the user
    Cancelled,
}

impl JobStatus {
    /// Whether the job will never change again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One fetch of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct JobSnapshot {
    /// Job identifier
    pub job_id: String,
    /// Current status
    pub status: JobStatus,
    /// Every version produced so far, original included
    #[serde(default)]
    pub versions: Vec<ContentVersion>,
    /// Failure message for failed jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Somewhere job snapshots come from.
pub trait JobSource {
    /// Fetch the current state of `job_id`.
    fn fetch(&mut self, job_id: &str) -> Result<JobSnapshot>;
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job is still going
    InProgress {
        /// Reported status
        status: JobStatus,
        /// Versions appended by this poll
        appended: usize,
    },
    /// The job reached a terminal status on this poll
    Finished {
        /// Terminal status
        status: JobStatus,
        /// Versions appended by this poll
        appended: usize,
        /// Failure message, if any
        error: Option<String>,
    },
    /// The poller is finished or cancelled; nothing was fetched
    Stopped,
}

/// Cloneable handle that cancels a [`JobPoller`] from elsewhere.
#[derive(Debug, Clone, Default)]
pub struct PollCancel(Arc<AtomicBool>);

impl PollCancel {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Polls one job until it finishes or is cancelled.
#[derive(Debug)]
pub struct JobPoller {
    job_id: String,
    interval: Duration,
    max_polls: u32,
    polls: u32,
    finished: Option<JobStatus>,
    cancel: PollCancel,
}

impl JobPoller {
    /// A poller for `job_id` with the cadence from `config`.
    pub fn new(job_id: impl Into<String>, config: &ApiConfig) -> Self {
        Self {
            job_id: job_id.into(),
            interval: config.poll_interval(),
            max_polls: config.max_polls,
            polls: 0,
            finished: None,
            cancel: PollCancel::default(),
        }
    }

    /// Job being polled.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Number of fetches made.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Terminal status, once seen.
    pub fn finished(&self) -> Option<JobStatus> {
        self.finished
    }

    /// Whether further polls will be refused.
    pub fn is_stopped(&self) -> bool {
        self.finished.is_some() || self.cancel.is_cancelled()
    }

    /// Stop polling. Safe to call more than once.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            log::debug!("Cancelling poller for job {}", self.job_id);
        }
        self.cancel.cancel();
    }

    /// Handle for cancelling from another owner (signal handler, view teardown).
    pub fn cancel_handle(&self) -> PollCancel {
        self.cancel.clone()
    }

    /// Fetch once and append any new versions.
    ///
    /// Fetch errors are returned as-is and leave `history` untouched.
    pub fn poll_once<S: JobSource + ?Sized>(
        &mut self,
        source: &mut S,
        history: &mut VersionHistory,
    ) -> Result<PollOutcome> {
        if self.is_stopped() {
            return Ok(PollOutcome::Stopped);
        }
        if self.polls >= self.max_polls {
            self.cancel();
            return Err(PageMagicError::PollStopped(format!(
                "job {} still not finished after {} polls",
                self.job_id, self.polls
            )));
        }

        self.polls += 1;
        let snapshot = source.fetch(&self.job_id)?;

        // Cancelled while the request was in flight
        if self.cancel.is_cancelled() {
            return Ok(PollOutcome::Stopped);
        }

        let appended = append_new(history, snapshot.versions)?;
        log::debug!(
            "Job {} is {} ({} new versions, {} total)",
            self.job_id,
            snapshot.status,
            appended,
            history.len()
        );

        if snapshot.status.is_terminal() {
            self.finished = Some(snapshot.status);
            Ok(PollOutcome::Finished {
                status: snapshot.status,
                appended,
                error: snapshot.error,
            })
        } else {
            Ok(PollOutcome::InProgress {
                status: snapshot.status,
                appended,
            })
        }
    }

    /// Poll until the job finishes or the poller is cancelled.
    ///
    /// `on_update` sees the history after every poll; `sleep` waits between
    /// polls. Returns the last outcome, which is never `InProgress`.
    pub fn run<S, U, W>(
        &mut self,
        source: &mut S,
        history: &mut VersionHistory,
        mut on_update: U,
        mut sleep: W,
    ) -> Result<PollOutcome>
    where
        S: JobSource + ?Sized,
        U: FnMut(&VersionHistory, &PollOutcome),
        W: FnMut(Duration),
    {
        loop {
            let outcome = self.poll_once(source, history)?;
            on_update(history, &outcome);
            match outcome {
                PollOutcome::InProgress { .. } => sleep(self.interval),
                done => return Ok(done),
            }
        }
    }
}

/// Append versions the history does not have yet, in version order.
fn append_new(history: &mut VersionHistory, mut versions: Vec<ContentVersion>) -> Result<usize> {
    versions.sort_by_key(|v| v.version);
    let mut appended = 0;
    for version in versions {
        if (version.version as usize) < history.len() {
            continue;
        }
        history.push(version)?;
        appended += 1;
    }
    Ok(appended)
}
