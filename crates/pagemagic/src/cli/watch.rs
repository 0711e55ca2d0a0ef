//! `pagemagic watch` command

use std::time::Duration;

use pagemagic_core::api::API_URL_ENV;
use pagemagic_core::config::Config;
use pagemagic_core::diff::DiffStats;
use pagemagic_core::markdown::MarkdownRenderer;
use pagemagic_core::poll::{JobPoller, JobStatus, PollOutcome};
use pagemagic_core::sequencer::Sequencer;
use pagemagic_core::version::VersionHistory;

use crate::cli::api_client::ApiClient;
use crate::cli::util::print_error;

/// Handle the watch command
/// Returns true on success, false on error
pub fn handle_watch(config: &Config, job_id: &str, html: bool) -> bool {
    let Some(base_url) = config.api.base_url.as_deref() else {
        eprintln!("✗ No API base URL configured");
        eprintln!();
        eprintln!("Set {} or add base_url under [api] in the config file.", API_URL_ENV);
        return false;
    };

    let mut client = match ApiClient::new(
        base_url,
        config.api.token.clone(),
        Duration::from_secs(config.api.timeout_secs),
    ) {
        Ok(client) => client,
        Err(e) => {
            print_error(&e);
            return false;
        }
    };

    let renderer = MarkdownRenderer::new(config.render.clone());
    let mut sequencer = Sequencer::new(config.animation.clone());
    let mut history = VersionHistory::new();
    let mut poller = JobPoller::new(job_id, &config.api);

    println!("Watching job {}", job_id);
    println!("  Server: {}", base_url);
    println!();

    let mut next_index = 1;
    let result = poller.run(
        &mut client,
        &mut history,
        |history, outcome| {
            if let PollOutcome::InProgress { status, appended } = outcome
                && *appended > 0
            {
                println!("  {} new versions, job {}", appended, status);
            }

            replay_new_versions(&mut sequencer, history, &mut next_index, |sequencer| {
                if let Some(diff) = sequencer.diff() {
                    let stats = DiffStats::from_segments(&diff.body.segments);
                    println!(
                        "✓ Version {} ({}): {} words added, {} removed",
                        diff.version,
                        diff.rule_processed.as_deref().unwrap_or("original"),
                        stats.added_words,
                        stats.removed_words
                    );
                }
                if html && let Some(frame) = sequencer.frame() {
                    print!("{}", frame.to_html(&renderer));
                }
            });
        },
        std::thread::sleep,
    );

    match result {
        Ok(PollOutcome::Finished {
            status: JobStatus::Completed,
            ..
        }) => {
            println!();
            println!("✓ Job completed with {} versions", history.len());
            true
        }
        Ok(PollOutcome::Finished { status, error, .. }) => {
            eprintln!();
            match error {
                Some(message) => eprintln!("✗ Job {}: {}", status, message),
                None => eprintln!("✗ Job {}", status),
            }
            false
        }
        Ok(_) => true,
        Err(e) => {
            print_error(&e);
            false
        }
    }
}

/// Replay every version from `next_index` on, oldest first, calling
/// `on_replayed` after each one completes.
///
/// Returns the indices replayed. `next_index` moves past each one even if
/// its replay fails, so a bad version is not retried.
fn replay_new_versions(
    sequencer: &mut Sequencer,
    history: &VersionHistory,
    next_index: &mut usize,
    mut on_replayed: impl FnMut(&Sequencer),
) -> Vec<usize> {
    let mut replayed = Vec::new();
    while *next_index < history.len() {
        let index = *next_index;
        *next_index += 1;
        if let Err(e) = sequencer.show(history, index) {
            log::warn!("Could not replay version index {}: {}", index, e);
            continue;
        }
        sequencer.run_to_completion();
        log::debug!("Replayed version index {}", index);
        on_replayed(sequencer);
        replayed.push(index);
    }
    replayed
}
