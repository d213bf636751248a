// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Scheduled re-import of a result file during an active count.
//!
//! Every tick re-reads the file and runs a full import on the blocking
//! pool, so file and `SQLite` I/O never stall the runtime. Rejections and
//! unreadable files are logged and retried on the next tick; storage
//! failures end the loop.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tally::{Format, ImportOutcome};
use tally_api::{ApiError, ImportOptions, ImportSource, import_vote};
use tally_domain::EntityRegistry;
use tally_persistence::Persistence;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// The file a poller watches and the ballot it feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    pub vote_id: i64,
    pub format: Format,
    pub file: PathBuf,
    /// MIME type of the file; guessed from the extension when absent.
    pub mime: Option<String>,
    pub options: ImportOptions,
}

/// Counters of a finished polling run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub ticks: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub unreadable: usize,
}

/// Reads the target file once and imports it.
///
/// # Errors
///
/// Returns `ApiError::Io` if the file cannot be read, or any error
/// `import_vote` reports.
pub fn poll_once(
    persistence: &mut Persistence,
    registry: &EntityRegistry,
    target: &PollTarget,
) -> Result<ImportOutcome, ApiError> {
    let source: ImportSource = ImportSource::from_path(&target.file, target.mime.as_deref())?;
    import_vote(
        persistence,
        registry,
        target.vote_id,
        target.format,
        &source,
        &target.options,
    )
}

/// Runs [`poll_once`] on the blocking pool.
///
/// # Errors
///
/// Returns the error of [`poll_once`], or `ApiError::Storage` if the task
/// panicked or was cancelled.
pub async fn poll_blocking(
    persistence: &Arc<Mutex<Persistence>>,
    registry: &Arc<EntityRegistry>,
    target: &PollTarget,
) -> Result<ImportOutcome, ApiError> {
    let persistence: Arc<Mutex<Persistence>> = Arc::clone(persistence);
    let registry: Arc<EntityRegistry> = Arc::clone(registry);
    let target: PollTarget = target.clone();
    tokio::task::spawn_blocking(move || {
        let mut persistence = persistence.blocking_lock();
        poll_once(&mut persistence, &registry, &target)
    })
    .await
    .map_err(|e| ApiError::Storage {
        message: format!("Import task failed: {e}"),
    })?
}

/// Polls the target every `period` until `shutdown` completes.
///
/// The first import runs immediately.
///
/// # Arguments
///
/// * `persistence` - The storage handle
/// * `registry` - The entity registry of the principal
/// * `target` - The file and ballot to poll
/// * `period` - Time between two imports
/// * `shutdown` - Resolves when polling should stop
///
/// # Errors
///
/// Returns the first error that is not an I/O failure on the source file.
pub async fn run<F>(
    persistence: Arc<Mutex<Persistence>>,
    registry: Arc<EntityRegistry>,
    target: &PollTarget,
    period: Duration,
    shutdown: F,
) -> Result<PollSummary, ApiError>
where
    F: Future<Output = ()>,
{
    let mut ticker: tokio::time::Interval = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(
        vote_id = target.vote_id,
        format = %target.format,
        file = %target.file.display(),
        period_secs = period.as_secs(),
        "Starting poller"
    );

    let mut summary: PollSummary = PollSummary::default();
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        summary.ticks += 1;

        match poll_blocking(&persistence, &registry, target).await {
            Ok(ImportOutcome::Accepted(accepted)) => {
                summary.accepted += 1;
                debug!(tick = summary.ticks, skipped = accepted.skipped, "Poll imported");
            }
            Ok(ImportOutcome::Rejected(errors)) => {
                summary.rejected += 1;
                for err in &errors {
                    warn!(tick = summary.ticks, error = %err, "Poll rejected");
                }
            }
            Err(err @ ApiError::Io { .. }) => {
                summary.unreadable += 1;
                warn!(tick = summary.ticks, error = %err, "Source unreadable, retrying on next tick");
            }
            Err(err) => return Err(err),
        }
    }

    info!(
        ticks = summary.ticks,
        accepted = summary.accepted,
        rejected = summary.rejected,
        unreadable = summary.unreadable,
        "Poller stopped"
    );
    Ok(summary)
}
