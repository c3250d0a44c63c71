/// Worker pool that drains a [`WorkQueue`] and publishes matching folders.
///
/// One scan = one seeded queue, `N` worker threads, and one supervisor
/// thread. Each worker repeatedly:
///
/// 1. waits on the [`PauseGate`] and checks the cancellation token,
/// 2. claims a directory (exiting once the queue is quiescent or closed),
/// 3. lists its subdirectories and pushes them,
/// 4. aggregates its immediate files,
/// 5. publishes a match on the bounded result channel.
///
/// The supervisor joins every worker, marks the engine [`EnginePhase::Done`]
/// and sends exactly one [`ScanReport`] on the completion channel. The result
/// channel disconnects when the last worker drops its sender, which is what
/// ends the consumer-side [`ScanStream`](super::ScanStream).
use super::aggregate::FolderAggregator;
use super::gate::PauseGate;
use super::progress::{CancellationToken, EnginePhase, PhaseCell, ScanCounters, ScanReport};
use super::queue::WorkQueue;
use crate::error::{Result, ScanError};
use crate::model::FolderSummary;
use crossbeam_channel::{Receiver, SendTimeoutError, Sender};
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Maximum number of matches that may queue up between the workers and the
/// consumer before `send` applies back-pressure.
pub const RESULT_CHANNEL_CAPACITY: usize = 4_096;

/// How long a blocked publish waits before re-checking pause and cancel.
pub const SEND_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Default upper bound on how long a cancel waits for the workers to exit.
pub const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for one scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Number of traversal workers (0 = one per logical CPU).
    pub workers: usize,
    /// Threads for per-directory file aggregation (0 = rayon global pool).
    pub aggregation_threads: usize,
    /// Capacity of the bounded result channel.
    pub result_capacity: usize,
    /// Upper bound for a blocking cancel.
    pub cancel_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            aggregation_threads: 0,
            result_capacity: RESULT_CHANNEL_CAPACITY,
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
        }
    }
}

impl ScanConfig {
    /// Effective worker-pool size.
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}

/// State shared by the workers, the supervisor and every [`ScanHandle`].
#[derive(Debug)]
struct EngineShared {
    queue: WorkQueue,
    gate: PauseGate,
    cancel: CancellationToken,
    phase: PhaseCell,
    counters: ScanCounters,
}

impl EngineShared {
    fn request_cancel(&self) {
        self.cancel.cancel();
        self.phase.begin_draining();
        self.queue.close();
        // Parked workers must wake up to observe the token.
        self.gate.set_paused(false);
    }
}

/// One-shot completion signal plus a cache so it can be observed repeatedly.
#[derive(Debug)]
struct Completion {
    rx: Receiver<ScanReport>,
    report: Mutex<Option<ScanReport>>,
}

/// Control handle for a running scan: pause, resume, cancel and wait.
///
/// Cheap to clone; all clones control the same scan.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    shared: Arc<EngineShared>,
    completion: Arc<Completion>,
}

impl ScanHandle {
    pub fn pause(&self) {
        self.shared.gate.set_paused(true);
    }

    pub fn resume(&self) {
        self.shared.gate.set_paused(false);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.gate.is_paused()
    }

    /// Ask the workers to stop after their current item. Non-blocking.
    ///
    /// Also releases the pause gate and abandons all pending directories.
    pub fn request_cancel(&self) {
        self.shared.request_cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Request cancellation and wait up to `timeout` for the engine to finish.
    pub fn cancel(&self, timeout: Duration) -> Option<ScanReport> {
        self.request_cancel();
        self.wait(timeout)
    }

    pub fn phase(&self) -> EnginePhase {
        self.shared.phase.get()
    }

    pub fn is_done(&self) -> bool {
        self.phase() == EnginePhase::Done
    }

    /// Directories discovered but not yet claimed.
    pub fn pending_directories(&self) -> usize {
        self.shared.queue.len()
    }

    /// Block until the engine reports completion or `timeout` elapses.
    ///
    /// Returns `None` on timeout. Once the report has arrived every later
    /// call returns it immediately.
    pub fn wait(&self, timeout: Duration) -> Option<ScanReport> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.completion.report.try_lock_until(deadline)?;
        if let Some(report) = slot.as_ref() {
            return Some(report.clone());
        }
        let report = self.completion.rx.recv_deadline(deadline).ok()?;
        *slot = Some(report.clone());
        Some(report)
    }
}

/// Seed a queue with `root`, launch the worker pool and its supervisor.
///
/// Returns the result receiver and a control handle. If a thread cannot be
/// spawned the partially launched scan is cancelled before returning.
pub(crate) fn launch(
    root: PathBuf,
    aggregator: Arc<FolderAggregator>,
    config: &ScanConfig,
) -> Result<(Receiver<FolderSummary>, ScanHandle)> {
    let (result_tx, result_rx) = crossbeam_channel::bounded(config.result_capacity.max(1));
    let (done_tx, done_rx) = crossbeam_channel::bounded::<ScanReport>(1);

    let shared = Arc::new(EngineShared {
        queue: WorkQueue::seeded(root),
        gate: PauseGate::new(),
        cancel: CancellationToken::new(),
        phase: PhaseCell::new(EnginePhase::Seeded),
        counters: ScanCounters::default(),
    });

    let worker_count = config.worker_count();
    let started = Instant::now();
    shared.phase.set(EnginePhase::Running);

    let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(worker_count);
    for id in 0..worker_count {
        let worker_shared = shared.clone();
        let aggregator = aggregator.clone();
        let results = result_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("foldersleuth-worker-{id}"))
            .spawn(move || worker_loop(id, &worker_shared, &aggregator, &results));
        match spawned {
            Ok(handle) => workers.push(handle),
            Err(err) => {
                error!("Failed to spawn scan worker {id}: {err}");
                shared.request_cancel();
                return Err(ScanError::Spawn(err));
            }
        }
    }
    // Only the workers hold senders now: the stream ends when they all exit.
    drop(result_tx);
    debug!("Launched {worker_count} scan workers");

    let supervisor_shared = shared.clone();
    let supervisor = thread::Builder::new()
        .name("foldersleuth-supervisor".into())
        .spawn(move || supervise(workers, &supervisor_shared, started, &done_tx));
    if let Err(err) = supervisor {
        error!("Failed to spawn scan supervisor: {err}");
        shared.request_cancel();
        return Err(ScanError::Spawn(err));
    }

    let handle = ScanHandle {
        shared,
        completion: Arc::new(Completion {
            rx: done_rx,
            report: Mutex::new(None),
        }),
    };
    Ok((result_rx, handle))
}

/// Join all workers, then publish the completion report.
fn supervise(
    workers: Vec<JoinHandle<()>>,
    shared: &EngineShared,
    started: Instant,
    done_tx: &Sender<ScanReport>,
) {
    let mut failures: u64 = 0;
    for handle in workers {
        let name = handle.thread().name().unwrap_or("worker").to_owned();
        if handle.join().is_err() {
            failures += 1;
            error!("Scan worker {name} terminated abnormally; partial results are kept");
        }
    }
    shared.phase.set(EnginePhase::Done);

    let report = ScanReport::from_counters(
        &shared.counters,
        started.elapsed(),
        failures,
        shared.cancel.is_cancelled(),
    );
    info!(
        "Scan {} in {:?}: {} directories scanned, {} skipped, {} matched",
        if report.cancelled { "cancelled" } else { "complete" },
        report.duration,
        report.directories_scanned,
        report.directories_skipped,
        report.folders_matched
    );
    let _ = done_tx.send(report);
}

fn worker_loop(
    id: usize,
    shared: &EngineShared,
    aggregator: &FolderAggregator,
    results: &Sender<FolderSummary>,
) {
    debug!("Worker {id} started");
    loop {
        shared.gate.await_unpaused();
        if shared.cancel.is_cancelled() {
            debug!("Worker {id} observed cancellation");
            break;
        }

        let Some(claim) = shared.queue.claim() else {
            break;
        };
        let Some(summary) = process_directory(shared, aggregator, claim.path()) else {
            continue;
        };
        drop(claim);

        if let Err(err) = publish(shared, results, summary) {
            debug!("Worker {id} stopping: {err}");
            break;
        }
    }
    debug!("Worker {id} exiting");
}

/// List and enqueue the subdirectories of `dir`, then aggregate its files.
///
/// A directory that cannot be listed is skipped along with its subtree.
fn process_directory(
    shared: &EngineShared,
    aggregator: &FolderAggregator,
    dir: &Path,
) -> Option<FolderSummary> {
    let subdirs = match list_subdirectories(dir) {
        Ok(subdirs) => subdirs,
        Err(err) => {
            ScanCounters::bump(&shared.counters.directories_skipped);
            match err.kind() {
                ErrorKind::PermissionDenied | ErrorKind::NotFound => {
                    debug!("Skipping {}: {err}", dir.display());
                }
                _ => warn!("Skipping {}: {err}", dir.display()),
            }
            return None;
        }
    };
    ScanCounters::bump(&shared.counters.directories_scanned);
    shared.queue.push_all(subdirs);

    aggregator.aggregate(dir)
}

/// Immediate subdirectories of `dir`. Symlinks are not followed.
fn list_subdirectories(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut subdirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let Ok(entry) = entry else {
            continue;
        };
        if entry.file_type().is_ok_and(|ft| ft.is_dir()) {
            subdirs.push(entry.path());
        }
    }
    Ok(subdirs)
}

/// Hand `summary` to the consumer, honouring pause and cancel while blocked
/// on a full channel.
fn publish(
    shared: &EngineShared,
    results: &Sender<FolderSummary>,
    mut summary: FolderSummary,
) -> Result<()> {
    loop {
        shared.gate.await_unpaused();
        if shared.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        match results.send_timeout(summary, SEND_POLL_INTERVAL) {
            Ok(()) => {
                ScanCounters::bump(&shared.counters.folders_matched);
                return Ok(());
            }
            Err(SendTimeoutError::Timeout(back)) => summary = back,
            Err(SendTimeoutError::Disconnected(_)) => return Err(ScanError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSet;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_worker_count_defaults_to_cpus() {
        assert!(ScanConfig::default().worker_count() >= 1);
        let config = ScanConfig {
            workers: 3,
            ..ScanConfig::default()
        };
        assert_eq!(config.worker_count(), 3);
    }

    #[test]
    fn test_list_subdirectories_ignores_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("a")).unwrap();
        fs::create_dir(tmp.path().join("b")).unwrap();
        fs::write(tmp.path().join("c.txt"), b"x").unwrap();

        let mut subdirs = list_subdirectories(tmp.path()).unwrap();
        subdirs.sort();
        assert_eq!(subdirs, vec![tmp.path().join("a"), tmp.path().join("b")]);
    }

    #[test]
    fn test_list_subdirectories_missing_dir_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = list_subdirectories(&tmp.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_completion_report_is_cached() {
        let tmp = TempDir::new().unwrap();
        let aggregator = Arc::new(FolderAggregator::new(FilterSet::min_size(0)));
        let (rx, handle) = launch(tmp.path().to_path_buf(), aggregator, &ScanConfig::default())
            .expect("launch");
        let _: Vec<_> = rx.iter().collect();

        let first = handle.wait(Duration::from_secs(30)).expect("report");
        let second = handle.wait(Duration::from_millis(1)).expect("cached report");
        assert_eq!(first, second);
        assert!(!first.cancelled);
        assert_eq!(first.directories_scanned, 1);
        assert!(handle.is_done());
    }

    /// With a one-slot channel and nobody consuming, the worker ends up
    /// blocked in `publish`; cancel must still get it out, even while paused.
    #[test]
    fn test_cancel_unblocks_worker_stuck_on_full_channel() {
        let tmp = TempDir::new().unwrap();
        for i in 0..20 {
            let dir = tmp.path().join(format!("d{i}"));
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("f.bin"), b"x").unwrap();
        }
        let aggregator = Arc::new(FolderAggregator::new(FilterSet::min_size(0)));
        let config = ScanConfig {
            workers: 1,
            result_capacity: 1,
            ..ScanConfig::default()
        };
        let (_rx, handle) = launch(tmp.path().to_path_buf(), aggregator, &config).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        assert!(handle.wait(Duration::from_millis(1)).is_none(), "worker should be blocked");

        handle.pause();
        let report = handle.cancel(Duration::from_secs(30)).expect("cancel completes");
        assert!(report.cancelled);
        assert_eq!(handle.phase(), EnginePhase::Done);
        assert!(!handle.is_paused(), "cancel releases the gate");
    }
}
