/// Scan controller: the single entry point a frontend uses to run scans.
///
/// Owns one scan at a time, its result collection, and the [`ScanState`]
/// machine. All transitions go through one mutex, so concurrent calls from a
/// UI thread and the background consumer are serialized.
///
/// A consumer thread per scan drains the [`ScanStream`] into the result
/// collection and broadcasts [`ScanEvent`]s. When the stream ends on its own
/// the controller moves to [`ScanState::Stopped`]; a [`cancel`] instead
/// discards everything and returns to [`ScanState::Idle`].
///
/// [`cancel`]: ScanController::cancel
pub mod events;

pub use events::ScanEvent;

use crate::error::{Result, ScanError};
use crate::model::{FolderSummary, ScanState};
use crate::scanner::{
    self, CancellationToken, FolderAggregator, ScanConfig, ScanHandle, ScanReport, ScanStream,
};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The scan currently owned by the controller.
struct ActiveScan {
    handle: ScanHandle,
    /// Raised by `cancel` before the results are cleared. The consumer checks
    /// it under the results lock, so nothing is recorded after a cancel.
    discard: CancellationToken,
    consumer: JoinHandle<()>,
}

struct Control {
    state: ScanState,
    active: Option<ActiveScan>,
}

struct ControllerShared {
    control: Mutex<Control>,
    /// Signalled on every state transition.
    settled: Condvar,
    results: Mutex<Vec<FolderSummary>>,
    last_report: Mutex<Option<ScanReport>>,
    subscribers: Mutex<Vec<Sender<ScanEvent>>>,
}

impl ControllerShared {
    fn transition(&self, control: &mut Control, next: ScanState) {
        if control.state == next {
            return;
        }
        debug!("Scan state {} -> {}", control.state.label(), next.label());
        control.state = next;
        self.settled.notify_all();
        self.broadcast(ScanEvent::StateChanged(next));
    }

    fn broadcast(&self, event: ScanEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Start/pause/resume/cancel front for the scanning engine.
pub struct ScanController {
    aggregator: Arc<FolderAggregator>,
    config: ScanConfig,
    shared: Arc<ControllerShared>,
}

impl ScanController {
    /// Build a controller around an aggregator (which carries the filters)
    /// and the engine configuration.
    pub fn new(aggregator: Arc<FolderAggregator>, config: ScanConfig) -> Self {
        Self {
            aggregator,
            config,
            shared: Arc::new(ControllerShared {
                control: Mutex::new(Control {
                    state: ScanState::Idle,
                    active: None,
                }),
                settled: Condvar::new(),
                results: Mutex::new(Vec::new()),
                last_report: Mutex::new(None),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Roots the caller may pass to [`start`](Self::start).
    pub fn list_roots(&self) -> Vec<PathBuf> {
        crate::platform::list_roots()
    }

    pub fn state(&self) -> ScanState {
        self.shared.control.lock().state
    }

    /// Receive state changes, matches and completion reports from now on.
    pub fn subscribe(&self) -> Receiver<ScanEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.shared.subscribers.lock().push(tx);
        rx
    }

    /// Snapshot of the matches recorded so far, in arrival order.
    pub fn results(&self) -> Vec<FolderSummary> {
        self.shared.results.lock().clone()
    }

    pub fn result_count(&self) -> usize {
        self.shared.results.lock().len()
    }

    /// Statistics of the most recent scan that ran to its end.
    pub fn last_report(&self) -> Option<ScanReport> {
        self.shared.last_report.lock().clone()
    }

    /// Begin scanning `root`.
    ///
    /// Fails with [`ScanError::InvalidArgument`] for a blank root and with
    /// [`ScanError::AlreadyRunning`] while a scan is running, paused or
    /// cancelling. Results of a previous, stopped scan are cleared.
    pub fn start(&self, root: impl AsRef<Path>) -> Result<()> {
        let root = root.as_ref();
        if root.to_string_lossy().trim().is_empty() {
            return Err(ScanError::InvalidArgument("root folder is empty".into()));
        }

        let mut control = self.shared.control.lock();
        if control.state.is_active() {
            return Err(ScanError::AlreadyRunning);
        }

        self.shared.results.lock().clear();
        *self.shared.last_report.lock() = None;

        let stream = scanner::scan_drive(root, self.aggregator.clone(), &self.config)?;
        let handle = stream.handle().clone();
        let discard = CancellationToken::new();
        // Announce Running before the consumer can broadcast any match.
        self.shared.transition(&mut control, ScanState::Running);

        let shared = self.shared.clone();
        let consumer_discard = discard.clone();
        let report_timeout = self.config.cancel_timeout;
        let spawned = thread::Builder::new()
            .name("foldersleuth-consumer".into())
            .spawn(move || consume(stream, &shared, &consumer_discard, report_timeout));
        let consumer = match spawned {
            Ok(consumer) => consumer,
            Err(err) => {
                // The stream was dropped with the closure, which cancels the scan.
                warn!("Failed to spawn result consumer: {err}");
                self.shared.transition(&mut control, ScanState::Idle);
                return Err(ScanError::Spawn(err));
            }
        };

        control.active = Some(ActiveScan {
            handle,
            discard,
            consumer,
        });
        info!("Scan of {} started", root.display());
        Ok(())
    }

    /// Suspend the running scan. No-op unless [`ScanState::Running`].
    pub fn pause(&self) {
        let mut control = self.shared.control.lock();
        if control.state != ScanState::Running {
            return;
        }
        if let Some(active) = &control.active {
            active.handle.pause();
        }
        self.shared.transition(&mut control, ScanState::Paused);
    }

    /// Continue a paused scan. No-op unless [`ScanState::Paused`].
    pub fn resume(&self) {
        let mut control = self.shared.control.lock();
        if control.state != ScanState::Paused {
            return;
        }
        if let Some(active) = &control.active {
            active.handle.resume();
        }
        self.shared.transition(&mut control, ScanState::Running);
    }

    /// Stop the scan, wait for its workers (bounded by
    /// [`ScanConfig::cancel_timeout`]), clear the results and return to
    /// [`ScanState::Idle`].
    ///
    /// No-op when idle. A call made while another cancel is in progress
    /// waits for that cancel to finish, up to the same bound. After this
    /// returns no further match is ever recorded or broadcast.
    pub fn cancel(&self) {
        let active = {
            let mut control = self.shared.control.lock();
            match control.state {
                ScanState::Idle => return,
                ScanState::Cancelling => {
                    let deadline = Instant::now() + self.config.cancel_timeout;
                    while control.state == ScanState::Cancelling {
                        if self
                            .shared
                            .settled
                            .wait_until(&mut control, deadline)
                            .timed_out()
                        {
                            warn!(
                                "Concurrent cancel did not settle within {:?}",
                                self.config.cancel_timeout
                            );
                            break;
                        }
                    }
                    return;
                }
                _ => {}
            }
            self.shared.transition(&mut control, ScanState::Cancelling);
            control.active.take()
        };

        if let Some(active) = active {
            active.discard.cancel();
            match active.handle.cancel(self.config.cancel_timeout) {
                Some(report) => {
                    debug!("Cancelled scan stopped after {:?}", report.duration);
                    if active.consumer.join().is_err() {
                        warn!("Result consumer terminated abnormally");
                    }
                }
                None => warn!(
                    "Scan workers did not stop within {:?}; detaching them",
                    self.config.cancel_timeout
                ),
            }
        }

        self.shared.results.lock().clear();
        let mut control = self.shared.control.lock();
        self.shared.transition(&mut control, ScanState::Idle);
        info!("Scan cancelled");
    }

    /// Block while a scan is running, paused or cancelling, up to `timeout`.
    ///
    /// Returns the state observed when waiting ended.
    pub fn wait_until_settled(&self, timeout: Duration) -> ScanState {
        let deadline = Instant::now() + timeout;
        let mut control = self.shared.control.lock();
        while control.state.is_active() {
            if self
                .shared
                .settled
                .wait_until(&mut control, deadline)
                .timed_out()
            {
                break;
            }
        }
        control.state
    }
}

impl Default for ScanController {
    fn default() -> Self {
        Self::new(Arc::new(FolderAggregator::default()), ScanConfig::default())
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        if let Some(active) = self.shared.control.lock().active.take() {
            active.discard.cancel();
            active.handle.request_cancel();
        }
    }
}

/// Body of the per-scan consumer thread.
fn consume(
    stream: ScanStream,
    shared: &ControllerShared,
    discard: &CancellationToken,
    report_timeout: Duration,
) {
    let handle = stream.handle().clone();
    for summary in stream {
        let mut results = shared.results.lock();
        if discard.is_cancelled() {
            return;
        }
        shared.broadcast(ScanEvent::Folder(summary.clone()));
        results.push(summary);
    }
    if discard.is_cancelled() {
        return;
    }

    let report = handle.wait(report_timeout);
    let mut control = shared.control.lock();
    // A cancel that raced with the end of the stream owns the state now.
    if discard.is_cancelled() {
        return;
    }
    if let Some(report) = report {
        *shared.last_report.lock() = Some(report.clone());
        shared.broadcast(ScanEvent::Finished(report));
    } else {
        warn!("Scan engine did not report completion within {report_timeout:?}");
    }
    if matches!(control.state, ScanState::Running | ScanState::Paused) {
        // The thread is finishing; dropping its own JoinHandle detaches it.
        control.active = None;
        shared.transition(&mut control, ScanState::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_controller_is_idle() {
        let controller = ScanController::default();
        assert_eq!(controller.state(), ScanState::Idle);
        assert!(controller.results().is_empty());
        assert!(controller.last_report().is_none());
    }

    #[test]
    fn test_blank_root_is_rejected() {
        let controller = ScanController::default();
        assert!(matches!(
            controller.start("   "),
            Err(ScanError::InvalidArgument(_))
        ));
        assert_eq!(controller.state(), ScanState::Idle);
    }

    #[test]
    fn test_controls_are_noops_when_idle() {
        let controller = ScanController::default();
        let events = controller.subscribe();
        controller.pause();
        controller.resume();
        controller.cancel();
        assert_eq!(controller.state(), ScanState::Idle);
        assert!(events.try_recv().is_err(), "no transition should be broadcast");
    }
}
