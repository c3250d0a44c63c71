/// Scan-wide signals and statistics: the cancellation token observed by
/// workers, the engine phase, and the report sent when the engine is done.
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cancellation flag for one scan. Written by the controlling side only,
/// read by workers at their checkpoints.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Engine lifecycle within one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EnginePhase {
    /// Root pushed, workers not yet launched.
    Seeded = 0,
    /// Workers are draining the queue.
    Running = 1,
    /// Cancellation requested; workers finish their current item and exit.
    Draining = 2,
    /// Every worker has exited.
    Done = 3,
}

impl EnginePhase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Seeded,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Done,
        }
    }
}

/// Atomic cell holding an [`EnginePhase`].
#[derive(Debug)]
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub(crate) fn new(phase: EnginePhase) -> Self {
        Self(AtomicU8::new(phase as u8))
    }

    pub(crate) fn get(&self) -> EnginePhase {
        EnginePhase::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, phase: EnginePhase) {
        self.0.store(phase as u8, Ordering::SeqCst);
    }

    /// Move `Running` to `Draining`; leaves any other phase untouched.
    pub(crate) fn begin_draining(&self) {
        let _ = self.0.compare_exchange(
            EnginePhase::Running as u8,
            EnginePhase::Draining as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

/// Counters updated by workers while the scan runs.
#[derive(Debug, Default)]
pub(crate) struct ScanCounters {
    pub directories_scanned: AtomicU64,
    pub directories_skipped: AtomicU64,
    pub folders_matched: AtomicU64,
}

impl ScanCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Sent once on the engine's completion channel when the last worker exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub duration: Duration,
    /// Directories whose subdirectories were listed.
    pub directories_scanned: u64,
    /// Directories skipped because they could not be listed.
    pub directories_skipped: u64,
    /// Summaries handed to the output stream.
    pub folders_matched: u64,
    /// Workers that terminated abnormally.
    pub worker_failures: u64,
    /// The scan ended because of a cancellation request.
    pub cancelled: bool,
}

impl ScanReport {
    pub(crate) fn from_counters(
        counters: &ScanCounters,
        duration: Duration,
        worker_failures: u64,
        cancelled: bool,
    ) -> Self {
        Self {
            duration,
            directories_scanned: counters.directories_scanned.load(Ordering::Relaxed),
            directories_skipped: counters.directories_skipped.load(Ordering::Relaxed),
            folders_matched: counters.folders_matched.load(Ordering::Relaxed),
            worker_failures,
            cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_draining_only_from_running() {
        let cell = PhaseCell::new(EnginePhase::Seeded);
        cell.begin_draining();
        assert_eq!(cell.get(), EnginePhase::Seeded);

        cell.set(EnginePhase::Running);
        cell.begin_draining();
        assert_eq!(cell.get(), EnginePhase::Draining);

        cell.set(EnginePhase::Done);
        cell.begin_draining();
        assert_eq!(cell.get(), EnginePhase::Done);
    }
}
