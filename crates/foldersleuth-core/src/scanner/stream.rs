/// Consumer side of a scan: a lazy, single-pass sequence of matches.
use super::engine::ScanHandle;
use crate::model::FolderSummary;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Matches in completion order. Iteration blocks until the next match or
/// until every worker has exited, at which point it ends for good.
///
/// Dropping an unfinished stream cancels its scan.
#[derive(Debug)]
pub struct ScanStream {
    results: Receiver<FolderSummary>,
    handle: ScanHandle,
    exhausted: bool,
}

impl ScanStream {
    pub(crate) fn new(results: Receiver<FolderSummary>, handle: ScanHandle) -> Self {
        Self {
            results,
            handle,
            exhausted: false,
        }
    }

    /// Control handle for pause, resume, cancel and completion.
    pub fn handle(&self) -> &ScanHandle {
        &self.handle
    }

    /// Next match, waiting at most `timeout`.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<FolderSummary, RecvTimeoutError> {
        let next = self.results.recv_timeout(timeout);
        if matches!(next, Err(RecvTimeoutError::Disconnected)) {
            self.exhausted = true;
        }
        next
    }

    /// Next match if one is already buffered.
    pub fn try_next(&mut self) -> Result<FolderSummary, TryRecvError> {
        let next = self.results.try_recv();
        if matches!(next, Err(TryRecvError::Disconnected)) {
            self.exhausted = true;
        }
        next
    }

    /// The engine has finished and no buffered match remains.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl Iterator for ScanStream {
    type Item = FolderSummary;

    fn next(&mut self) -> Option<FolderSummary> {
        if self.exhausted {
            return None;
        }
        match self.results.recv() {
            Ok(summary) => Some(summary),
            Err(_) => {
                self.exhausted = true;
                None
            }
        }
    }
}

impl Drop for ScanStream {
    fn drop(&mut self) {
        if !self.exhausted {
            self.handle.request_cancel();
        }
    }
}
