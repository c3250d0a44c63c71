/// Shared LIFO work queue of pending directory paths.
///
/// # Termination
///
/// An empty queue does not mean the scan is finished: a worker that is still
/// listing a directory may be about to push its subdirectories. Workers
/// therefore take paths through [`WorkQueue::claim`], which hands out a
/// [`Claim`] guard and counts it as *in flight* until the guard is dropped.
/// The pending stack and the in-flight counter live under the same mutex, so
/// the quiescence test (`pending` empty AND nothing in flight) is atomic.
/// Once it holds it holds forever, because only in-flight work can push.
///
/// Waiting workers sleep on a condvar; they are woken by a push, by the last
/// in-flight claim finishing on an empty stack, or by [`WorkQueue::close`].
use parking_lot::{Condvar, Mutex};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
struct QueueState {
    pending: Vec<PathBuf>,
    in_flight: usize,
    /// Set on quiescence or cancellation; no more claims are handed out.
    closed: bool,
}

#[derive(Debug, Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    changed: Condvar,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue seeded with a single root path.
    pub fn seeded(root: PathBuf) -> Self {
        let queue = Self::new();
        queue.push(root);
        queue
    }

    /// Push one path. Ignored once the queue is closed.
    pub fn push(&self, path: PathBuf) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.pending.push(path);
        drop(state);
        self.changed.notify_one();
    }

    /// Push a batch of paths under one lock acquisition.
    ///
    /// Returns the number of paths accepted.
    pub fn push_all<I>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut state = self.state.lock();
        if state.closed {
            return 0;
        }
        let before = state.pending.len();
        state.pending.extend(paths);
        let added = state.pending.len() - before;
        drop(state);

        match added {
            0 => {}
            1 => {
                self.changed.notify_one();
            }
            _ => {
                self.changed.notify_all();
            }
        }
        added
    }

    /// Pop the most recently pushed path without in-flight accounting.
    ///
    /// `None` means the stack was empty at the instant of the call, not that
    /// the traversal is over.
    pub fn try_pop(&self) -> Option<PathBuf> {
        self.state.lock().pending.pop()
    }

    /// Take the next path for processing, blocking while other workers may
    /// still produce more.
    ///
    /// Returns `None` once the queue is quiescent or closed.
    pub fn claim(&self) -> Option<Claim<'_>> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(path) = state.pending.pop() {
                state.in_flight += 1;
                return Some(Claim { queue: self, path });
            }
            if state.in_flight == 0 {
                state.closed = true;
                self.changed.notify_all();
                return None;
            }
            self.changed.wait(&mut state);
        }
    }

    /// Abandon all pending paths and release every waiting worker.
    ///
    /// Claims already handed out stay valid until dropped.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.pending.clear();
        drop(state);
        self.changed.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().pending.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    /// Nothing pending and nothing being processed.
    pub fn is_quiescent(&self) -> bool {
        let state = self.state.lock();
        state.pending.is_empty() && state.in_flight == 0
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        state.in_flight -= 1;
        let drained = state.in_flight == 0 && state.pending.is_empty();
        drop(state);
        if drained {
            self.changed.notify_all();
        }
    }
}

/// A path borrowed from the queue for the duration of its processing.
///
/// Dropping the claim (also during a panic unwind) marks the path finished.
#[derive(Debug)]
pub struct Claim<'q> {
    queue: &'q WorkQueue,
    path: PathBuf,
}

impl Claim<'_> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.queue.finish();
    }
}
