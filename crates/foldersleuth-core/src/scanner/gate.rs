/// Cooperative pause barrier shared by all scan workers.
///
/// Workers call [`PauseGate::await_unpaused`] at their checkpoints. While the
/// gate is engaged they block on a condition variable (no spinning); a
/// release wakes every waiter at once. The flag and the condvar share one
/// mutex, so a release can never slip in between a worker's check and its
/// wait.
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub struct PauseGate {
    paused: Mutex<bool>,
    released: Condvar,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engage (`true`) or release (`false`) the gate.
    ///
    /// Setting the current state again is a no-op.
    pub fn set_paused(&self, paused: bool) {
        let mut guard = self.paused.lock();
        if *guard == paused {
            return;
        }
        *guard = paused;
        if !paused {
            self.released.notify_all();
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    /// Block the calling thread while the gate is engaged.
    ///
    /// Returns immediately when not paused.
    pub fn await_unpaused(&self) {
        let mut guard = self.paused.lock();
        while *guard {
            self.released.wait(&mut guard);
        }
    }
}
