/// Lifecycle state of a [`ScanController`](crate::controller::ScanController).
///
/// ```text
///   Idle ──start──▶ Running ──pause──▶ Paused
///    ▲               │  ▲                │
///    │               │  └────resume──────┘
///    │            (drained)
///    │               ▼
///    │            Stopped ──start──▶ Running
///    │
///    └──── Cancelling ◀──cancel── Running | Paused | Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    /// No scan has run, or the last one was cancelled.
    Idle,
    /// Workers are traversing the volume.
    Running,
    /// Workers are parked on the pause gate.
    Paused,
    /// `cancel` is waiting for the workers to exit.
    Cancelling,
    /// The last scan drained the whole tree; its results are still held.
    Stopped,
}

impl ScanState {
    /// A scan is in flight (a second `start` is rejected).
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused | Self::Cancelling)
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Cancelling => "Cancelling",
            Self::Stopped => "Stopped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        assert!(!ScanState::Idle.is_active());
        assert!(ScanState::Running.is_active());
        assert!(ScanState::Paused.is_active());
        assert!(ScanState::Cancelling.is_active());
        assert!(!ScanState::Stopped.is_active());
    }
}
