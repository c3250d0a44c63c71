/// Notifications pushed to controller subscribers.
use crate::model::{FolderSummary, ScanState};
use crate::scanner::ScanReport;

/// One-directional event feed for a presentation layer.
///
/// Delivered in the order the controller produced them. A subscriber that
/// drops its receiver is removed on the next broadcast.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// The controller moved to a new [`ScanState`].
    StateChanged(ScanState),
    /// A matching folder was recorded in the result collection.
    Folder(FolderSummary),
    /// The engine finished (drained or cancelled) with these statistics.
    Finished(ScanReport),
}
