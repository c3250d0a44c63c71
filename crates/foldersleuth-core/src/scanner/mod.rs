/// Scanner module: finds folders whose immediate files match a
/// [`FilterSet`](crate::filter::FilterSet).
///
/// - [`queue`]: LIFO work queue with quiescence detection.
/// - [`gate`]: cooperative pause barrier.
/// - [`aggregate`]: per-directory parallel file aggregation.
/// - [`engine`]: worker pool, supervisor and control handle.
/// - [`stream`]: the consumer-facing result sequence.
/// - [`progress`]: cancellation token, engine phase, completion report.
pub mod aggregate;
pub mod engine;
pub mod gate;
pub mod progress;
pub mod queue;
pub mod stream;

pub use aggregate::FolderAggregator;
pub use engine::{
    ScanConfig, ScanHandle, DEFAULT_CANCEL_TIMEOUT, RESULT_CHANNEL_CAPACITY, SEND_POLL_INTERVAL,
};
pub use gate::PauseGate;
pub use progress::{CancellationToken, EnginePhase, ScanReport};
pub use queue::{Claim, WorkQueue};
pub use stream::ScanStream;

use crate::error::{Result, ScanError};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Start scanning `root` on a background worker pool.
///
/// Fails with [`ScanError::InvalidArgument`] for an empty or blank root
/// before any thread is started. Everything that goes wrong during the
/// traversal itself is absorbed: an unreadable root simply yields an empty
/// stream.
pub fn scan_drive(
    root: impl AsRef<Path>,
    aggregator: Arc<FolderAggregator>,
    config: &ScanConfig,
) -> Result<ScanStream> {
    let root = root.as_ref();
    if root.to_string_lossy().trim().is_empty() {
        return Err(ScanError::InvalidArgument("root folder is empty".into()));
    }

    info!("Starting scan of {}", root.display());
    let (results, handle) = engine::launch(root.to_path_buf(), aggregator, config)?;
    Ok(ScanStream::new(results, handle))
}
