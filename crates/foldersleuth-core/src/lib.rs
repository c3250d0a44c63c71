/// FolderSleuth Core: finds folders whose immediate files match a filter
/// (by default: at least one file of 10 MB or more).
///
/// This crate contains all scanning logic with zero UI dependencies. Sizes
/// cross the API as raw byte counts; formatting belongs to the frontend.
///
/// # Modules
///
/// - [`filter`]: file predicates and the OR-combined [`FilterSet`].
/// - [`model`]: [`FolderSummary`] results and the controller [`ScanState`].
/// - [`scanner`]: work queue, pause gate, aggregator and worker pool.
/// - [`controller`]: start / pause / resume / cancel front with events.
/// - [`platform`]: scan-root enumeration.
pub mod controller;
pub mod error;
pub mod filter;
pub mod model;
pub mod platform;
pub mod scanner;

pub use controller::{ScanController, ScanEvent};
pub use error::{Result, ScanError};
pub use filter::{FilePredicate, FilterSet};
pub use model::{FileInfo, FolderSummary, ScanState};
pub use scanner::{scan_drive, FolderAggregator, ScanConfig, ScanReport, ScanStream};
