/// Data model shared by the scanner, the controller and their consumers.
pub mod state;
pub mod summary;

pub use state::ScanState;
pub use summary::{FileInfo, FolderSummary};
