/// Platform-specific functionality: enumeration of scan roots
/// (Windows logical drives, Unix mount points).
pub mod roots;

pub use roots::list_roots;
