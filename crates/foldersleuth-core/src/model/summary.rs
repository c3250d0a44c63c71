/// Per-folder result record and the per-file metadata filters operate on.
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A directory whose immediate files matched the configured filters.
///
/// Produced once per matching directory per scan. The fields are private so
/// a summary cannot be altered after the aggregator builds it; all sizes are
/// raw byte counts and formatting is left to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FolderSummary {
    path: PathBuf,
    file_count: u64,
    total_size: u64,
}

impl FolderSummary {
    pub fn new(path: PathBuf, file_count: u64, total_size: u64) -> Self {
        Self {
            path,
            file_count,
            total_size,
        }
    }

    /// Directory path as produced by the traversal (root-relative paths stay
    /// relative only if the root itself was relative).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of immediate regular files that could be examined.
    pub fn file_count(&self) -> u64 {
        self.file_count
    }

    /// Sum of the byte lengths of those files.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }
}

/// Metadata of a single file, as seen by a
/// [`FilePredicate`](crate::filter::FilePredicate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    /// Logical length in bytes.
    pub size: u64,
}

impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// Lower-cased extension without the leading dot, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_accessors() {
        let s = FolderSummary::new(PathBuf::from("/data/videos"), 3, 42);
        assert_eq!(s.path(), Path::new("/data/videos"));
        assert_eq!(s.file_count(), 3);
        assert_eq!(s.total_size(), 42);
    }

    #[test]
    fn test_file_info_extension_is_lowercased() {
        assert_eq!(
            FileInfo::new("/a/MOVIE.MKV", 1).extension().as_deref(),
            Some("mkv")
        );
        assert_eq!(FileInfo::new("/a/Makefile", 1).extension(), None);
    }
}
