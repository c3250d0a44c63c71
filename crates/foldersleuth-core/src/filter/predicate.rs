/// Single-file predicates.
use crate::model::FileInfo;
use std::fmt;
use std::sync::Arc;

/// Ten mebibytes, the default "large file" threshold.
pub const TEN_MB: u64 = 10 * 1024 * 1024;

/// A pure, stateless test over one file's metadata.
#[derive(Clone)]
pub enum FilePredicate {
    /// File is at least this many bytes.
    MinSize(u64),
    /// File is at most this many bytes.
    MaxSize(u64),
    /// File has this extension (case-insensitive, without the dot).
    Extension(String),
    /// Caller-supplied test. Must not hold mutable state.
    Custom(Arc<dyn Fn(&FileInfo) -> bool + Send + Sync>),
}

impl FilePredicate {
    /// Wrap a closure as a [`FilePredicate::Custom`].
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&FileInfo) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Extension predicate; a leading dot is tolerated.
    pub fn extension(ext: &str) -> Self {
        Self::Extension(ext.trim_start_matches('.').to_ascii_lowercase())
    }

    #[inline]
    pub fn matches(&self, file: &FileInfo) -> bool {
        match self {
            Self::MinSize(min) => file.size >= *min,
            Self::MaxSize(max) => file.size <= *max,
            Self::Extension(ext) => file.extension().as_deref() == Some(ext.as_str()),
            Self::Custom(f) => f(file),
        }
    }
}

impl fmt::Debug for FilePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinSize(n) => f.debug_tuple("MinSize").field(n).finish(),
            Self::MaxSize(n) => f.debug_tuple("MaxSize").field(n).finish(),
            Self::Extension(e) => f.debug_tuple("Extension").field(e).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_size_is_inclusive() {
        let p = FilePredicate::MinSize(TEN_MB);
        assert!(p.matches(&FileInfo::new("a.bin", TEN_MB)));
        assert!(!p.matches(&FileInfo::new("a.bin", TEN_MB - 1)));
    }

    #[test]
    fn test_max_size() {
        let p = FilePredicate::MaxSize(10);
        assert!(p.matches(&FileInfo::new("a", 10)));
        assert!(!p.matches(&FileInfo::new("a", 11)));
    }

    #[test]
    fn test_extension_ignores_case_and_dot() {
        let p = FilePredicate::extension(".ISO");
        assert!(p.matches(&FileInfo::new("/x/ubuntu.iso", 0)));
        assert!(p.matches(&FileInfo::new("/x/UBUNTU.Iso", 0)));
        assert!(!p.matches(&FileInfo::new("/x/iso", 0)));
    }

    #[test]
    fn test_custom() {
        let p = FilePredicate::custom(|f| f.path.ends_with("keep.me"));
        assert!(p.matches(&FileInfo::new("/x/keep.me", 0)));
        assert!(!p.matches(&FileInfo::new("/x/drop.me", 0)));
        assert_eq!(format!("{p:?}"), "Custom(..)");
    }
}
