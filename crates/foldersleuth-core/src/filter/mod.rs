/// Folder filters: which directories are worth reporting.
///
/// A [`FilterSet`] is fixed configuration: it is built before a scan and
/// shared read-only by every worker. A directory matches when *any* of its
/// immediate files satisfies *any* predicate.
pub mod predicate;

pub use predicate::{FilePredicate, TEN_MB};

use crate::model::FileInfo;

/// Ordered set of file predicates combined with logical OR.
#[derive(Debug, Clone)]
pub struct FilterSet {
    predicates: Vec<FilePredicate>,
}

impl FilterSet {
    /// An empty set. Matches nothing.
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Builder-style append.
    pub fn with(mut self, predicate: FilePredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Shorthand for a set holding one [`FilePredicate::MinSize`].
    pub fn min_size(bytes: u64) -> Self {
        Self::new().with(FilePredicate::MinSize(bytes))
    }

    pub fn predicates(&self) -> &[FilePredicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// True if any predicate accepts `file`. Stops at the first hit.
    #[inline]
    pub fn matches(&self, file: &FileInfo) -> bool {
        self.predicates.iter().any(|p| p.matches(file))
    }
}

/// The default set: a single "file ≥ 10 MB" predicate.
impl Default for FilterSet {
    fn default() -> Self {
        Self::min_size(TEN_MB)
    }
}

impl FromIterator<FilePredicate> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FilePredicate>>(iter: I) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = FilterSet::new();
        assert!(set.is_empty());
        assert!(!set.matches(&FileInfo::new("huge.bin", u64::MAX)));
    }

    #[test]
    fn test_default_is_ten_mb() {
        let set = FilterSet::default();
        assert!(set.matches(&FileInfo::new("a", TEN_MB)));
        assert!(!set.matches(&FileInfo::new("a", TEN_MB - 1)));
    }

    #[test]
    fn test_predicates_are_or_combined() {
        let set: FilterSet = [
            FilePredicate::MinSize(1_000),
            FilePredicate::extension("iso"),
        ]
        .into_iter()
        .collect();

        assert!(set.matches(&FileInfo::new("small.iso", 1)));
        assert!(set.matches(&FileInfo::new("big.txt", 5_000)));
        assert!(!set.matches(&FileInfo::new("small.txt", 1)));
        assert_eq!(set.predicates().len(), 2);
    }
}
