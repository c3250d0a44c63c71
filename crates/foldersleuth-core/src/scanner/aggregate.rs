/// Per-directory aggregation: count and size the immediate files of one
/// directory and decide whether it matches the [`FilterSet`].
///
/// The directory is listed once on the calling thread; metadata lookups and
/// predicate evaluation then fan out over rayon. Each file contributes a
/// `(count, size, matched)` triple and the triples are combined with
/// `(+, +, ||)`, which is associative and commutative, so the totals do not
/// depend on how rayon splits the work.
use crate::filter::FilterSet;
use crate::model::{FileInfo, FolderSummary};
use rayon::prelude::*;
use std::fs::DirEntry;
use std::path::Path;
use tracing::{trace, warn};

/// Partial result for a slice of a directory's files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Tally {
    files: u64,
    bytes: u64,
    matched: bool,
}

impl Tally {
    #[inline]
    fn merge(self, other: Self) -> Self {
        // Sparse files can report sizes near u64::MAX; totals saturate.
        Self {
            files: self.files.saturating_add(other.files),
            bytes: self.bytes.saturating_add(other.bytes),
            matched: self.matched || other.matched,
        }
    }
}

/// Computes [`FolderSummary`] values for single directories.
pub struct FolderAggregator {
    filters: FilterSet,
    /// Dedicated pool; `None` runs on rayon's global pool.
    pool: Option<rayon::ThreadPool>,
}

impl FolderAggregator {
    /// Aggregator running on rayon's global thread pool.
    pub fn new(filters: FilterSet) -> Self {
        Self {
            filters,
            pool: None,
        }
    }

    /// Aggregator with its own pool of `threads` threads (`0` = global pool).
    ///
    /// Falls back to the global pool if the dedicated one cannot be built.
    pub fn with_threads(filters: FilterSet, threads: usize) -> Self {
        if threads == 0 {
            return Self::new(filters);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("foldersleuth-aggregate-{i}"))
            .build();
        match pool {
            Ok(pool) => Self {
                filters,
                pool: Some(pool),
            },
            Err(err) => {
                warn!("Could not build a {threads}-thread aggregation pool ({err}); using the global pool");
                Self::new(filters)
            }
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Summarise the immediate files of `dir`.
    ///
    /// Returns `None` if no file matched a predicate, if the directory has no
    /// readable files, or if it cannot be listed at all. Files whose metadata
    /// cannot be read are left out of every total.
    pub fn aggregate(&self, dir: &Path) -> Option<FolderSummary> {
        if self.filters.is_empty() {
            return None;
        }

        let entries: Vec<DirEntry> = match std::fs::read_dir(dir) {
            Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
            Err(err) => {
                trace!("Cannot list files of {}: {err}", dir.display());
                return None;
            }
        };
        if entries.is_empty() {
            return None;
        }

        let tally = match &self.pool {
            Some(pool) => pool.install(|| self.tally(&entries)),
            None => self.tally(&entries),
        };

        tally
            .matched
            .then(|| FolderSummary::new(dir.to_path_buf(), tally.files, tally.bytes))
    }

    fn tally(&self, entries: &[DirEntry]) -> Tally {
        entries
            .par_iter()
            .filter_map(file_info)
            .map(|file| Tally {
                files: 1,
                bytes: file.size,
                matched: self.filters.matches(&file),
            })
            .reduce(Tally::default, Tally::merge)
    }
}

impl Default for FolderAggregator {
    fn default() -> Self {
        Self::new(FilterSet::default())
    }
}

impl std::fmt::Debug for FolderAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderAggregator")
            .field("filters", &self.filters)
            .field(
                "threads",
                &self.pool.as_ref().map(rayon::ThreadPool::current_num_threads),
            )
            .finish()
    }
}

/// Metadata for a regular file entry. Directories, symlinks and entries that
/// vanished or cannot be stat'ed yield `None`.
fn file_info(entry: &DirEntry) -> Option<FileInfo> {
    let meta = match entry.metadata() {
        Ok(m) => m,
        Err(err) => {
            trace!("Skipping {}: {err}", entry.path().display());
            return None;
        }
    };
    meta.is_file().then(|| FileInfo::new(entry.path(), meta.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilePredicate, TEN_MB};
    use std::fs;
    use tempfile::TempDir;

    fn sized_file(path: &Path, len: u64) {
        let f = fs::File::create(path).unwrap();
        f.set_len(len).unwrap();
    }

    #[test]
    fn test_tally_merge_saturates_instead_of_overflowing() {
        let huge = Tally {
            files: 1,
            bytes: u64::MAX - 1,
            matched: false,
        };
        let merged = huge.merge(huge).merge(Tally {
            files: 1,
            bytes: 5,
            matched: true,
        });
        assert_eq!(merged.files, 3);
        assert_eq!(merged.bytes, u64::MAX);
        assert!(merged.matched);

        let counts = Tally {
            files: u64::MAX,
            bytes: 0,
            matched: false,
        };
        assert_eq!(counts.merge(counts).files, u64::MAX);
    }

    #[test]
    fn test_filters_accessor_exposes_configured_set() {
        let agg = FolderAggregator::new(FilterSet::min_size(42).with(FilePredicate::extension("iso")));
        assert_eq!(agg.filters().predicates().len(), 2);
        assert!(FolderAggregator::default().filters().predicates().len() == 1);
    }

    #[test]
    fn test_directory_below_threshold_is_not_reported() {
        let tmp = TempDir::new().unwrap();
        sized_file(&tmp.path().join("a.bin"), 1024 * 1024);
        sized_file(&tmp.path().join("b.bin"), TEN_MB - 1);

        assert!(FolderAggregator::default().aggregate(tmp.path()).is_none());
    }

    #[test]
    fn test_matching_directory_counts_every_file() {
        let tmp = TempDir::new().unwrap();
        sized_file(&tmp.path().join("big.bin"), 20 * 1024 * 1024);
        sized_file(&tmp.path().join("small.txt"), 100);
        sized_file(&tmp.path().join("empty"), 0);
        fs::create_dir(tmp.path().join("child")).unwrap();
        sized_file(&tmp.path().join("child").join("nested.bin"), 50 * 1024 * 1024);

        let summary = FolderAggregator::default()
            .aggregate(tmp.path())
            .expect("directory holds a 20 MB file");
        assert_eq!(summary.path(), tmp.path());
        assert_eq!(summary.file_count(), 3, "subdirectory contents must not count");
        assert_eq!(summary.total_size(), 20 * 1024 * 1024 + 100);
    }

    #[test]
    fn test_empty_directory_is_not_reported() {
        let tmp = TempDir::new().unwrap();
        let agg = FolderAggregator::new(FilterSet::min_size(0));
        assert!(agg.aggregate(tmp.path()).is_none());
    }

    #[test]
    fn test_missing_directory_yields_none() {
        let tmp = TempDir::new().unwrap();
        let agg = FolderAggregator::new(FilterSet::min_size(0));
        assert!(agg.aggregate(&tmp.path().join("gone")).is_none());
    }

    #[test]
    fn test_empty_filter_set_never_matches() {
        let tmp = TempDir::new().unwrap();
        sized_file(&tmp.path().join("big.bin"), 20 * 1024 * 1024);
        assert!(FolderAggregator::new(FilterSet::new())
            .aggregate(tmp.path())
            .is_none());
    }

    #[test]
    fn test_totals_do_not_depend_on_thread_count() {
        let tmp = TempDir::new().unwrap();
        let mut expected = 0u64;
        for i in 0..257u64 {
            let len = i * 37 + 1;
            expected += len;
            sized_file(&tmp.path().join(format!("f{i:03}.dat")), len);
        }
        let filters = FilterSet::new().with(FilePredicate::MinSize(9_000));

        let single = FolderAggregator::with_threads(filters.clone(), 1)
            .aggregate(tmp.path())
            .unwrap();
        let many = FolderAggregator::with_threads(filters, 8)
            .aggregate(tmp.path())
            .unwrap();

        assert_eq!(single, many);
        assert_eq!(single.file_count(), 257);
        assert_eq!(single.total_size(), expected);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_and_dangling_links_are_excluded() {
        let tmp = TempDir::new().unwrap();
        let big = tmp.path().join("big.bin");
        sized_file(&big, TEN_MB);
        std::os::unix::fs::symlink(&big, tmp.path().join("link.bin")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("nope"), tmp.path().join("dangling")).unwrap();

        let summary = FolderAggregator::default().aggregate(tmp.path()).unwrap();
        assert_eq!(summary.file_count(), 1);
        assert_eq!(summary.total_size(), TEN_MB);
    }
}
