//! FolderSleuth: finds folders holding large files.
//!
//! Thin command-line front over `foldersleuth-core`. Matches are printed as
//! they arrive; while a scan runs, `p`, `r`, `c` and `q` lines on stdin
//! pause, resume, cancel and quit.

mod format;

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context, Result};
use clap::Parser;
use foldersleuth_core::{
    FilePredicate, FilterSet, FolderAggregator, FolderSummary, ScanConfig, ScanController,
    ScanEvent, ScanReport, ScanState,
};
use tracing_subscriber::EnvFilter;

use format::{format_count, format_match, format_size};

const MB: u64 = 1024 * 1024;

/// FolderSleuth - find the folders that hold your big files
#[derive(Parser, Debug)]
#[command(name = "foldersleuth")]
#[command(about = "Lists folders containing files that match a size or extension filter")]
#[command(version)]
struct Args {
    /// Folder or drive root to scan
    root: Option<PathBuf>,

    /// Report folders holding at least one file of this many MB
    #[arg(long, default_value_t = 10)]
    min_size_mb: u64,

    /// Also report folders holding a file with this extension (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Traversal worker threads (0 = one per logical CPU)
    #[arg(short, long, default_value_t = 0)]
    workers: usize,

    /// Threads for per-folder file aggregation (0 = shared global pool)
    #[arg(long, default_value_t = 0)]
    aggregation_threads: usize,

    /// Print each match as a JSON object
    #[arg(long)]
    json: bool,

    /// List the available scan roots and exit
    #[arg(long)]
    list_roots: bool,

    /// Log engine activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Commands read from stdin while a scan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Cancel,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(Self::Pause),
            "r" | "resume" => Some(Self::Resume),
            "c" | "cancel" => Some(Self::Cancel),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let filters = build_filters(&args);
    let aggregator = Arc::new(FolderAggregator::with_threads(
        filters,
        args.aggregation_threads,
    ));
    let filter_count = aggregator.filters().predicates().len();
    let config = ScanConfig {
        workers: args.workers,
        ..ScanConfig::default()
    };
    let controller = Arc::new(ScanController::new(aggregator, config));

    let Some(root) = args.root.clone().filter(|_| !args.list_roots) else {
        for root in controller.list_roots() {
            println!("{}", root.display());
        }
        return Ok(());
    };
    if !root.is_dir() {
        bail!("not a directory: {}", root.display());
    }

    tracing::info!(
        "Scanning {} with {} workers and {} filter predicates",
        root.display(),
        controller.config().worker_count(),
        filter_count
    );

    let events = controller.subscribe();
    controller
        .start(&root)
        .with_context(|| format!("failed to start scan of {}", root.display()))?;
    spawn_command_reader(controller.clone())?;

    let mut matches: Vec<FolderSummary> = Vec::new();
    let mut report: Option<ScanReport> = None;
    for event in events.iter() {
        match event {
            ScanEvent::Folder(summary) => {
                print_match(&summary, args.json)?;
                matches.push(summary);
            }
            ScanEvent::Finished(finished) => report = Some(finished),
            ScanEvent::StateChanged(ScanState::Paused) => {
                eprintln!("-- paused (r to resume, c to cancel)");
            }
            ScanEvent::StateChanged(ScanState::Running) => {}
            ScanEvent::StateChanged(ScanState::Cancelling) => eprintln!("-- cancelling"),
            ScanEvent::StateChanged(ScanState::Idle) => {
                eprintln!("-- scan cancelled");
                return Ok(());
            }
            ScanEvent::StateChanged(ScanState::Stopped) => break,
        }
    }

    print_summary(&matches, report.as_ref());
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// `--min-size-mb` and every `--ext` are OR-combined.
fn build_filters(args: &Args) -> FilterSet {
    args.extensions
        .iter()
        .map(|ext| FilePredicate::extension(ext))
        .fold(FilterSet::min_size(args.min_size_mb * MB), FilterSet::with)
}

fn print_match(summary: &FolderSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
    } else {
        println!(
            "{}",
            format_match(summary.path(), summary.file_count(), summary.total_size())
        );
    }
    Ok(())
}

fn print_summary(matches: &[FolderSummary], report: Option<&ScanReport>) {
    let (files, bytes) = matches.iter().fold((0u64, 0u64), |(files, bytes), s| {
        (
            files.saturating_add(s.file_count()),
            bytes.saturating_add(s.total_size()),
        )
    });
    eprintln!(
        "{} matching folders, {} files, {}",
        format_count(matches.len() as u64),
        format_count(files),
        format_size(bytes)
    );
    if let Some(report) = report {
        eprintln!(
            "{} folders scanned, {} skipped in {:.1?}",
            format_count(report.directories_scanned),
            format_count(report.directories_skipped),
            report.duration
        );
    }
}

/// Forward stdin commands to the controller until `q` or end of input.
///
/// The thread is detached; the process exits from `main` when the scan ends.
fn spawn_command_reader(controller: Arc<ScanController>) -> Result<()> {
    thread::Builder::new()
        .name("foldersleuth-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match Command::parse(&line) {
                    Some(Command::Pause) => controller.pause(),
                    Some(Command::Resume) => controller.resume(),
                    Some(Command::Cancel) => controller.cancel(),
                    Some(Command::Quit) => {
                        controller.cancel();
                        break;
                    }
                    None => eprintln!("-- unknown command {:?} (p, r, c, q)", line.trim()),
                }
            }
        })
        .context("failed to spawn stdin reader")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("p"), Some(Command::Pause));
        assert_eq!(Command::parse(" Resume \n"), Some(Command::Resume));
        assert_eq!(Command::parse("C"), Some(Command::Cancel));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("x"), None);
    }

    #[test]
    fn test_build_filters_or_combines_extensions() {
        let args = Args::parse_from(["foldersleuth", "/tmp", "--min-size-mb", "5", "--ext", "iso"]);
        let filters = build_filters(&args);
        assert_eq!(filters.predicates().len(), 2);

        let small_iso = foldersleuth_core::FileInfo::new("/tmp/a.ISO", 10);
        let big_txt = foldersleuth_core::FileInfo::new("/tmp/b.txt", 6 * MB);
        let small_txt = foldersleuth_core::FileInfo::new("/tmp/c.txt", 10);
        assert!(filters.matches(&small_iso));
        assert!(filters.matches(&big_txt));
        assert!(!filters.matches(&small_txt));
    }
}
