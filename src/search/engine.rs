//! Walker thread, worker pool and in-order printing.
use crate::args::SearchConfig;
use crate::error::Result;
use crate::metrics::SearchStats;
use crate::output::{OutputMode, Printer, ReorderBuffer};
use crate::processor::{search_entry, FileOutcome};
use crate::search::matcher::Matcher;
use crate::walker::{WalkEntry, Walker};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::debug;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Queue slots per worker for both the work and the result channel.
const QUEUE_DEPTH_PER_WORKER: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct SearchSummary {
    pub stats: SearchStats,
    pub matched: bool,
    /// Most results that waited at once for an earlier file to finish.
    pub peak_pending: usize,
}

pub struct SearchEngine {
    config: Arc<SearchConfig>,
    matcher: Arc<Matcher>,
    stop: Arc<AtomicBool>,
}

impl SearchEngine {
    pub fn new(config: Arc<SearchConfig>, matcher: Matcher) -> Self {
        Self {
            config,
            matcher: Arc::new(matcher),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Setting the returned flag cancels the search: the walker stops
    /// producing and workers answer remaining entries with `Cancelled`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn search<W: Write>(&self, walker: Walker, printer: &mut Printer<W>) -> Result<SearchSummary> {
        let start = Instant::now();
        let threads = self.config.threads.max(1);
        let window = threads * QUEUE_DEPTH_PER_WORKER;
        let mut stats = SearchStats::new();
        let mut peak_pending = 0;
        debug!("searching with {threads} worker(s), reorder window {window}");

        thread::scope(|scope| -> Result<()> {
            let (work_tx, work_rx) = bounded::<(u64, WalkEntry)>(window);
            let (done_tx, done_rx) = bounded::<(u64, FileOutcome)>(window);
            // One permit per file between dispatch and print: at most
            // `window` results wait in the reorder buffer.
            let (permit_tx, permit_rx) = bounded::<()>(window);
            for _ in 0..window {
                let _ = permit_tx.try_send(());
            }

            let stop = &self.stop;
            thread::Builder::new()
                .name("seekr-walker".to_string())
                .spawn_scoped(scope, move || {
                    for (seq, entry) in walker.enumerate() {
                        if stop.load(Ordering::Relaxed) || permit_rx.recv().is_err() {
                            break;
                        }
                        if work_tx.send((seq as u64, entry)).is_err() {
                            break;
                        }
                    }
                })?;

            for id in 0..threads {
                let jobs = work_rx.clone();
                let results = done_tx.clone();
                thread::Builder::new()
                    .name(format!("seekr-worker-{id}"))
                    .spawn_scoped(scope, move || self.work(jobs, results))?;
            }
            drop(work_rx);
            drop(done_tx);

            // The receiver is owned by this closure so that an early return
            // unblocks workers before the scope joins them.
            let mut reorder = ReorderBuffer::new();
            for (seq, outcome) in done_rx {
                reorder.push(seq, outcome);
                peak_pending = reorder.peak_pending();
                while let Some(outcome) = reorder.pop_ready() {
                    let _ = permit_tx.try_send(());
                    stats.record(&outcome);
                    if let Err(e) = printer.print(&outcome) {
                        self.stop.store(true, Ordering::Relaxed);
                        if e.kind() == io::ErrorKind::BrokenPipe {
                            debug!("output closed, stopping search");
                            return Ok(());
                        }
                        return Err(e.into());
                    }
                }
            }
            Ok(())
        })?;

        stats.elapsed = start.elapsed();
        Ok(SearchSummary {
            stats,
            matched: printer.matched(),
            peak_pending,
        })
    }

    fn work(&self, jobs: Receiver<(u64, WalkEntry)>, results: Sender<(u64, FileOutcome)>) {
        let quit_on_match = self.config.printer.mode == OutputMode::Quiet && !self.config.stats;
        for (seq, entry) in jobs {
            let outcome = if self.stop.load(Ordering::Relaxed) {
                FileOutcome::Cancelled(entry.into_path())
            } else {
                search_entry(&entry, &self.matcher, &self.config.scan, &self.config.mmap)
            };
            if quit_on_match && outcome.has_match() {
                self.stop.store(true, Ordering::Relaxed);
            }
            if results.send((seq, outcome)).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PrinterOptions;
    use crate::processor::ScanOptions;
    use crate::search::matcher::MatcherOptions;
    use std::fs;
    use std::path::Path;

    fn corpus(root: &Path) {
        for i in 0..40 {
            let dir = root.join(format!("d{}", i % 5));
            fs::create_dir_all(&dir).unwrap();
            let body = if i % 3 == 0 { "needle\nhay\nneedle\n" } else { "hay\n" };
            fs::write(dir.join(format!("f{i:02}.txt")), body).unwrap();
        }
    }

    fn config(root: &Path, threads: usize, mode: OutputMode) -> SearchConfig {
        SearchConfig {
            paths: vec![root.to_path_buf()],
            threads,
            scan: ScanOptions {
                collect: mode.needs_records(),
                ..Default::default()
            },
            printer: PrinterOptions {
                mode,
                with_filename: true,
                line_number: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn run(config: SearchConfig) -> (String, SearchSummary) {
        let matcher = Matcher::new(&["needle".to_string()], &MatcherOptions::default()).unwrap();
        let walker = Walker::new(config.paths.clone(), config.walk.clone());
        let engine = SearchEngine::new(Arc::new(config), matcher);
        let mut printer = Printer::new(Vec::new(), engine.config.printer.clone());
        let summary = engine.search(walker, &mut printer).unwrap();
        (String::from_utf8(printer.into_inner()).unwrap(), summary)
    }

    #[test]
    fn test_output_independent_of_thread_count() {
        let dir = tempfile::tempdir().unwrap();
        corpus(dir.path());
        let (single, summary) = run(config(dir.path(), 1, OutputMode::Standard));
        let (parallel, _) = run(config(dir.path(), 8, OutputMode::Standard));
        assert_eq!(single, parallel);
        assert!(summary.matched);
        assert_eq!(summary.stats.files_searched, 40);
        assert_eq!(summary.stats.files_with_matches, 14);
        assert_eq!(summary.stats.matched_lines, 28);
        assert_eq!(single.lines().count(), 28);
    }

    #[test]
    fn test_reorder_window_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..300 {
            fs::write(dir.path().join(format!("f{i:03}.txt")), "needle\n").unwrap();
        }
        let (out, summary) = run(config(dir.path(), 1, OutputMode::Standard));
        assert_eq!(out.lines().count(), 300);
        assert!(summary.peak_pending <= QUEUE_DEPTH_PER_WORKER);

        let (parallel, summary) = run(config(dir.path(), 4, OutputMode::Standard));
        assert_eq!(parallel, out);
        assert!(summary.peak_pending <= 4 * QUEUE_DEPTH_PER_WORKER);
    }

    #[test]
    fn test_no_match_summary() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "hay\n").unwrap();
        let (out, summary) = run(config(dir.path(), 2, OutputMode::Standard));
        assert!(out.is_empty());
        assert!(!summary.matched);
    }

    #[test]
    fn test_quiet_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        corpus(dir.path());
        let (out, summary) = run(config(dir.path(), 1, OutputMode::Quiet));
        assert!(out.is_empty());
        assert!(summary.matched);
        assert!(summary.stats.files_searched < 40);
    }

    #[test]
    fn test_stop_flag_cancels_everything() {
        let dir = tempfile::tempdir().unwrap();
        corpus(dir.path());
        let config = config(dir.path(), 2, OutputMode::Standard);
        let matcher = Matcher::new(&["needle".to_string()], &MatcherOptions::default()).unwrap();
        let walker = Walker::new(config.paths.clone(), config.walk.clone());
        let engine = SearchEngine::new(Arc::new(config), matcher);
        engine.stop_handle().store(true, Ordering::Relaxed);
        let mut printer = Printer::new(Vec::new(), PrinterOptions::default());
        let summary = engine.search(walker, &mut printer).unwrap();
        assert!(!summary.matched);
        assert_eq!(summary.stats.files_searched, 0);
    }
}
