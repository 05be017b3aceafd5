use crate::error::SeekrError;
use crate::search::matcher::{Matcher, Span};
use crate::search::source::{ByteSource, MmapConfig};
use crate::walker::WalkEntry;
use log::{debug, warn};
use memchr::memchr;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const BINARY_CHECK_SIZE: usize = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLine {
    pub line_number: u64,
    pub byte_offset: u64,
    pub line: Vec<u8>,
}

/// One reported line. Under `--invert-match` the spans are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub path: Arc<Path>,
    pub line_number: u64,
    /// Offset of the first byte of the line from the start of the file.
    pub byte_offset: u64,
    /// 1-based byte column of the first span, 1 when there is none.
    pub column: u64,
    pub spans: Vec<Span>,
    pub line: Vec<u8>,
    pub context_before: Vec<ContextLine>,
    pub context_after: Vec<ContextLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: Arc<Path>,
    pub records: Vec<MatchRecord>,
    pub matched_lines: u64,
    pub matches: u64,
    pub bytes_searched: u64,
}

impl FileResult {
    pub fn has_match(&self) -> bool {
        self.matched_lines > 0
    }
}

/// Exactly one of these is produced for every entry handed to a worker.
#[derive(Debug)]
pub enum FileOutcome {
    Searched(FileResult),
    Binary(PathBuf),
    Failed(PathBuf),
    Cancelled(PathBuf),
}

impl FileOutcome {
    pub fn has_match(&self) -> bool {
        matches!(self, FileOutcome::Searched(result) if result.has_match())
    }

    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Searched(result) => &result.path,
            FileOutcome::Binary(path) | FileOutcome::Failed(path) | FileOutcome::Cancelled(path) => path,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub invert: bool,
    /// Limit on matching lines per file.
    pub max_count: Option<u64>,
    pub before_context: usize,
    pub after_context: usize,
    /// Search binary files as text.
    pub text: bool,
    /// Build `MatchRecord`s; counting modes only need the totals.
    pub collect: bool,
    /// `--replace`: reported lines carry the rewritten text and the spans
    /// of the replacements.
    pub replace: Option<Vec<u8>>,
    /// Decode gzip, xz and lzma files before searching.
    pub search_zip: bool,
    /// `--encoding`; `None` sniffs for a UTF-16 byte-order mark.
    pub encoding: Option<&'static encoding_rs::Encoding>,
}

/// A NUL byte near the start of the buffer marks the file as binary.
pub fn is_binary(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(BINARY_CHECK_SIZE)];
    memchr(0, head).is_some()
}

pub fn search_entry(
    entry: &WalkEntry,
    matcher: &Matcher,
    options: &ScanOptions,
    mmap: &MmapConfig,
) -> FileOutcome {
    let source = if entry.is_stdin() {
        ByteSource::stdin()
    } else {
        ByteSource::open(entry.path(), mmap)
    };
    let source = match source {
        Ok(source) if options.search_zip && !entry.is_stdin() => source.decompress(entry.path()),
        other => other,
    };
    let source = match source {
        Ok(source) => source.transcode(options.encoding),
        Err(e) => {
            warn!("{}", SeekrError::file(entry.path(), e));
            return FileOutcome::Failed(entry.path().to_path_buf());
        }
    };

    if !options.text && is_binary(&source) {
        debug!("skipping binary file: {}", entry.path().display());
        return FileOutcome::Binary(entry.path().to_path_buf());
    }

    FileOutcome::Searched(search_bytes(Arc::from(entry.path()), &source, matcher, options))
}

/// Scans `bytes` line by line. Lines end at `\n`; the terminator is not part
/// of the reported line.
pub fn search_bytes(
    path: Arc<Path>,
    bytes: &[u8],
    matcher: &Matcher,
    options: &ScanOptions,
) -> FileResult {
    let mut result = FileResult {
        path,
        records: Vec::new(),
        matched_lines: 0,
        matches: 0,
        bytes_searched: bytes.len() as u64,
    };

    if !options.invert && !matcher.is_match(bytes) {
        return result;
    }

    let mut limit_reached = options.max_count == Some(0);
    let mut before: VecDeque<ContextLine> = VecDeque::with_capacity(options.before_context);
    let mut after_left = 0usize;
    let mut start = 0usize;
    let mut line_number = 0u64;

    while start < bytes.len() {
        if limit_reached && after_left == 0 {
            break;
        }
        let end = memchr(b'\n', &bytes[start..]).map_or(bytes.len(), |i| start + i);
        let line = &bytes[start..end];
        line_number += 1;

        let spans = if limit_reached { Vec::new() } else { matcher.find_spans(line) };
        let hit = !limit_reached && (spans.is_empty() == options.invert);

        if hit {
            result.matched_lines += 1;
            if !options.invert {
                result.matches += spans.len() as u64;
            }
            if options.collect {
                let column = match (options.invert, spans.first()) {
                    (false, Some(first)) => first.start as u64 + 1,
                    _ => 1,
                };
                let (line, spans) = match (&options.replace, options.invert) {
                    (_, true) => (line.to_vec(), Vec::new()),
                    (Some(replacement), false) => matcher.replace(line, replacement),
                    (None, false) => (line.to_vec(), spans),
                };
                result.records.push(MatchRecord {
                    path: Arc::clone(&result.path),
                    line_number,
                    byte_offset: start as u64,
                    column,
                    spans,
                    line,
                    context_before: before.drain(..).collect(),
                    context_after: Vec::new(),
                });
                after_left = options.after_context;
            }
            limit_reached = options.max_count.is_some_and(|max| result.matched_lines >= max);
        } else if options.collect {
            let context = ContextLine {
                line_number,
                byte_offset: start as u64,
                line: line.to_vec(),
            };
            if after_left > 0 {
                after_left -= 1;
                if let Some(last) = result.records.last_mut() {
                    last.context_after.push(context.clone());
                }
            }
            if options.before_context > 0 {
                if before.len() == options.before_context {
                    before.pop_front();
                }
                before.push_back(context);
            }
        }

        start = end + 1;
    }

    result
}
