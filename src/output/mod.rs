//! Ordering and formatting of search results.
pub mod color;
pub mod json;
pub mod printer;
pub mod reorder;

use crate::processor::{ContextLine, MatchRecord};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{is_separator, Path};

pub use color::ColorSpecs;
pub use printer::Printer;
pub use reorder::ReorderBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Standard,
    Count,
    FilesWithMatches,
    FilesWithoutMatch,
    Json,
    Quiet,
}

impl OutputMode {
    /// Modes that print individual lines and therefore need match records.
    pub fn needs_records(self) -> bool {
        matches!(self, OutputMode::Standard | OutputMode::Json)
    }

    /// Modes decided by the first matching line of a file.
    pub fn stops_at_first_match(self) -> bool {
        matches!(
            self,
            OutputMode::FilesWithMatches | OutputMode::FilesWithoutMatch | OutputMode::Quiet
        )
    }
}

#[derive(Debug, Clone)]
pub struct PrinterOptions {
    pub mode: OutputMode,
    pub heading: bool,
    pub with_filename: bool,
    pub line_number: bool,
    pub column: bool,
    pub color: bool,
    pub colors: ColorSpecs,
    pub context: bool,
    pub context_separator: Vec<u8>,
    pub only_matching: bool,
    pub vimgrep: bool,
    pub null: bool,
    pub max_columns: Option<usize>,
    /// `--path-separator`.
    pub path_separator: Option<u8>,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self {
            mode: OutputMode::Standard,
            heading: false,
            with_filename: false,
            line_number: false,
            column: false,
            color: false,
            colors: ColorSpecs::default(),
            context: false,
            context_separator: b"--".to_vec(),
            only_matching: false,
            vimgrep: false,
            null: false,
            max_columns: None,
            path_separator: None,
        }
    }
}

/// Path bytes as printed, with every path separator swapped for
/// `separator` when one is given.
pub fn path_bytes(path: &Path, separator: Option<u8>) -> Cow<'_, [u8]> {
    let bytes = path.as_os_str().as_encoded_bytes();
    match separator {
        Some(sep) if bytes.iter().any(|&b| is_separator(char::from(b))) => Cow::Owned(
            bytes
                .iter()
                .map(|&b| if is_separator(char::from(b)) { sep } else { b })
                .collect(),
        ),
        _ => Cow::Borrowed(bytes),
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Line<'a> {
    Match(&'a MatchRecord),
    Context(&'a ContextLine),
}

/// Match and context lines of one file keyed by line number. Overlapping
/// context windows collapse and a match line always wins over context.
pub(crate) fn merge_lines(records: &[MatchRecord]) -> BTreeMap<u64, Line<'_>> {
    let mut lines = BTreeMap::new();
    for record in records {
        for context in &record.context_before {
            lines.entry(context.line_number).or_insert(Line::Context(context));
        }
        lines.insert(record.line_number, Line::Match(record));
        for context in &record.context_after {
            lines.entry(context.line_number).or_insert(Line::Context(context));
        }
    }
    lines
}
