use super::{json, merge_lines, path_bytes, Line, OutputMode, PrinterOptions};
use crate::metrics::SearchStats;
use crate::processor::{ContextLine, FileOutcome, FileResult, MatchRecord};
use crate::search::matcher::Span;
use std::io::{self, Write};
use std::path::Path;

/// Formats ordered file outcomes onto `W`.
pub struct Printer<W: Write> {
    wtr: W,
    options: PrinterOptions,
    files_printed: u64,
    hits: u64,
}

impl<W: Write> Printer<W> {
    pub fn new(wtr: W, options: PrinterOptions) -> Self {
        Self {
            wtr,
            options,
            files_printed: 0,
            hits: 0,
        }
    }

    pub fn options(&self) -> &PrinterOptions {
        &self.options
    }

    /// Whether any file counted as a hit for the current mode. Under
    /// `--files-without-match` that means a file was printed.
    pub fn matched(&self) -> bool {
        self.hits > 0
    }

    pub fn into_inner(self) -> W {
        self.wtr
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.wtr.flush()
    }

    pub fn print(&mut self, outcome: &FileOutcome) -> io::Result<()> {
        let result = match outcome {
            FileOutcome::Searched(result) => result,
            _ => return Ok(()),
        };

        match self.options.mode {
            OutputMode::Quiet => {
                if result.has_match() {
                    self.hits += 1;
                }
            }
            OutputMode::FilesWithMatches => {
                if result.has_match() {
                    self.write_path_line(&result.path)?;
                    self.hits += 1;
                }
            }
            OutputMode::FilesWithoutMatch => {
                if !result.has_match() {
                    self.write_path_line(&result.path)?;
                    self.hits += 1;
                }
            }
            OutputMode::Count => {
                if result.has_match() {
                    if self.options.with_filename {
                        self.write_path(&result.path)?;
                        self.write_field_end(b':')?;
                    }
                    writeln!(self.wtr, "{}", result.matched_lines)?;
                    self.hits += 1;
                }
            }
            OutputMode::Json => {
                if result.has_match() {
                    json::write_file(&mut self.wtr, result)?;
                    self.hits += 1;
                }
            }
            OutputMode::Standard => {
                if result.has_match() {
                    self.write_file(result)?;
                    self.hits += 1;
                }
            }
        }
        Ok(())
    }

    pub fn write_stats(&mut self, stats: &SearchStats) -> io::Result<()> {
        stats.write_summary(&mut self.wtr)
    }

    fn write_file(&mut self, result: &FileResult) -> io::Result<()> {
        if self.options.heading {
            if self.files_printed > 0 {
                self.wtr.write_all(b"\n")?;
            }
            self.write_path(&result.path)?;
            self.wtr.write_all(b"\n")?;
        } else if self.options.context && self.files_printed > 0 {
            self.write_separator()?;
        }
        self.files_printed += 1;

        let mut last = None;
        for (number, line) in merge_lines(&result.records) {
            if self.options.context && last.is_some_and(|prev: u64| number > prev + 1) {
                self.write_separator()?;
            }
            match line {
                Line::Match(record) => self.write_match(&result.path, record)?,
                Line::Context(context) => self.write_context(&result.path, context)?,
            }
            last = Some(number);
        }
        Ok(())
    }

    fn write_match(&mut self, path: &Path, record: &MatchRecord) -> io::Result<()> {
        if self.is_too_long(&record.line) {
            self.write_prefix(path, record.line_number, Some(record.column), b':')?;
            return writeln!(
                self.wtr,
                "[Omitted long line with {} matches]",
                record.spans.len()
            );
        }

        if self.options.vimgrep {
            if record.spans.is_empty() {
                self.write_prefix(path, record.line_number, Some(record.column), b':')?;
                self.write_line(&record.line, &[])?;
            }
            for span in &record.spans {
                self.write_prefix(path, record.line_number, Some(span.start as u64 + 1), b':')?;
                self.write_line(&record.line, &record.spans)?;
            }
        } else if self.options.only_matching {
            for span in &record.spans {
                self.write_prefix(path, record.line_number, Some(span.start as u64 + 1), b':')?;
                let part = &record.line[span.start..span.end];
                self.write_line(part, &[Span::new(0, part.len())])?;
            }
        } else {
            self.write_prefix(path, record.line_number, Some(record.column), b':')?;
            self.write_line(&record.line, &record.spans)?;
        }
        Ok(())
    }

    fn write_context(&mut self, path: &Path, context: &ContextLine) -> io::Result<()> {
        if self.options.only_matching {
            return Ok(());
        }
        self.write_prefix(path, context.line_number, None, b'-')?;
        if self.is_too_long(&context.line) {
            return writeln!(self.wtr, "[Omitted long context line]");
        }
        self.write_line(&context.line, &[])
    }

    fn write_prefix(
        &mut self,
        path: &Path,
        line_number: u64,
        column: Option<u64>,
        sep: u8,
    ) -> io::Result<()> {
        if self.options.with_filename && !self.options.heading {
            self.write_path(path)?;
            self.write_field_end(sep)?;
        }
        if self.options.line_number {
            if self.options.color {
                write!(self.wtr, "{}", self.options.colors.line.paint(&line_number.to_string()))?;
            } else {
                write!(self.wtr, "{line_number}")?;
            }
            self.wtr.write_all(&[sep])?;
        }
        if let Some(column) = column.filter(|_| self.options.column) {
            if self.options.color {
                write!(self.wtr, "{}", self.options.colors.column.paint(&column.to_string()))?;
            } else {
                write!(self.wtr, "{column}")?;
            }
            self.wtr.write_all(&[sep])?;
        }
        Ok(())
    }

    fn write_line(&mut self, line: &[u8], spans: &[Span]) -> io::Result<()> {
        if !self.options.color || spans.is_empty() {
            self.wtr.write_all(line)?;
            return self.wtr.write_all(b"\n");
        }
        let mut pos = 0;
        for span in spans.iter().filter(|s| !s.is_empty()) {
            self.wtr.write_all(&line[pos..span.start])?;
            let text = String::from_utf8_lossy(&line[span.start..span.end]);
            write!(self.wtr, "{}", self.options.colors.matched.paint(&text))?;
            pos = span.end;
        }
        self.wtr.write_all(&line[pos..])?;
        self.wtr.write_all(b"\n")
    }

    fn write_path(&mut self, path: &Path) -> io::Result<()> {
        let bytes = path_bytes(path, self.options.path_separator);
        if self.options.color {
            let text = String::from_utf8_lossy(&bytes);
            write!(self.wtr, "{}", self.options.colors.path.paint(&text))
        } else {
            self.wtr.write_all(&bytes)
        }
    }

    /// `--null` replaces the separator that follows a file name.
    fn write_field_end(&mut self, sep: u8) -> io::Result<()> {
        let end = if self.options.null { 0 } else { sep };
        self.wtr.write_all(&[end])
    }

    fn write_path_line(&mut self, path: &Path) -> io::Result<()> {
        self.write_path(path)?;
        self.write_field_end(b'\n')
    }

    fn write_separator(&mut self) -> io::Result<()> {
        self.wtr.write_all(&self.options.context_separator)?;
        self.wtr.write_all(b"\n")
    }

    fn is_too_long(&self, line: &[u8]) -> bool {
        self.options.max_columns.is_some_and(|max| line.len() > max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{search_bytes, ScanOptions};
    use crate::search::matcher::{Matcher, MatcherOptions};
    use std::path::PathBuf;
    use std::sync::Arc;

    fn outcome(path: &str, text: &str, pattern: &str, scan: ScanOptions) -> FileOutcome {
        let matcher = Matcher::new(&[pattern.to_string()], &MatcherOptions::default()).unwrap();
        FileOutcome::Searched(search_bytes(
            Arc::from(Path::new(path)),
            text.as_bytes(),
            &matcher,
            &ScanOptions {
                collect: true,
                ..scan
            },
        ))
    }

    fn render(options: PrinterOptions, outcomes: &[FileOutcome]) -> String {
        let mut printer = Printer::new(Vec::new(), options);
        for outcome in outcomes {
            printer.print(outcome).unwrap();
        }
        String::from_utf8(printer.into_inner()).unwrap()
    }

    fn standard() -> PrinterOptions {
        PrinterOptions {
            with_filename: true,
            line_number: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_standard_lines() {
        let outcomes = [
            outcome("a.txt", "foo\nbar\n", "foo", ScanOptions::default()),
            outcome("b.txt", "bar\nfoo\n", "foo", ScanOptions::default()),
        ];
        assert_eq!(render(standard(), &outcomes), "a.txt:1:foo\nb.txt:2:foo\n");
    }

    #[test]
    fn test_heading_layout() {
        let options = PrinterOptions {
            heading: true,
            ..standard()
        };
        let outcomes = [
            outcome("a.txt", "foo\n", "foo", ScanOptions::default()),
            outcome("b.txt", "foo\n", "foo", ScanOptions::default()),
        ];
        assert_eq!(render(options, &outcomes), "a.txt\n1:foo\n\nb.txt\n1:foo\n");
    }

    #[test]
    fn test_context_merging_and_separators() {
        let options = PrinterOptions {
            context: true,
            ..standard()
        };
        let scan = ScanOptions {
            before_context: 1,
            after_context: 1,
            ..Default::default()
        };
        let text = "a\nhit\nb\nhit\nc\nd\ne\nhit\n";
        let rendered = render(options, &[outcome("f", text, "hit", scan)]);
        assert_eq!(
            rendered,
            "f-1-a\nf:2:hit\nf-3-b\nf:4:hit\nf-5-c\n--\nf-7-e\nf:8:hit\n"
        );
    }

    #[test]
    fn test_column_and_vimgrep() {
        let options = PrinterOptions {
            column: true,
            ..standard()
        };
        let rendered = render(options, &[outcome("f", "xfoo foo\n", "foo", ScanOptions::default())]);
        assert_eq!(rendered, "f:1:2:xfoo foo\n");

        let options = PrinterOptions {
            column: true,
            vimgrep: true,
            ..standard()
        };
        let rendered = render(options, &[outcome("f", "xfoo foo\n", "foo", ScanOptions::default())]);
        assert_eq!(rendered, "f:1:2:xfoo foo\nf:1:6:xfoo foo\n");
    }

    #[test]
    fn test_only_matching() {
        let options = PrinterOptions {
            only_matching: true,
            ..standard()
        };
        let rendered = render(options, &[outcome("f", "a1 b22\n", "[0-9]+", ScanOptions::default())]);
        assert_eq!(rendered, "f:1:1\nf:1:22\n");
    }

    #[test]
    fn test_count_and_file_lists() {
        let outcomes = [
            outcome("a", "foo\nfoo\n", "foo", ScanOptions::default()),
            outcome("b", "bar\n", "foo", ScanOptions::default()),
        ];
        let count = PrinterOptions {
            mode: OutputMode::Count,
            ..standard()
        };
        assert_eq!(render(count, &outcomes), "a:2\n");

        let with = PrinterOptions {
            mode: OutputMode::FilesWithMatches,
            ..standard()
        };
        assert_eq!(render(with, &outcomes), "a\n");

        let without = PrinterOptions {
            mode: OutputMode::FilesWithoutMatch,
            null: true,
            ..standard()
        };
        assert_eq!(render(without, &outcomes), "b\0");
    }

    #[test]
    fn test_max_columns() {
        let options = PrinterOptions {
            max_columns: Some(5),
            ..standard()
        };
        let rendered = render(options, &[outcome("f", "foo and foo\nfoo\n", "foo", ScanOptions::default())]);
        assert_eq!(rendered, "f:1:[Omitted long line with 2 matches]\nf:2:foo\n");
    }

    #[test]
    fn test_failed_and_binary_print_nothing() {
        let outcomes = [
            FileOutcome::Binary(PathBuf::from("x.bin")),
            FileOutcome::Failed(PathBuf::from("y")),
            FileOutcome::Cancelled(PathBuf::from("z")),
        ];
        let mut printer = Printer::new(Vec::new(), standard());
        for outcome in &outcomes {
            printer.print(outcome).unwrap();
        }
        assert!(!printer.matched());
        assert!(printer.into_inner().is_empty());
    }

    #[test]
    fn test_replace_and_path_separator() {
        let options = PrinterOptions {
            path_separator: Some(b'\\'),
            ..standard()
        };
        let scan = ScanOptions {
            replace: Some(b"[$0]".to_vec()),
            ..Default::default()
        };
        let rendered = render(options, &[outcome("dir/f.txt", "a foo b\nbar\n", "foo", scan)]);
        assert_eq!(rendered, "dir\\f.txt:1:a [foo] b\n");
    }

    #[test]
    fn test_color_specs_change_styles() {
        colored::control::set_override(true);
        let options = PrinterOptions {
            color: true,
            colors: crate::output::ColorSpecs::parse(&["match:none", "line:none"]).unwrap(),
            line_number: true,
            ..Default::default()
        };
        let rendered = render(options, &[outcome("f", "a foo b\n", "foo", ScanOptions::default())]);
        assert_eq!(rendered, "1:a foo b\n");
    }

    #[test]
    fn test_color_highlights_matches() {
        colored::control::set_override(true);
        let options = PrinterOptions {
            color: true,
            ..Default::default()
        };
        let rendered = render(options, &[outcome("f", "a foo b\n", "foo", ScanOptions::default())]);
        assert!(rendered.starts_with("a "));
        assert!(rendered.contains("\u{1b}["));
        assert!(rendered.ends_with(" b\n"));
    }
}
