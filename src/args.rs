//! Resolution of command-line flags and config-file defaults into the
//! immutable [`SearchConfig`] shared by every thread.
use crate::cli::{Cli, ColorChoice};
use crate::config::Config;
use crate::error::{Result, SeekrError};
use crate::file_types::FileTypeCatalog;
use crate::output::{ColorSpecs, OutputMode, PrinterOptions};
use crate::processor::ScanOptions;
use crate::rules::IgnoreOptions;
use crate::search::matcher::{CaseMode, MatcherOptions};
use crate::search::source::{MmapConfig, DEFAULT_MMAP_THRESHOLD};
use crate::walker::{WalkOptions, STDIN_PATH};
use is_terminal::IsTerminal;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Upper bound for the automatic worker count.
const MAX_DEFAULT_THREADS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    #[default]
    Search,
    /// `--files`: list the files a search would open.
    Files,
    TypeList,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub command: Command,
    pub patterns: Vec<String>,
    pub paths: Vec<PathBuf>,
    pub matcher: MatcherOptions,
    pub scan: ScanOptions,
    pub threads: usize,
    pub mmap: MmapConfig,
    pub walk: WalkOptions,
    pub printer: PrinterOptions,
    pub types: FileTypeCatalog,
    pub stats: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            command: Command::Search,
            patterns: Vec::new(),
            paths: Vec::new(),
            matcher: MatcherOptions::default(),
            scan: ScanOptions::default(),
            threads: 1,
            mmap: MmapConfig::default(),
            walk: WalkOptions::default(),
            printer: PrinterOptions::default(),
            types: FileTypeCatalog::default(),
            stats: false,
        }
    }
}

/// Facts about the process environment that influence defaults.
#[derive(Debug, Clone)]
pub struct Environment {
    pub cwd: PathBuf,
    pub stdout_is_tty: bool,
    pub dumb_terminal: bool,
}

impl Environment {
    pub fn detect() -> Result<Self> {
        Ok(Self {
            cwd: std::env::current_dir()?,
            stdout_is_tty: std::io::stdout().is_terminal(),
            dumb_terminal: std::env::var_os("TERM").is_some_and(|t| t == "dumb"),
        })
    }
}

impl SearchConfig {
    pub fn from_cli(cli: &Cli, file: &Config, env: &Environment) -> Result<Self> {
        let command = if cli.type_list {
            Command::TypeList
        } else if cli.files {
            Command::Files
        } else {
            Command::Search
        };

        let explicit_patterns = !cli.regexp.is_empty() || !cli.pattern_files.is_empty();
        let mut paths = Vec::new();
        let mut patterns = Vec::new();
        if explicit_patterns || command != Command::Search {
            paths.extend(cli.pattern.iter().map(PathBuf::from));
            patterns.extend(cli.regexp.iter().cloned());
            for file in &cli.pattern_files {
                patterns.extend(read_pattern_file(file)?);
            }
        } else {
            match &cli.pattern {
                Some(pattern) => patterns.push(pattern.clone()),
                None => {
                    return Err(SeekrError::Config(
                        "no pattern given; pass PATTERN, -e PATTERN or -f FILE".to_string(),
                    ))
                }
            }
        }
        paths.extend(cli.paths.iter().cloned());

        let mode = output_mode(cli);
        let matcher = MatcherOptions {
            fixed_strings: cli.fixed_strings,
            case: if cli.case_sensitive {
                CaseMode::Sensitive
            } else if cli.ignore_case {
                CaseMode::Insensitive
            } else if cli.smart_case || file.search.smart_case {
                CaseMode::Smart
            } else {
                CaseMode::Sensitive
            },
            word: cli.word_regexp,
            line: cli.line_regexp,
            size_limit: cli.regex_size_limit.as_deref().map(parse_size).transpose()?.map(to_usize),
            dfa_size_limit: cli.dfa_size_limit.as_deref().map(parse_size).transpose()?.map(to_usize),
        };

        let (before, after) = if mode.needs_records() {
            (
                cli.before_context.or(cli.context).unwrap_or(0),
                cli.after_context.or(cli.context).unwrap_or(0),
            )
        } else {
            (0, 0)
        };
        let max_count = if mode.stops_at_first_match() {
            Some(cli.max_count.map_or(1, |m| m.min(1)))
        } else {
            cli.max_count
        };
        let scan = ScanOptions {
            invert: cli.invert_match,
            max_count,
            before_context: before,
            after_context: after,
            text: cli.text || cli.unrestricted >= 3,
            collect: mode.needs_records(),
            replace: cli.replace.clone().map(String::into_bytes),
            search_zip: cli.search_zip,
            encoding: cli.encoding.as_deref().map(parse_encoding).transpose()?.flatten(),
        };

        let threads = if cli.sort_files {
            1
        } else {
            cli.threads
                .or(file.search.threads)
                .filter(|&n| n > 0)
                .unwrap_or_else(default_threads)
        };

        let mmap = MmapConfig {
            enabled: if cli.no_mmap {
                false
            } else {
                cli.mmap || file.search.mmap.unwrap_or(true)
            },
            min_file_size: file.search.mmap_threshold.unwrap_or(DEFAULT_MMAP_THRESHOLD),
        };

        let ignore = IgnoreOptions {
            no_ignore: cli.no_ignore || cli.unrestricted >= 1,
            no_ignore_parent: cli.no_ignore_parent,
            no_ignore_vcs: cli.no_ignore_vcs,
            ignore_files: file
                .ignore
                .files
                .iter()
                .chain(cli.ignore_files.iter())
                .cloned()
                .collect(),
            globs: file
                .ignore
                .globs
                .iter()
                .chain(cli.globs.iter())
                .map(|g| (g.clone(), false))
                .chain(cli.iglobs.iter().map(|g| (g.clone(), true)))
                .collect(),
        };
        let rules = ignore.base_rules(&env.cwd)?;

        let mut types = FileTypeCatalog::with_defaults();
        for name in file.types.clear.iter().chain(cli.type_clear.iter()) {
            types.clear(name);
        }
        for def in file.types.add.iter().chain(cli.type_add.iter()) {
            types.add(def)?;
        }
        let type_filter = types.filter(&cli.types, &cli.types_not)?;

        let walk = WalkOptions {
            max_depth: cli.maxdepth,
            follow_links: cli.follow || file.search.follow,
            hidden: cli.hidden || cli.unrestricted >= 2 || file.search.hidden,
            max_filesize: cli.max_filesize.as_deref().map(parse_size).transpose()?,
            ignore,
            rules,
            types: type_filter,
        };

        let printer = printer_options(cli, file, env, &paths, mode, before + after > 0)?;

        let config = SearchConfig {
            command,
            patterns,
            paths,
            matcher,
            scan,
            threads,
            mmap,
            walk,
            printer,
            types,
            stats: cli.stats,
        };
        debug!(
            "resolved configuration: {} pattern(s), {} thread(s), mode {:?}",
            config.patterns.len(),
            config.threads,
            config.printer.mode
        );
        Ok(config)
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.quiet {
        OutputMode::Quiet
    } else if cli.json {
        OutputMode::Json
    } else if cli.files_with_matches {
        OutputMode::FilesWithMatches
    } else if cli.files_without_match {
        OutputMode::FilesWithoutMatch
    } else if cli.count && !cli.vimgrep {
        OutputMode::Count
    } else {
        OutputMode::Standard
    }
}

fn printer_options(
    cli: &Cli,
    file: &Config,
    env: &Environment,
    paths: &[PathBuf],
    mode: OutputMode,
    context: bool,
) -> Result<PrinterOptions> {
    let tty = env.stdout_is_tty;

    let color = match cli.color {
        Some(choice) => choice,
        None if cli.pretty => ColorChoice::Always,
        None if cli.vimgrep => ColorChoice::Never,
        None => file.display.color.unwrap_or_default(),
    };
    let color = match color {
        ColorChoice::Never => false,
        ColorChoice::Always | ColorChoice::Ansi => true,
        ColorChoice::Auto => tty && !env.dumb_terminal,
    };

    let heading = if cli.vimgrep {
        false
    } else if cli.heading {
        true
    } else if cli.no_heading {
        false
    } else if cli.pretty {
        true
    } else {
        file.display.heading.unwrap_or(tty)
    };

    let with_filename = if cli.vimgrep || cli.with_filename {
        true
    } else if cli.no_filename {
        false
    } else {
        searches_many_files(paths)
    };

    let line_number = if cli.line_number {
        true
    } else if cli.no_line_number {
        false
    } else {
        cli.pretty || cli.vimgrep || cli.column || tty
    };

    let max_columns = cli
        .max_columns
        .or(file.search.max_columns)
        .filter(|&n| n > 0);

    let context_separator = cli
        .context_separator
        .clone()
        .or_else(|| file.display.context_separator.clone())
        .unwrap_or_else(|| "--".to_string())
        .into_bytes();

    let colors = ColorSpecs::parse(
        &file
            .display
            .colors
            .iter()
            .chain(cli.colors.iter())
            .collect::<Vec<_>>(),
    )?;

    Ok(PrinterOptions {
        mode,
        heading,
        with_filename,
        line_number,
        column: cli.column || cli.vimgrep,
        color,
        context,
        context_separator,
        only_matching: cli.only_matching,
        vimgrep: cli.vimgrep,
        null: cli.null,
        max_columns,
        colors,
        path_separator: cli.path_separator.as_deref().map(parse_path_separator).transpose()?.flatten(),
    })
}

/// `--path-separator` takes a single byte; an empty value keeps the
/// platform separator.
fn parse_path_separator(text: &str) -> Result<Option<u8>> {
    match text.as_bytes() {
        [] => Ok(None),
        [byte] => Ok(Some(*byte)),
        _ => Err(SeekrError::Config(format!(
            "path separator '{text}' must be exactly one byte"
        ))),
    }
}

/// `auto` keeps byte-order-mark sniffing; anything else must be a label
/// known to the WHATWG encoding standard.
fn parse_encoding(label: &str) -> Result<Option<&'static encoding_rs::Encoding>> {
    if label.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    encoding_rs::Encoding::for_label(label.as_bytes())
        .map(Some)
        .ok_or_else(|| SeekrError::Config(format!("unknown encoding '{label}'")))
}

/// No path means the current directory, which counts as many files.
fn searches_many_files(paths: &[PathBuf]) -> bool {
    match paths {
        [] => true,
        [single] => single.as_os_str() != STDIN_PATH && single.is_dir(),
        _ => true,
    }
}

fn default_threads() -> usize {
    num_cpus::get().clamp(1, MAX_DEFAULT_THREADS)
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Parses `NUM[K|M|G]` with binary multipliers.
pub fn parse_size(text: &str) -> Result<u64> {
    let text = text.trim();
    let (digits, shift) = match text.char_indices().last() {
        Some((i, 'K' | 'k')) => (&text[..i], 10),
        Some((i, 'M' | 'm')) => (&text[..i], 20),
        Some((i, 'G' | 'g')) => (&text[..i], 30),
        _ => (text, 0),
    };
    let value: u64 = digits
        .parse()
        .map_err(|_| SeekrError::Config(format!("invalid size '{text}', expected NUM[K|M|G]")))?;
    value
        .checked_mul(1u64 << shift)
        .ok_or_else(|| SeekrError::Config(format!("size '{text}' is too large")))
}

fn read_pattern_file(path: &Path) -> Result<Vec<String>> {
    let content = if path.as_os_str() == STDIN_PATH {
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin().lock(), &mut buf)?;
        buf
    } else {
        fs::read_to_string(path).map_err(|e| SeekrError::file(path, e))?
    };
    Ok(content
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect())
}
