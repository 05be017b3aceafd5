use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[clap(
    name = "seekr",
    author,
    version,
    about = "Recursively search directories for a regex pattern, respecting ignore files",
    long_about = None
)]
pub struct Cli {
    /// A regular expression used for searching. Treated as a path when -e, -f,
    /// --files or --type-list is given.
    #[clap(value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Files or directories to search. `-` reads standard input.
    #[clap(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// A pattern to search for. May be repeated.
    #[clap(short = 'e', long = "regexp", value_name = "PATTERN", allow_hyphen_values = true)]
    pub regexp: Vec<String>,

    /// Read patterns from FILE, one per line.
    #[clap(short = 'f', long = "file", value_name = "FILE")]
    pub pattern_files: Vec<PathBuf>,

    /// Print each file that would be searched, without searching.
    #[clap(long, conflicts_with = "type_list")]
    pub files: bool,

    /// Show all supported file types and their globs.
    #[clap(long)]
    pub type_list: bool,

    /// Search binary files as if they were text.
    #[clap(short = 'a', long)]
    pub text: bool,

    /// Only show the count of matching lines for each file.
    #[clap(short = 'c', long)]
    pub count: bool,

    /// When to use color.
    #[clap(long, value_enum, value_name = "WHEN")]
    pub color: Option<ColorChoice>,

    /// Treat the pattern as a literal string.
    #[clap(short = 'F', long)]
    pub fixed_strings: bool,

    /// Include or exclude files and directories matching GLOB. Precede with !
    /// to exclude.
    #[clap(short = 'g', long = "glob", value_name = "GLOB", allow_hyphen_values = true)]
    pub globs: Vec<String>,

    /// Like --glob, but case insensitive.
    #[clap(long = "iglob", value_name = "GLOB", allow_hyphen_values = true)]
    pub iglobs: Vec<String>,

    /// Search case insensitively.
    #[clap(short = 'i', long)]
    pub ignore_case: bool,

    /// Search case sensitively. Overrides -i and -S.
    #[clap(short = 's', long)]
    pub case_sensitive: bool,

    /// Search case insensitively if the pattern is all lowercase.
    #[clap(short = 'S', long)]
    pub smart_case: bool,

    /// Show line numbers.
    #[clap(short = 'n', long, overrides_with = "no_line_number")]
    pub line_number: bool,

    /// Suppress line numbers.
    #[clap(short = 'N', long, overrides_with = "line_number")]
    pub no_line_number: bool,

    /// Do not print anything; exit with status 0 on the first match.
    #[clap(short = 'q', long)]
    pub quiet: bool,

    /// Only search files matching TYPE. May be repeated.
    #[clap(short = 't', long = "type", value_name = "TYPE")]
    pub types: Vec<String>,

    /// Do not search files matching TYPE. May be repeated.
    #[clap(short = 'T', long = "type-not", value_name = "TYPE")]
    pub types_not: Vec<String>,

    /// Add a new glob for a file type: NAME:GLOB or NAME:include:TYPE.
    #[clap(long = "type-add", value_name = "TYPE_SPEC")]
    pub type_add: Vec<String>,

    /// Clear the globs of a file type.
    #[clap(long = "type-clear", value_name = "TYPE")]
    pub type_clear: Vec<String>,

    /// Reduce filtering: -u disables ignore files, -uu also searches hidden
    /// files, -uuu also searches binary files.
    #[clap(short = 'u', long = "unrestricted", action = ArgAction::Count)]
    pub unrestricted: u8,

    /// Show lines that do not match.
    #[clap(short = 'v', long)]
    pub invert_match: bool,

    /// Only show matches surrounded by word boundaries. Overrides -x.
    #[clap(short = 'w', long, overrides_with = "line_regexp")]
    pub word_regexp: bool,

    /// Only show matches spanning the whole line. Overrides -w.
    #[clap(short = 'x', long, overrides_with = "word_regexp")]
    pub line_regexp: bool,

    /// Show NUM lines after each match.
    #[clap(short = 'A', long, value_name = "NUM")]
    pub after_context: Option<usize>,

    /// Show NUM lines before each match.
    #[clap(short = 'B', long, value_name = "NUM")]
    pub before_context: Option<usize>,

    /// Show NUM lines before and after each match.
    #[clap(short = 'C', long, value_name = "NUM")]
    pub context: Option<usize>,

    /// Show the column of the first match. Implies --line-number.
    #[clap(long)]
    pub column: bool,

    /// Separator printed between non-contiguous context groups.
    #[clap(long, value_name = "SEPARATOR")]
    pub context_separator: Option<String>,

    /// Show debug messages.
    #[clap(long)]
    pub debug: bool,

    /// Write log messages to FILE instead of stderr.
    #[clap(long, value_parser, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Do not read a configuration file.
    #[clap(long)]
    pub no_config: bool,

    /// Size limit of the compiled regex, NUM[K|M|G].
    #[clap(long, value_name = "NUM+SUFFIX?")]
    pub regex_size_limit: Option<String>,

    /// Size limit of the regex DFA cache, NUM[K|M|G].
    #[clap(long, value_name = "NUM+SUFFIX?")]
    pub dfa_size_limit: Option<String>,

    /// Only print the paths of files with at least one match.
    #[clap(short = 'l', long, conflicts_with = "files_without_match")]
    pub files_with_matches: bool,

    /// Only print the paths of files without a match.
    #[clap(long)]
    pub files_without_match: bool,

    /// Show the file path for every match.
    #[clap(short = 'H', long, overrides_with = "no_filename")]
    pub with_filename: bool,

    /// Never show the file path.
    #[clap(long, overrides_with = "with_filename")]
    pub no_filename: bool,

    /// Print the file path above its matches.
    #[clap(long, overrides_with = "no_heading")]
    pub heading: bool,

    /// Print the file path on every matching line.
    #[clap(long, overrides_with = "heading")]
    pub no_heading: bool,

    /// Search hidden files and directories.
    #[clap(long)]
    pub hidden: bool,

    /// Read ignore rules from FILE. May be repeated.
    #[clap(long = "ignore-file", value_name = "FILE")]
    pub ignore_files: Vec<PathBuf>,

    /// Follow symbolic links.
    #[clap(short = 'L', long)]
    pub follow: bool,

    /// Stop searching a file after NUM matching lines.
    #[clap(short = 'm', long, value_name = "NUM")]
    pub max_count: Option<u64>,

    /// Skip files larger than NUM[K|M|G].
    #[clap(long, value_name = "NUM+SUFFIX?")]
    pub max_filesize: Option<String>,

    /// Descend at most NUM directories below each start path.
    #[clap(long, value_name = "NUM")]
    pub maxdepth: Option<usize>,

    /// Search with memory maps when possible.
    #[clap(long, overrides_with = "no_mmap")]
    pub mmap: bool,

    /// Never use memory maps.
    #[clap(long, overrides_with = "mmap")]
    pub no_mmap: bool,

    /// Suppress all error messages.
    #[clap(long)]
    pub no_messages: bool,

    /// Do not respect ignore files.
    #[clap(long)]
    pub no_ignore: bool,

    /// Do not respect ignore files in parent directories.
    #[clap(long)]
    pub no_ignore_parent: bool,

    /// Do not respect version control ignore files.
    #[clap(long)]
    pub no_ignore_vcs: bool,

    /// Follow file paths with a NUL byte instead of a newline or colon.
    #[clap(short = '0', long)]
    pub null: bool,

    /// Print only the matched parts of each line.
    #[clap(short = 'o', long, conflicts_with = "replace")]
    pub only_matching: bool,

    /// Replace every match with REPLACEMENT in the output. `$1`, `$name` and
    /// `${name}` refer to capture groups.
    #[clap(short = 'r', long, value_name = "REPLACEMENT", allow_hyphen_values = true)]
    pub replace: Option<String>,

    /// Path separator to use when printing file paths. Must be one byte.
    #[clap(long, value_name = "SEPARATOR")]
    pub path_separator: Option<String>,

    /// Color settings: TYPE:fg|bg|style:VALUE or TYPE:none, where TYPE is
    /// path, line, column or match. May be repeated.
    #[clap(long, value_name = "COLOR_SPEC")]
    pub colors: Vec<String>,

    /// Text encoding of the searched files, for example utf-16le or latin1.
    /// `auto` only decodes files that start with a byte order mark.
    #[clap(short = 'E', long, value_name = "ENCODING")]
    pub encoding: Option<String>,

    /// Search inside gzip, xz and lzma compressed files.
    #[clap(short = 'z', long)]
    pub search_zip: bool,

    /// Alias for --color always --heading --line-number.
    #[clap(short = 'p', long)]
    pub pretty: bool,

    /// Search files in sorted order on a single thread.
    #[clap(long)]
    pub sort_files: bool,

    /// Number of worker threads. 0 picks a value automatically.
    #[clap(short = 'j', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Show results in vim-compatible format, one line per match.
    #[clap(long)]
    pub vimgrep: bool,

    /// Do not print lines longer than NUM bytes.
    #[clap(short = 'M', long, value_name = "NUM")]
    pub max_columns: Option<usize>,

    /// Print results as JSON lines.
    #[clap(long, conflicts_with_all = ["count", "files_with_matches", "files_without_match", "vimgrep"])]
    pub json: bool,

    /// Print statistics about the search.
    #[clap(long)]
    pub stats: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Never,
    #[default]
    Auto,
    Always,
    Ansi,
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorChoice::Never => write!(f, "never"),
            ColorChoice::Auto => write!(f, "auto"),
            ColorChoice::Always => write!(f, "always"),
            ColorChoice::Ansi => write!(f, "ansi"),
        }
    }
}
