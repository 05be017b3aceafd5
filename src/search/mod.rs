//! Pattern matching, file reading and the parallel search pipeline.
pub mod engine;
pub mod matcher;
pub mod source;

pub use engine::{SearchEngine, SearchSummary};
pub use matcher::{CaseMode, Matcher, MatcherOptions, Span};
pub use source::{ByteSource, MmapConfig};
