use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeekrError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Regex(#[from] regex::Error),

    #[error("literal matcher error: {0}")]
    Literal(#[from] aho_corasick::BuildError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidGlob(#[source] ignore::Error),

    #[error("unrecognized file type: {0}")]
    UnknownType(String),

    #[error("{path}:{line}: {message}")]
    PatternFile {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path}: {source}")]
    FileProcessing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Walk(#[source] ignore::Error),

    #[error("An unexpected error occurred: {0}")]
    Other(String),

    #[error("{0:#}")]
    Anyhow(#[from] anyhow::Error),
}

impl SeekrError {
    /// Configuration-time errors abort the run before any traversal starts.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SeekrError::PatternFile { .. }
                | SeekrError::FileProcessing { .. }
                | SeekrError::Walk(_)
        )
    }

    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SeekrError::FileProcessing {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SeekrError>;
