use std::path::PathBuf;

/// Errors that abort the rewrite of a single file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input (or a file read for it) is not syntactically valid.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A required structural element is missing.
    #[error("pattern not found: {0}")]
    PatternNotFound(String),

    /// The wrapper factory was called with more than two arguments.
    #[error("arity exceeds 2: wrapper factory called with {0} arguments")]
    ArityViolation(usize),

    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// A rewrite step produced text that no longer parses.
    #[error("rewrite step `{step}` produced invalid source: {message}")]
    InvalidRewrite { step: &'static str, message: String },

    #[error("overlapping edits at bytes {first:?} and {second:?}")]
    OverlappingEdits {
        first: std::ops::Range<usize>,
        second: std::ops::Range<usize>,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Error::PatternNotFound(what.into())
    }

    pub(crate) fn unsupported(what: impl Into<String>) -> Self {
        Error::UnsupportedShape(what.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
