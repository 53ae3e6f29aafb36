use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or querying an index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Corrupt record in {} at byte {offset}: {reason}", .path.display())]
    CorruptRecord { path: PathBuf, offset: u64, reason: String },

    #[error("Partial index {} is not term-sorted: {previous:?} followed by {term:?}", .path.display())]
    UnsortedPartial { path: PathBuf, previous: String, term: String },

    #[error("Corrupt lexicon {} at line {line}: {reason}", .path.display())]
    CorruptLexicon { path: PathBuf, line: usize, reason: String },

    #[error("Corrupt document map {}: {reason}", .path.display())]
    CorruptDocMap { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, offset: u64, reason: impl ToString) -> Self {
        IndexError::CorruptRecord { path: path.into(), offset, reason: reason.to_string() }
    }
}
