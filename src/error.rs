// src/error.rs

use thiserror::Error;

/// Result type alias for metaphinder operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The sequence stream held no headers at all, so there is nothing to
    /// classify. Fatal; the binary exits with a distinct status for this.
    #[error("no sequences found: {0}")]
    Format(String),

    /// A tabular alignment record that could not be parsed.
    #[error("malformed alignment record at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// The external aligner failed to launch or returned non-zero.
    #[error("blastn failed: {0}")]
    Blast(String),
}
