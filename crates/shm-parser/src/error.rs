//! Error types for coefficient file parsing.

use thiserror::Error;

/// Result type for coefficient file operations.
pub type ShmResult<T> = Result<T, ShmError>;

/// Error types for coefficient file parsing.
#[derive(Error, Debug)]
pub enum ShmError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid UTF-8 text
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A data line could not be parsed
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Order larger than degree, or otherwise impossible index
    #[error("Invalid coefficient index at line {line}: degree {degree}, order {order}")]
    InvalidIndex {
        line: usize,
        degree: usize,
        order: usize,
    },

    /// The same (degree, order) appears twice
    #[error("Duplicate coefficient at line {line}: degree {degree}, order {order}")]
    Duplicate {
        line: usize,
        degree: usize,
        order: usize,
    },

    /// No coefficient records were found
    #[error("No coefficients found in {0}")]
    Empty(String),

    /// Header declares something inconsistent with the data
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ShmError {
    /// Create a Parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
