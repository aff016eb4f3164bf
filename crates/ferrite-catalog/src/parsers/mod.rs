//! Plain-text parsers for component catalogues.
//!
//! Supported formats:
//! - [`.csv`](csv): comma-separated spreadsheet exports

pub mod csv;

use thiserror::Error;

/// Errors during catalogue file parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    FormatError { line: usize, message: String },
}

/// One data row with the line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    /// One-based line number in the source file.
    pub line: usize,
    /// Raw cells, trimmed, in column order.
    pub cells: Vec<String>,
}

impl AsRef<[String]> for CatalogRow {
    fn as_ref(&self) -> &[String] {
        &self.cells
    }
}
