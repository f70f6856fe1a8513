//! Import pipeline
//!
//! Reads an uploaded file (CSV/TSV text or a workbook), maps its columns to
//! person fields and materializes the rows as persons linked to the import
//! until it is applied or undone.

pub mod encoding;
pub mod format;
pub mod lifecycle;
pub mod mapping;
pub mod reader;

pub use format::{detect_format, SourceFormat};
pub use lifecycle::{ActionOutcome, ImportAction, MaterializeSummary};
pub use mapping::{mappable_columns, ColumnMapping, MappingError};
pub use reader::{ParsedImport, ParsedRow, ReaderOptions};

use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Unrecoverable problems reading an import file
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Don't know how to read {file} (detected type {mime})")]
    UnsupportedFormat { file: String, mime: String },

    #[error("Cannot determine the text encoding, or the file is binary")]
    UndetectableEncoding,

    #[error("Malformed delimited text: {0}")]
    Delimited(#[from] csv::Error),

    #[error("Unreadable spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Cannot read import file: {0}")]
    Io(#[from] std::io::Error),
}

/// Read and parse a stored import file
///
/// Blocking; call from `spawn_blocking` in async contexts.
pub fn read_import(path: &Path, options: &ReaderOptions) -> Result<ParsedImport, ImportError> {
    let bytes = std::fs::read(path)?;

    match detect_format(path, &bytes)? {
        SourceFormat::Delimited => {
            let (text, encoding) = encoding::decode_text(&bytes)?;
            debug!(file = %path.display(), encoding = encoding.name(), "Decoded import text");
            reader::parse_delimited(&text, options)
        }
        SourceFormat::Spreadsheet => reader::parse_spreadsheet(bytes, options),
    }
}
