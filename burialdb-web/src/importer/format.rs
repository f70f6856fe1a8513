//! Source file format detection

use super::ImportError;
use serde::Serialize;
use std::path::Path;

/// Parser family for an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// CSV, TSV or other delimited text
    Delimited,
    /// Excel or OpenDocument workbook
    Spreadsheet,
}

const DELIMITED_MIME: &[&str] = &[
    "text/csv",
    "text/plain",
    "text/tab-separated-values",
    "application/csv",
];

const SPREADSHEET_MIME: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.oasis.opendocument.spreadsheet",
];

fn classify(mime: &str) -> Option<SourceFormat> {
    if DELIMITED_MIME.contains(&mime) {
        Some(SourceFormat::Delimited)
    } else if SPREADSHEET_MIME.contains(&mime) {
        Some(SourceFormat::Spreadsheet)
    } else {
        None
    }
}

/// Pick a parser from the file extension, falling back to magic bytes
pub fn detect_format(path: &Path, content: &[u8]) -> Result<SourceFormat, ImportError> {
    let guessed = mime_guess::from_path(path).first();
    if let Some(format) = guessed.as_ref().and_then(|m| classify(m.essence_str())) {
        return Ok(format);
    }

    let sniffed = infer::get(content);
    if let Some(format) = sniffed.and_then(|kind| classify(kind.mime_type())) {
        return Ok(format);
    }

    let mime = guessed
        .map(|m| m.essence_str().to_string())
        .or_else(|| sniffed.map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    Err(ImportError::UnsupportedFormat {
        file: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        mime,
    })
}
