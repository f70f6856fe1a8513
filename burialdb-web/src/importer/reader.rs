//! Row readers for delimited text and spreadsheets
//!
//! Both readers feed raw rows into a [`RowCollector`], which skips blank
//! rows, peels off header rows and splits numbering cells from data cells.

use super::ImportError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveTime;
use serde::Serialize;
use std::io::Cursor;

/// How to split a file into header, numbering and data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Leading non-blank rows treated as header
    pub header: usize,
    /// Leading cells of each body row holding the source numbering
    pub numbering: usize,
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            header: 1,
            numbering: 0,
            delimiter: b',',
            quote: b'"',
        }
    }
}

/// One body row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedRow {
    pub numbering: Vec<String>,
    pub data: Vec<String>,
}

/// Parsed content of an import file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedImport {
    pub header: Vec<Vec<String>>,
    pub rows: Vec<ParsedRow>,
    /// Widest data row seen
    pub data_cols: usize,
}

/// A row is blank when every cell is empty or whitespace
pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

struct RowCollector {
    numbering: usize,
    header_left: usize,
    parsed: ParsedImport,
}

impl RowCollector {
    fn new(options: &ReaderOptions) -> Self {
        Self {
            numbering: options.numbering,
            header_left: options.header,
            parsed: ParsedImport::default(),
        }
    }

    fn push(&mut self, mut row: Vec<String>) {
        if is_blank_row(&row) {
            return;
        }

        if self.header_left > 0 {
            self.header_left -= 1;
            self.parsed.header.push(row);
            return;
        }

        let split = self.numbering.min(row.len());
        let data = row.split_off(split);
        self.parsed.data_cols = self.parsed.data_cols.max(data.len());
        self.parsed.rows.push(ParsedRow {
            numbering: row,
            data,
        });
    }

    fn finish(self) -> ParsedImport {
        self.parsed
    }
}

/// Parse decoded delimited text
pub fn parse_delimited(text: &str, options: &ReaderOptions) -> Result<ParsedImport, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .quote(options.quote)
        .from_reader(text.as_bytes());

    let mut collector = RowCollector::new(options);
    for record in reader.records() {
        let record = record?;
        collector.push(record.iter().map(str::to_string).collect());
    }

    Ok(collector.finish())
}

/// Parse the first sheet of a workbook
///
/// Rows and columns are counted from the first used cell of the sheet, so
/// an empty column A does not produce an empty data column.
pub fn parse_spreadsheet(bytes: Vec<u8>, options: &ReaderOptions) -> Result<ParsedImport, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::Spreadsheet("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ImportError::Spreadsheet(e.to_string()))?;

    let mut collector = RowCollector::new(options);
    for row in range.rows() {
        collector.push(row.iter().map(cell_text).collect());
    }

    Ok(collector.finish())
}

/// Render a cell the way it reads in the sheet; whole floats lose the `.0`
///
/// Date cells become `YYYY-MM-DD` (with the time appended when it is not
/// midnight) instead of their Excel serial number.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Int(i) => i.to_string(),
        Data::DateTime(dt) if dt.is_datetime() => match dt.as_datetime() {
            Some(dt) if dt.time() == NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        other => other.to_string(),
    }
}
