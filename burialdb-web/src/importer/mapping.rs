//! Column mapping and cell translation
//!
//! A mapping assigns data columns of a parsed file to person columns. Cells
//! are translated leniently: anything that does not parse for the target
//! kind becomes NULL rather than failing the import.

use burialdb_common::db::fields::{field_columns, find_column, FieldColumn, FieldKind};
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{Fate, FieldValue};

/// Date layouts accepted in import files, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Person columns a data column may be mapped to
///
/// The cemetery pair is excluded: imported persons take the cemetery of
/// the import.
pub fn mappable_columns() -> impl Iterator<Item = FieldColumn> {
    field_columns().filter(|c| c.kind != FieldKind::Cemetery)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Column {index}: unknown field '{field}'")]
    UnknownField { index: usize, field: String },

    #[error("Column {index}: field '{field}' cannot be imported")]
    NotMappable { index: usize, field: String },

    #[error("Mapping covers {given} columns but the file has {available}")]
    TooManyColumns { given: usize, available: usize },

    #[error("No column is mapped to a field")]
    Empty,
}

/// Validated assignment of data column indexes to person columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    assignments: Vec<(FieldColumn, usize)>,
}

impl ColumnMapping {
    /// Build a mapping from one optional field name per data column
    ///
    /// Blank entries leave the column unmapped. When two columns name the
    /// same field the first one wins.
    pub fn from_columns(columns: &[Option<String>], data_cols: usize) -> Result<Self, MappingError> {
        if columns.len() > data_cols {
            return Err(MappingError::TooManyColumns {
                given: columns.len(),
                available: data_cols,
            });
        }

        let mut seen = HashSet::new();
        let mut assignments = Vec::new();

        for (index, target) in columns.iter().enumerate() {
            let Some(name) = target.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
                continue;
            };

            let column = find_column(name).ok_or_else(|| MappingError::UnknownField {
                index,
                field: name.to_string(),
            })?;
            if column.kind == FieldKind::Cemetery {
                return Err(MappingError::NotMappable {
                    index,
                    field: name.to_string(),
                });
            }

            if seen.insert(column.column) {
                assignments.push((column, index));
            }
        }

        if assignments.is_empty() {
            return Err(MappingError::Empty);
        }

        Ok(Self { assignments })
    }

    /// (target column, data column index) pairs in submission order
    pub fn assignments(&self) -> &[(FieldColumn, usize)] {
        &self.assignments
    }
}

/// Result of translating one cell
#[derive(Debug, Clone, PartialEq)]
pub enum Translated {
    Value(FieldValue),
    /// Hospital name still to be resolved against the database
    HospitalName(String),
}

/// Translate a raw cell for a column of `kind`; `None` stores NULL
pub fn translate_cell(kind: FieldKind, raw: &str) -> Option<Translated> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match kind {
        FieldKind::Text => FieldValue::text(raw).map(Translated::Value),
        FieldKind::Date => parse_lenient_date(raw).map(|d| Translated::Value(FieldValue::Date(d))),
        FieldKind::Fate => Fate::parse(raw).map(|f| Translated::Value(FieldValue::Fate(f))),
        FieldKind::Hospital => Some(Translated::HospitalName(raw.to_string())),
        FieldKind::Cemetery => None,
    }
}

/// Parse a date in any accepted layout; a bare four-digit year means
/// January 1st of that year
pub fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = raw.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}
