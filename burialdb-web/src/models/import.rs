//! Import jobs

use crate::importer::ReaderOptions;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

/// One uploaded file and how to parse it
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Import {
    pub id: i64,
    pub name: String,
    /// Stored file, relative to the media folder
    pub file_path: String,
    pub original_filename: String,
    /// Cemetery assigned to every imported person
    pub cemetery: Option<i64>,
    /// Number of leading non-blank rows treated as header
    pub header: i64,
    /// Number of leading cells of each row holding the source numbering
    pub numbering: i64,
    pub delimiter: String,
    pub quotechar: String,
    /// True once rows have been materialized
    pub data_added: bool,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of an import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Pending,
    DataAdded,
}

impl Import {
    pub fn state(&self) -> ImportState {
        if self.data_added {
            ImportState::DataAdded
        } else {
            ImportState::Pending
        }
    }

    pub fn reader_options(&self) -> ReaderOptions {
        let defaults = ReaderOptions::default();
        ReaderOptions {
            header: usize::try_from(self.header).unwrap_or(0),
            numbering: usize::try_from(self.numbering).unwrap_or(0),
            delimiter: single_byte(&self.delimiter).unwrap_or(defaults.delimiter),
            quote: single_byte(&self.quotechar).unwrap_or(defaults.quote),
        }
    }
}

/// Default display name: `import-YYYYMMDDHHMMSS` in local time
pub fn default_import_name() -> String {
    format!("import-{}", Local::now().format("%Y%m%d%H%M%S"))
}

fn single_byte(value: &str) -> Option<u8> {
    match value.as_bytes() {
        [b] if b.is_ascii() => Some(*b),
        _ => None,
    }
}

fn default_header() -> i64 {
    1
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_quotechar() -> String {
    "\"".to_string()
}

/// Parse settings of an import, as submitted on create or edit
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportSettings {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cemetery: Option<i64>,
    #[serde(default = "default_header")]
    pub header: i64,
    #[serde(default)]
    pub numbering: i64,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_quotechar")]
    pub quotechar: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            name: None,
            cemetery: None,
            header: default_header(),
            numbering: 0,
            delimiter: default_delimiter(),
            quotechar: default_quotechar(),
        }
    }
}

impl ImportSettings {
    /// Build settings from multipart text fields; absent or blank fields
    /// keep their defaults
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, String> {
        let mut settings = ImportSettings::default();
        let field = |key: &str| fields.get(key).map(|v| v.as_str()).filter(|v| !v.is_empty());

        if let Some(name) = field("name") {
            settings.name = Some(name.to_string());
        }
        if let Some(cemetery) = field("cemetery") {
            settings.cemetery = Some(parse_int("cemetery", cemetery)?);
        }
        if let Some(header) = field("header") {
            settings.header = parse_int("header", header)?;
        }
        if let Some(numbering) = field("numbering") {
            settings.numbering = parse_int("numbering", numbering)?;
        }
        if let Some(delimiter) = field("delimiter") {
            settings.delimiter = delimiter.to_string();
        }
        if let Some(quotechar) = field("quotechar") {
            settings.quotechar = quotechar.to_string();
        }

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.header < 0 {
            return Err("header must not be negative".to_string());
        }
        if self.numbering < 0 {
            return Err("numbering must not be negative".to_string());
        }
        if single_byte(&self.delimiter).is_none() {
            return Err("delimiter must be a single ASCII character".to_string());
        }
        if single_byte(&self.quotechar).is_none() {
            return Err("quotechar must be a single ASCII character".to_string());
        }
        if self.delimiter == self.quotechar {
            return Err("delimiter and quotechar must differ".to_string());
        }
        Ok(())
    }

    /// Submitted name, or a fresh default name when blank
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_import_name)
    }
}

fn parse_int(field: &str, value: &str) -> Result<i64, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{} must be an integer", field))
}
