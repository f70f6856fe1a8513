//! Person record: paired field values, display name and completeness status

use burialdb_common::db::fields::{find_column, FieldKind, PAIRED_FIELDS};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Display name used when neither full name column is filled
pub const UNKNOWN_NAME: &str = "Unknown";

/// Recorded fate of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fate {
    Killed,
    DiedOfWounds,
    DiedOfDisease,
    Missing,
    DiedInCaptivity,
}

impl Fate {
    pub const ALL: [Fate; 5] = [
        Fate::Killed,
        Fate::DiedOfWounds,
        Fate::DiedOfDisease,
        Fate::Missing,
        Fate::DiedInCaptivity,
    ];

    /// Numeric code used by source documents
    pub fn code(self) -> i64 {
        match self {
            Fate::Killed => 1,
            Fate::DiedOfWounds => 2,
            Fate::DiedOfDisease => 3,
            Fate::Missing => 4,
            Fate::DiedInCaptivity => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Fate::Killed => "killed",
            Fate::DiedOfWounds => "died_of_wounds",
            Fate::DiedOfDisease => "died_of_disease",
            Fate::Missing => "missing",
            Fate::DiedInCaptivity => "died_in_captivity",
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|fate| fate.code() == code)
    }

    /// Parse a numeric code or a name (case-insensitive, spaces and dashes
    /// accepted in place of underscores)
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(code) = raw.parse::<i64>() {
            return Self::from_code(code);
        }

        let normalized: String = raw
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        Self::ALL.into_iter().find(|fate| fate.as_str() == normalized)
    }
}

/// Completeness of a person record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonStatus {
    /// No actual value confirmed
    Incomplete,
    /// Some actual values confirmed
    Partial,
    /// Every actual value confirmed
    Complete,
}

impl PersonStatus {
    /// Status for `filled` confirmed values out of `total` pairs
    pub fn from_filled(filled: usize, total: usize) -> Self {
        if filled == 0 {
            PersonStatus::Incomplete
        } else if filled >= total {
            PersonStatus::Complete
        } else {
            PersonStatus::Partial
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PersonStatus::Incomplete => "incomplete",
            PersonStatus::Partial => "partial",
            PersonStatus::Complete => "complete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "incomplete" => Some(PersonStatus::Incomplete),
            "partial" => Some(PersonStatus::Partial),
            "complete" => Some(PersonStatus::Complete),
            _ => None,
        }
    }
}

/// A typed value of one person column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Fate(Fate),
    /// Row id of a hospital or cemetery
    Ref(i64),
}

impl FieldValue {
    /// Trimmed text, `None` when nothing is left
    pub fn text(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(FieldValue::Text(trimmed.to_string()))
        }
    }

    /// True when this value may be stored in a column of `kind`
    pub fn fits(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (FieldValue::Text(_), FieldKind::Text)
                | (FieldValue::Date(_), FieldKind::Date)
                | (FieldValue::Fate(_), FieldKind::Fate)
                | (FieldValue::Ref(_), FieldKind::Hospital | FieldKind::Cemetery)
        )
    }

    /// Strict parse of a JSON value submitted through the API
    ///
    /// `null` and blank strings clear the field. Dates must be ISO
    /// `YYYY-MM-DD`, references must be integer ids.
    pub fn from_json(kind: FieldKind, value: &Value) -> Result<Option<Self>, String> {
        if value.is_null() {
            return Ok(None);
        }
        if let Some(s) = value.as_str() {
            if s.trim().is_empty() {
                return Ok(None);
            }
        }

        match kind {
            FieldKind::Text => match value {
                Value::String(s) => Ok(FieldValue::text(s)),
                Value::Number(n) => Ok(FieldValue::text(&n.to_string())),
                _ => Err("expected a string".to_string()),
            },
            FieldKind::Date => {
                let raw = value.as_str().ok_or("expected a YYYY-MM-DD string")?;
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .map(|d| Some(FieldValue::Date(d)))
                    .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", raw))
            }
            FieldKind::Fate => {
                let parsed = match value {
                    Value::String(s) => Fate::parse(s),
                    Value::Number(n) => n.as_i64().and_then(Fate::from_code),
                    _ => None,
                };
                parsed
                    .map(|f| Some(FieldValue::Fate(f)))
                    .ok_or_else(|| format!("unknown fate code {}", value))
            }
            FieldKind::Hospital | FieldKind::Cemetery => value
                .as_i64()
                .map(|id| Some(FieldValue::Ref(id)))
                .ok_or_else(|| "expected an integer id".to_string()),
        }
    }
}

/// Errors raised when writing a column value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {column} expects a {expected:?} value")]
    KindMismatch { column: String, expected: FieldKind },

    #[error("Field {column}: {reason}")]
    Invalid { column: String, reason: String },
}

/// Values of the registry columns of one person; absent keys are NULL
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PersonValues(BTreeMap<&'static str, FieldValue>);

impl PersonValues {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.0.get(column)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        match self.0.get(column) {
            Some(FieldValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn reference(&self, column: &str) -> Option<i64> {
        match self.0.get(column) {
            Some(FieldValue::Ref(id)) => Some(*id),
            _ => None,
        }
    }

    /// Set or clear a registry column, checking the value kind
    pub fn set(&mut self, column: &str, value: Option<FieldValue>) -> Result<(), FieldError> {
        let field = find_column(column).ok_or_else(|| FieldError::UnknownField(column.to_string()))?;

        match value {
            Some(value) if !value.fits(field.kind) => Err(FieldError::KindMismatch {
                column: column.to_string(),
                expected: field.kind,
            }),
            Some(value) => {
                self.0.insert(field.column, value);
                Ok(())
            }
            None => {
                self.0.remove(field.column);
                Ok(())
            }
        }
    }

    /// Parse a whole set of API-submitted values
    pub fn from_json_map(map: &serde_json::Map<String, Value>) -> Result<Self, FieldError> {
        let mut values = PersonValues::default();
        for (column, raw) in map {
            let field =
                find_column(column).ok_or_else(|| FieldError::UnknownField(column.clone()))?;
            let value = FieldValue::from_json(field.kind, raw).map_err(|reason| {
                FieldError::Invalid {
                    column: column.clone(),
                    reason,
                }
            })?;
            values.set(column, value)?;
        }
        Ok(values)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    /// Number of pairs with a confirmed value
    pub fn filled_actual(&self) -> usize {
        PAIRED_FIELDS
            .iter()
            .filter(|field| self.0.contains_key(field.actual))
            .count()
    }

    pub fn status(&self) -> PersonStatus {
        PersonStatus::from_filled(self.filled_actual(), PAIRED_FIELDS.len())
    }
}

/// Person data without identity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonRecord {
    pub values: PersonValues,
    pub notes: Option<String>,
    /// Import that created this person and has not been applied yet
    pub active_import: Option<i64>,
}

impl PersonRecord {
    /// Confirmed name, recorded name, or [`UNKNOWN_NAME`]
    pub fn name(&self) -> &str {
        self.values
            .text("full_name_actual")
            .or_else(|| self.values.text("full_name"))
            .unwrap_or(UNKNOWN_NAME)
    }

    pub fn status(&self) -> PersonStatus {
        self.values.status()
    }
}

/// Stored person
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: i64,
    #[serde(flatten)]
    pub record: PersonRecord,
}

impl Person {
    pub fn name(&self) -> &str {
        self.record.name()
    }

    pub fn status(&self) -> PersonStatus {
        self.record.status()
    }
}

/// Compact listing entry
#[derive(Debug, Clone, Serialize)]
pub struct PersonSummary {
    pub id: i64,
    pub name: String,
    pub status: PersonStatus,
    pub cemetery: Option<i64>,
    pub hospital: Option<i64>,
    pub active_import: Option<i64>,
}

impl From<&Person> for PersonSummary {
    fn from(person: &Person) -> Self {
        let values = &person.record.values;
        Self {
            id: person.id,
            name: person.name().to_string(),
            status: person.status(),
            cemetery: values
                .reference("cemetery_actual")
                .or_else(|| values.reference("cemetery")),
            hospital: values
                .reference("hospital_actual")
                .or_else(|| values.reference("hospital")),
            active_import: person.record.active_import,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> Option<FieldValue> {
        FieldValue::text(s)
    }

    #[test]
    fn test_unknown_person_name_and_status() {
        let record = PersonRecord::default();
        assert_eq!(record.name(), UNKNOWN_NAME);
        assert_eq!(record.status(), PersonStatus::Incomplete);
    }

    #[test]
    fn test_original_only_is_incomplete() {
        let mut record = PersonRecord::default();
        record.values.set("full_name", text("a")).unwrap();

        assert_eq!(record.name(), "a");
        assert_eq!(record.status(), PersonStatus::Incomplete);
    }

    #[test]
    fn test_one_actual_is_partial() {
        let mut record = PersonRecord::default();
        record.values.set("full_name", text("b")).unwrap();
        record.values.set("full_name_actual", text("c")).unwrap();

        assert_eq!(record.name(), "c");
        assert_eq!(record.status(), PersonStatus::Partial);
    }

    #[test]
    fn test_all_actuals_is_complete() {
        let mut record = PersonRecord::default();
        for field in PAIRED_FIELDS {
            let value = match field.kind {
                FieldKind::Text => FieldValue::Text("x".to_string()),
                FieldKind::Date => FieldValue::Date(NaiveDate::from_ymd_opt(1942, 5, 9).unwrap()),
                FieldKind::Fate => FieldValue::Fate(Fate::Killed),
                FieldKind::Hospital | FieldKind::Cemetery => FieldValue::Ref(1),
            };
            record.values.set(field.actual, Some(value)).unwrap();
        }
        assert_eq!(record.status(), PersonStatus::Complete);

        record.values.set("rank_actual", None).unwrap();
        assert_eq!(record.status(), PersonStatus::Partial);
    }

    #[test]
    fn test_set_rejects_wrong_kind_and_unknown_column() {
        let mut values = PersonValues::default();
        assert!(matches!(
            values.set("birth_date", text("yesterday")),
            Err(FieldError::KindMismatch { .. })
        ));
        assert!(matches!(
            values.set("shoe_size", text("42")),
            Err(FieldError::UnknownField(_))
        ));
    }

    #[test]
    fn test_blank_text_is_not_stored() {
        assert_eq!(FieldValue::text("   "), None);
        assert_eq!(FieldValue::text("  Ivanov "), Some(FieldValue::Text("Ivanov".into())));
    }

    #[test]
    fn test_fate_parse() {
        assert_eq!(Fate::parse("1"), Some(Fate::Killed));
        assert_eq!(Fate::parse(" 4 "), Some(Fate::Missing));
        assert_eq!(Fate::parse("Died of wounds"), Some(Fate::DiedOfWounds));
        assert_eq!(Fate::parse("died-in-captivity"), Some(Fate::DiedInCaptivity));
        assert_eq!(Fate::parse("9"), None);
        assert_eq!(Fate::parse("deserted"), None);
        assert_eq!(Fate::parse(""), None);
    }

    #[test]
    fn test_from_json_map() {
        let map = json!({
            "full_name": "Сидоров Пётр",
            "birth_date": "1920-03-01",
            "fate": 2,
            "hospital": 7,
            "rank": null
        });
        let values = PersonValues::from_json_map(map.as_object().unwrap()).unwrap();

        assert_eq!(values.text("full_name"), Some("Сидоров Пётр"));
        assert_eq!(
            values.get("birth_date"),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(1920, 3, 1).unwrap()))
        );
        assert_eq!(values.get("fate"), Some(&FieldValue::Fate(Fate::DiedOfWounds)));
        assert_eq!(values.reference("hospital"), Some(7));
        assert_eq!(values.get("rank"), None);
    }

    #[test]
    fn test_from_json_map_rejects_bad_date() {
        let map = json!({"death_date": "01.02.1943"});
        let result = PersonValues::from_json_map(map.as_object().unwrap());
        assert!(matches!(result, Err(FieldError::Invalid { .. })));
    }

    #[test]
    fn test_values_serialize_flat() {
        let mut record = PersonRecord::default();
        record.values.set("full_name", text("Orlov")).unwrap();
        record.values.set("fate", Some(FieldValue::Fate(Fate::Missing))).unwrap();
        let person = Person { id: 3, record };

        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["values"]["full_name"], "Orlov");
        assert_eq!(json["values"]["fate"], "missing");
    }
}
