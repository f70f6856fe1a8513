//! Person field registry
//!
//! Every person attribute is recorded twice: the value as found in the source
//! document, and the "actual" value confirmed later. The registry below is the
//! single source of truth for column names, captions and value kinds; the
//! persons table schema, the import column mapping and the search filters are
//! all generated from it.

use serde::Serialize;

/// Storage and parsing kind of a paired field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text
    Text,
    /// Calendar date, stored as `YYYY-MM-DD`
    Date,
    /// Fate code (killed, missing, ...)
    Fate,
    /// Reference to a hospital row
    Hospital,
    /// Reference to a cemetery row
    Cemetery,
}

impl FieldKind {
    /// SQLite column definition for this kind (without the column name)
    pub fn column_definition(self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::Date | FieldKind::Fate => "TEXT",
            FieldKind::Hospital => "INTEGER REFERENCES hospitals(id) ON DELETE SET NULL",
            FieldKind::Cemetery => "INTEGER REFERENCES cemeteries(id) ON DELETE SET NULL",
        }
    }

    /// True for kinds stored as a foreign key
    pub fn is_reference(self) -> bool {
        matches!(self, FieldKind::Hospital | FieldKind::Cemetery)
    }
}

/// An (original, actual) column pair
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PairedField {
    /// Column holding the originally recorded value
    pub name: &'static str,
    /// Column holding the confirmed value
    pub actual: &'static str,
    pub caption: &'static str,
    pub kind: FieldKind,
}

macro_rules! paired {
    ($name:literal, $caption:literal, $kind:ident) => {
        PairedField {
            name: $name,
            actual: concat!($name, "_actual"),
            caption: $caption,
            kind: FieldKind::$kind,
        }
    };
}

/// Paired person fields in display order
pub const PAIRED_FIELDS: &[PairedField] = &[
    paired!("full_name", "Full name", Text),
    paired!("birth_date", "Date of birth", Date),
    paired!("birth_place", "Place of birth", Text),
    paired!("nationality", "Nationality", Text),
    paired!("conscription_date", "Conscription date", Date),
    paired!("conscription_place", "Place of conscription", Text),
    paired!("military_unit", "Military unit", Text),
    paired!("rank", "Rank", Text),
    paired!("position", "Position", Text),
    paired!("fate", "Fate", Fate),
    paired!("death_date", "Date of death", Date),
    paired!("death_place", "Place of death", Text),
    paired!("death_cause", "Cause of death", Text),
    paired!("hospital", "Hospital", Hospital),
    paired!("cemetery", "Memorial", Cemetery),
    paired!("grave_location", "Grave location", Text),
    paired!("reburial_date", "Reburial date", Date),
    paired!("relatives", "Relatives", Text),
    paired!("info_source", "Information source", Text),
    paired!("archive_reference", "Archive reference", Text),
];

/// One concrete column of the persons table backed by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldColumn {
    pub column: &'static str,
    pub caption: &'static str,
    pub kind: FieldKind,
    pub actual: bool,
}

impl PairedField {
    pub fn original_column(&self) -> FieldColumn {
        FieldColumn {
            column: self.name,
            caption: self.caption,
            kind: self.kind,
            actual: false,
        }
    }

    pub fn actual_column(&self) -> FieldColumn {
        FieldColumn {
            column: self.actual,
            caption: self.caption,
            kind: self.kind,
            actual: true,
        }
    }
}

/// All registry columns: original then actual for each pair, in display order
pub fn field_columns() -> impl Iterator<Item = FieldColumn> {
    PAIRED_FIELDS
        .iter()
        .flat_map(|field| [field.original_column(), field.actual_column()])
}

/// Look up a registry column by name
pub fn find_column(column: &str) -> Option<FieldColumn> {
    field_columns().find(|c| c.column == column)
}

/// Look up a pair by its original column name
pub fn find_pair(name: &str) -> Option<&'static PairedField> {
    PAIRED_FIELDS.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_twenty_pairs() {
        assert_eq!(PAIRED_FIELDS.len(), 20);
        assert_eq!(field_columns().count(), 40);
    }

    #[test]
    fn test_column_names_unique() {
        let names: HashSet<_> = field_columns().map(|c| c.column).collect();
        assert_eq!(names.len(), 40);
    }

    #[test]
    fn test_actual_column_naming() {
        for field in PAIRED_FIELDS {
            assert_eq!(field.actual, format!("{}_actual", field.name));
        }
    }

    #[test]
    fn test_find_column() {
        let column = find_column("hospital_actual").unwrap();
        assert_eq!(column.kind, FieldKind::Hospital);
        assert!(column.actual);
        assert!(find_column("no_such_column").is_none());
        assert!(find_pair("rank").is_some());
        assert!(find_pair("rank_actual").is_none());
    }
}
