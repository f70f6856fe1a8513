//! Person database operations
//!
//! Column lists are generated from the field registry, so every statement
//! here is built at runtime and bound positionally.

use burialdb_common::db::fields::{field_columns, FieldKind, PAIRED_FIELDS};
use burialdb_common::{Error, Result};
use chrono::NaiveDate;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Executor, Row, Sqlite, SqlitePool};

use crate::models::{Fate, FieldValue, Person, PersonRecord, PersonStatus, PersonValues};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Positional parameter of a [`PersonFilter`] clause
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Date(NaiveDate),
}

/// WHERE clause over the persons table, AND-combined
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonFilter {
    clauses: Vec<String>,
    binds: Vec<BindValue>,
}

impl PersonFilter {
    /// Persons not linked to a pending import
    pub fn unlinked() -> Self {
        let mut filter = Self::default();
        filter.push("active_import IS NULL", []);
        filter
    }

    /// Persons created by a not yet applied import
    pub fn for_import(import_id: i64) -> Self {
        let mut filter = Self::default();
        filter.push("active_import = ?", [BindValue::Int(import_id)]);
        filter
    }

    /// Unlinked persons buried at a cemetery (original or actual)
    pub fn for_cemetery(cemetery_id: i64) -> Self {
        let mut filter = Self::unlinked();
        filter.push_pair_equals("cemetery", BindValue::Int(cemetery_id));
        filter
    }

    /// Unlinked persons treated at a hospital (original or actual)
    pub fn for_hospital(hospital_id: i64) -> Self {
        let mut filter = Self::unlinked();
        filter.push_pair_equals("hospital", BindValue::Int(hospital_id));
        filter
    }

    /// Add a clause with one bind per `?` placeholder
    pub fn push(&mut self, clause: impl Into<String>, binds: impl IntoIterator<Item = BindValue>) {
        self.clauses.push(clause.into());
        self.binds.extend(binds);
    }

    /// `(name = ? OR name_actual = ?)`
    pub fn push_pair_equals(&mut self, name: &str, value: BindValue) {
        self.push(
            format!("({name} = ? OR {name}_actual = ?)"),
            [value.clone(), value],
        );
    }

    /// Case-insensitive substring match on either column of a pair
    ///
    /// SQLite folds case for ASCII letters only.
    pub fn push_pair_contains(&mut self, name: &str, needle: &str) {
        let pattern = format!("%{}%", escape_like(needle));
        self.push(
            format!("({name} LIKE ? ESCAPE '\\' OR {name}_actual LIKE ? ESCAPE '\\')"),
            [BindValue::Text(pattern.clone()), BindValue::Text(pattern)],
        );
    }

    pub fn push_status(&mut self, status: PersonStatus) {
        let filled = filled_actual_sql();
        let clause = match status {
            PersonStatus::Incomplete => format!("({filled}) = 0"),
            PersonStatus::Complete => format!("({filled}) = {}", PAIRED_FIELDS.len()),
            PersonStatus::Partial => {
                format!("({filled}) BETWEEN 1 AND {}", PAIRED_FIELDS.len() - 1)
            }
        };
        self.push(clause, []);
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    fn bind_all<'q>(&self, mut query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        for value in &self.binds {
            query = match value {
                BindValue::Text(s) => query.bind(s.clone()),
                BindValue::Int(i) => query.bind(*i),
                BindValue::Date(d) => query.bind(*d),
            };
        }
        query
    }
}

/// Escape `%`, `_` and the escape character itself for `LIKE ... ESCAPE '\'`
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// SQL expression counting the populated actual columns of a row
fn filled_actual_sql() -> String {
    PAIRED_FIELDS
        .iter()
        .map(|f| format!("(CASE WHEN {} IS NOT NULL THEN 1 ELSE 0 END)", f.actual))
        .collect::<Vec<_>>()
        .join(" + ")
}

fn registry_columns() -> Vec<&'static str> {
    field_columns().map(|c| c.column).collect()
}

fn select_sql() -> String {
    format!(
        "SELECT id, {}, notes, active_import FROM persons",
        registry_columns().join(", ")
    )
}

const ORDER_SQL: &str = " ORDER BY COALESCE(full_name_actual, full_name, '') COLLATE NOCASE, id";

fn bind_field<'q>(query: SqliteQuery<'q>, value: Option<&FieldValue>) -> SqliteQuery<'q> {
    match value {
        Some(FieldValue::Text(s)) => query.bind(s.clone()),
        Some(FieldValue::Date(d)) => query.bind(*d),
        Some(FieldValue::Fate(f)) => query.bind(f.as_str()),
        Some(FieldValue::Ref(id)) => query.bind(*id),
        None => query.bind(None::<String>),
    }
}

fn bind_values<'q>(mut query: SqliteQuery<'q>, values: &PersonValues) -> SqliteQuery<'q> {
    for column in field_columns() {
        query = bind_field(query, values.get(column.column));
    }
    query
}

fn person_from_row(row: &SqliteRow) -> Result<Person> {
    let mut values = PersonValues::default();

    for column in field_columns() {
        let name = column.column;
        let value = match column.kind {
            FieldKind::Text => row
                .try_get::<Option<String>, _>(name)?
                .and_then(|s| FieldValue::text(&s)),
            FieldKind::Date => row
                .try_get::<Option<NaiveDate>, _>(name)?
                .map(FieldValue::Date),
            FieldKind::Fate => row
                .try_get::<Option<String>, _>(name)?
                .and_then(|s| Fate::parse(&s))
                .map(FieldValue::Fate),
            FieldKind::Hospital | FieldKind::Cemetery => {
                row.try_get::<Option<i64>, _>(name)?.map(FieldValue::Ref)
            }
        };
        values
            .set(name, value)
            .map_err(|e| Error::Internal(e.to_string()))?;
    }

    Ok(Person {
        id: row.try_get("id")?,
        record: PersonRecord {
            values,
            notes: row.try_get("notes")?,
            active_import: row.try_get("active_import")?,
        },
    })
}

/// Insert a person, returning its id
pub async fn insert_person<'c, E>(executor: E, record: &PersonRecord) -> Result<i64>
where
    E: Executor<'c, Database = Sqlite>,
{
    let columns = registry_columns();
    let placeholders = vec!["?"; columns.len() + 2].join(", ");
    let sql = format!(
        "INSERT INTO persons ({}, notes, active_import) VALUES ({})",
        columns.join(", "),
        placeholders
    );

    let query = bind_values(sqlx::query(&sql), &record.values)
        .bind(record.notes.clone())
        .bind(record.active_import);
    let result = query.execute(executor).await?;

    Ok(result.last_insert_rowid())
}

/// Replace the field values and notes of a person
///
/// The import link is left untouched. Returns `false` when no such person.
pub async fn update_person(pool: &SqlitePool, id: i64, record: &PersonRecord) -> Result<bool> {
    let assignments: Vec<String> = registry_columns()
        .into_iter()
        .map(|c| format!("{} = ?", c))
        .collect();
    let sql = format!(
        "UPDATE persons SET {}, notes = ? WHERE id = ?",
        assignments.join(", ")
    );

    let result = bind_values(sqlx::query(&sql), &record.values)
        .bind(record.notes.clone())
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_person(pool: &SqlitePool, id: i64) -> Result<Option<Person>> {
    let sql = format!("{} WHERE id = ?", select_sql());
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    row.as_ref().map(person_from_row).transpose()
}

pub async fn delete_person(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM persons WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_persons(pool: &SqlitePool, filter: &PersonFilter) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM persons{}", filter.where_sql());
    let row = filter.bind_all(sqlx::query(&sql)).fetch_one(pool).await?;
    Ok(row.try_get(0)?)
}

/// Matching persons ordered by display name
pub async fn list_persons(
    pool: &SqlitePool,
    filter: &PersonFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Person>> {
    let sql = format!(
        "{}{}{} LIMIT ? OFFSET ?",
        select_sql(),
        filter.where_sql(),
        ORDER_SQL
    );
    let rows = filter
        .bind_all(sqlx::query(&sql))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    rows.iter().map(person_from_row).collect()
}

/// Every matching person, unpaged
pub async fn list_all_persons(pool: &SqlitePool, filter: &PersonFilter) -> Result<Vec<Person>> {
    list_persons(pool, filter, -1, 0).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
        assert_eq!(escape_like("Ivanov"), "Ivanov");
    }

    #[test]
    fn test_filter_sql() {
        let mut filter = PersonFilter::unlinked();
        filter.push_pair_contains("full_name", "iv");
        assert_eq!(
            filter.where_sql(),
            " WHERE active_import IS NULL AND (full_name LIKE ? ESCAPE '\\' OR full_name_actual LIKE ? ESCAPE '\\')"
        );
        assert_eq!(filter.binds.len(), 2);
        assert_eq!(filter.binds[0], BindValue::Text("%iv%".to_string()));
    }

    #[test]
    fn test_status_clause_bounds() {
        let mut filter = PersonFilter::default();
        filter.push_status(PersonStatus::Partial);
        assert!(filter.where_sql().ends_with("BETWEEN 1 AND 19"));
        assert!(filter.binds.is_empty());
    }

    #[test]
    fn test_empty_filter_has_no_where() {
        assert_eq!(PersonFilter::default().where_sql(), "");
    }
}
