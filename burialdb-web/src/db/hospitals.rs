//! Hospital database operations
//!
//! Hospitals created while materializing an import stay linked to it
//! (`active_import`) until the import is applied, and are hidden from the
//! public list meanwhile.

use burialdb_common::Result;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::Hospital;

pub async fn count_hospitals(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM hospitals WHERE active_import IS NULL")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// One page of hospitals not linked to an import, ordered by name
pub async fn list_hospitals(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Hospital>> {
    let hospitals = sqlx::query_as::<_, Hospital>(
        r#"
        SELECT id, name, active_import FROM hospitals
        WHERE active_import IS NULL
        ORDER BY name, id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(hospitals)
}

/// Hospitals created by a not yet applied import
pub async fn list_hospitals_for_import(pool: &SqlitePool, import_id: i64) -> Result<Vec<Hospital>> {
    let hospitals = sqlx::query_as::<_, Hospital>(
        "SELECT id, name, active_import FROM hospitals WHERE active_import = ? ORDER BY name, id",
    )
    .bind(import_id)
    .fetch_all(pool)
    .await?;
    Ok(hospitals)
}

pub async fn get_hospital(pool: &SqlitePool, id: i64) -> Result<Option<Hospital>> {
    let hospital = sqlx::query_as::<_, Hospital>(
        "SELECT id, name, active_import FROM hospitals WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(hospital)
}

pub async fn create_hospital(pool: &SqlitePool, name: &str) -> Result<Hospital> {
    let id = sqlx::query("INSERT INTO hospitals (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?
        .last_insert_rowid();

    Ok(Hospital {
        id,
        name: name.to_string(),
        active_import: None,
    })
}

pub async fn update_hospital(pool: &SqlitePool, id: i64, name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE hospitals SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_hospital(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM hospitals WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn hospital_exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM hospitals WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Resolve a hospital name for an import being materialized
///
/// Matches (ASCII case-insensitively) a hospital that is either detached or
/// already created by this import; otherwise creates one linked to the
/// import. Returns the id and whether the row was created.
pub async fn find_or_create_for_import(
    conn: &mut SqliteConnection,
    name: &str,
    import_id: i64,
) -> Result<(i64, bool)> {
    let existing: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM hospitals
        WHERE name = ? COLLATE NOCASE
          AND (active_import IS NULL OR active_import = ?)
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(import_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(id) = existing {
        return Ok((id, false));
    }

    let id = sqlx::query("INSERT INTO hospitals (name, active_import) VALUES (?, ?)")
        .bind(name)
        .bind(import_id)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    Ok((id, true))
}
