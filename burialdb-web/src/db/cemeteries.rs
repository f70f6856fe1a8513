//! Cemetery database operations

use burialdb_common::Result;
use sqlx::SqlitePool;

use crate::models::Cemetery;

pub async fn count_cemeteries(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM cemeteries")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// One page of cemeteries ordered by name
pub async fn list_cemeteries(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Cemetery>> {
    let cemeteries = sqlx::query_as::<_, Cemetery>(
        "SELECT id, name FROM cemeteries ORDER BY name, id LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(cemeteries)
}

pub async fn get_cemetery(pool: &SqlitePool, id: i64) -> Result<Option<Cemetery>> {
    let cemetery = sqlx::query_as::<_, Cemetery>("SELECT id, name FROM cemeteries WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(cemetery)
}

pub async fn create_cemetery(pool: &SqlitePool, name: &str) -> Result<Cemetery> {
    let id = sqlx::query("INSERT INTO cemeteries (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?
        .last_insert_rowid();

    Ok(Cemetery {
        id,
        name: name.to_string(),
    })
}

/// Rename a cemetery; `false` when it does not exist
pub async fn update_cemetery(pool: &SqlitePool, id: i64, name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE cemeteries SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete a cemetery; persons and imports referencing it are detached by
/// the foreign keys
pub async fn delete_cemetery(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM cemeteries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn cemetery_exists(pool: &SqlitePool, id: i64) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM cemeteries WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}
