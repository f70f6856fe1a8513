//! Cached search filters, addressed by content hash

use burialdb_common::Result;
use sqlx::SqlitePool;

/// Id of the cached filter with `hash`, inserting `fields` when new
pub async fn find_or_insert(pool: &SqlitePool, hash: &str, fields: &str) -> Result<i64> {
    sqlx::query("INSERT INTO search_data (hash, fields) VALUES (?, ?) ON CONFLICT(hash) DO NOTHING")
        .bind(hash)
        .bind(fields)
        .execute(pool)
        .await?;

    let id = sqlx::query_scalar("SELECT id FROM search_data WHERE hash = ?")
        .bind(hash)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// Serialized filter of a cached search
pub async fn get_fields(pool: &SqlitePool, id: i64) -> Result<Option<String>> {
    let fields = sqlx::query_scalar("SELECT fields FROM search_data WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(fields)
}
