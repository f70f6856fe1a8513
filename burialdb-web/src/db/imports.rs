//! Import job database operations

use burialdb_common::Result;
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::{Import, ImportSettings};

const SELECT_IMPORT: &str = r#"
    SELECT id, name, file_path, original_filename, cemetery, header, numbering,
           delimiter, quotechar, data_added, created_at
    FROM imports
"#;

/// Values of a new import row
#[derive(Debug, Clone)]
pub struct NewImport {
    pub name: String,
    pub file_path: String,
    pub original_filename: String,
    pub settings: ImportSettings,
    pub created_at: DateTime<Utc>,
}

pub async fn insert_import(pool: &SqlitePool, new: &NewImport) -> Result<Import> {
    let id = sqlx::query(
        r#"
        INSERT INTO imports (
            name, file_path, original_filename, cemetery,
            header, numbering, delimiter, quotechar, data_added, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(&new.name)
    .bind(&new.file_path)
    .bind(&new.original_filename)
    .bind(new.settings.cemetery)
    .bind(new.settings.header)
    .bind(new.settings.numbering)
    .bind(&new.settings.delimiter)
    .bind(&new.settings.quotechar)
    .bind(new.created_at)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(Import {
        id,
        name: new.name.clone(),
        file_path: new.file_path.clone(),
        original_filename: new.original_filename.clone(),
        cemetery: new.settings.cemetery,
        header: new.settings.header,
        numbering: new.settings.numbering,
        delimiter: new.settings.delimiter.clone(),
        quotechar: new.settings.quotechar.clone(),
        data_added: false,
        created_at: new.created_at,
    })
}

pub async fn get_import<'c, E>(executor: E, id: i64) -> Result<Option<Import>>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!("{} WHERE id = ?", SELECT_IMPORT);
    let import = sqlx::query_as::<_, Import>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(import)
}

pub async fn count_imports(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM imports")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// One page of imports, newest first
pub async fn list_imports(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Import>> {
    let sql = format!("{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?", SELECT_IMPORT);
    let imports = sqlx::query_as::<_, Import>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(imports)
}

/// Replace the name and parse settings of a pending import
///
/// Returns `false` when the import does not exist or already has data.
pub async fn update_settings(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    settings: &ImportSettings,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE imports
        SET name = ?, cemetery = ?, header = ?, numbering = ?, delimiter = ?, quotechar = ?
        WHERE id = ? AND data_added = 0
        "#,
    )
    .bind(name)
    .bind(settings.cemetery)
    .bind(settings.header)
    .bind(settings.numbering)
    .bind(&settings.delimiter)
    .bind(&settings.quotechar)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_data_added<'c, E>(executor: E, id: i64, data_added: bool) -> Result<()>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query("UPDATE imports SET data_added = ? WHERE id = ?")
        .bind(data_added)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn delete_import_row<'c, E>(executor: E, id: i64) -> Result<bool>
where
    E: Executor<'c, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM imports WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
