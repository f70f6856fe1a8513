//! Database initialization
//!
//! Creates the database file on first run and brings the schema up to date.
//! All table creation is idempotent, so this runs on every startup.

use crate::db::fields::field_columns;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Busy timeout applied to every pooled connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Foreign keys are a per-connection pragma, so they go on the connect
    // options rather than a one-off query.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;
    record_schema_version(&pool).await?;

    Ok(pool)
}

/// Create every table and index (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_cemeteries_table(pool).await?;
    create_imports_table(pool).await?;
    create_hospitals_table(pool).await?;
    create_persons_table(pool).await?;
    create_search_data_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn record_schema_version(pool: &SqlitePool) -> Result<()> {
    let latest: Option<i64> =
        sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await?;

    if latest.unwrap_or(0) < CURRENT_SCHEMA_VERSION {
        sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
            .bind(CURRENT_SCHEMA_VERSION)
            .execute(pool)
            .await?;
        info!("Database schema at v{}", CURRENT_SCHEMA_VERSION);
    }

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_cemeteries_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cemeteries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cemeteries_name ON cemeteries(name)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_imports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS imports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            file_path TEXT NOT NULL,
            original_filename TEXT NOT NULL,
            cemetery INTEGER REFERENCES cemeteries(id) ON DELETE SET NULL,
            header INTEGER NOT NULL DEFAULT 1 CHECK (header >= 0),
            numbering INTEGER NOT NULL DEFAULT 0 CHECK (numbering >= 0),
            delimiter TEXT NOT NULL DEFAULT ',',
            quotechar TEXT NOT NULL DEFAULT '"',
            data_added INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_hospitals_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hospitals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            active_import INTEGER REFERENCES imports(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_hospitals_name ON hospitals(name)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_hospitals_active_import ON hospitals(active_import)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Build the persons table DDL from the field registry
pub fn persons_table_sql() -> String {
    let columns: Vec<String> = field_columns()
        .map(|c| format!("            {} {}", c.column, c.kind.column_definition()))
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS persons (\n            \
         id INTEGER PRIMARY KEY AUTOINCREMENT,\n{},\n            \
         notes TEXT,\n            \
         active_import INTEGER REFERENCES imports(id) ON DELETE SET NULL,\n            \
         created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP\n        )",
        columns.join(",\n")
    )
}

async fn create_persons_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(&persons_table_sql()).execute(pool).await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_persons_active_import ON persons(active_import)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_persons_full_name ON persons(full_name)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_search_data_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hash TEXT NOT NULL UNIQUE,
            fields TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
