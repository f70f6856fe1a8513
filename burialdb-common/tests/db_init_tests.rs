//! Database initialization tests
//!
//! Covers first-run creation, reopening an existing file, idempotent schema
//! creation, the shared secret lifecycle and foreign key enforcement.

use burialdb_common::api::auth::{load_shared_secret, SHARED_SECRET_KEY};
use burialdb_common::db::init::{init_database, CURRENT_SCHEMA_VERSION};
use burialdb_common::db::settings::{get_setting, set_setting};

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("sub").join("burialdb.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_all_tables_created() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("burialdb.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in [
        "cemeteries",
        "hospitals",
        "imports",
        "persons",
        "schema_version",
        "search_data",
        "settings",
    ] {
        assert!(tables.iter().any(|t| t == expected), "Should have table: {}", expected);
    }

    let person_columns: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('persons')")
            .fetch_one(&pool)
            .await
            .unwrap();
    // id + 40 registry columns + notes + active_import + created_at
    assert_eq!(person_columns, 44);
}

#[tokio::test]
async fn test_idempotent_initialization() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("burialdb.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query("INSERT INTO cemeteries (name) VALUES ('Northern')")
        .execute(&pool1)
        .await
        .unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cemeteries")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1, "Existing rows must survive re-initialization");

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(versions, 1);

    let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(version, CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("burialdb.db")).await.unwrap();

    let result = sqlx::query("INSERT INTO persons (hospital) VALUES (9999)")
        .execute(&pool)
        .await;
    assert!(result.is_err(), "Dangling hospital reference must be rejected");
}

#[tokio::test]
async fn test_cemetery_delete_detaches_persons() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("burialdb.db")).await.unwrap();

    let cemetery_id = sqlx::query("INSERT INTO cemeteries (name) VALUES ('Memorial')")
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();
    sqlx::query("INSERT INTO persons (full_name, cemetery) VALUES ('Petrov', ?)")
        .bind(cemetery_id)
        .execute(&pool)
        .await
        .unwrap();

    sqlx::query("DELETE FROM cemeteries WHERE id = ?")
        .bind(cemetery_id)
        .execute(&pool)
        .await
        .unwrap();

    let remaining: (i64, Option<i64>) =
        sqlx::query_as("SELECT COUNT(*), MAX(cemetery) FROM persons")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(remaining, (1, None));
}

#[tokio::test]
async fn test_settings_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("burialdb.db")).await.unwrap();

    assert_eq!(get_setting(&pool, "missing").await.unwrap(), None);

    set_setting(&pool, "greeting", "hello").await.unwrap();
    set_setting(&pool, "greeting", "again").await.unwrap();

    assert_eq!(get_setting(&pool, "greeting").await.unwrap().as_deref(), Some("again"));
}

#[tokio::test]
async fn test_shared_secret_generated_once() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("burialdb.db")).await.unwrap();

    let first = load_shared_secret(&pool).await.unwrap();
    assert_ne!(first, 0, "Generated secret must be non-zero");

    let second = load_shared_secret(&pool).await.unwrap();
    assert_eq!(first, second, "Secret must be stable once stored");
}

#[tokio::test]
async fn test_shared_secret_zero_respected() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("burialdb.db")).await.unwrap();

    set_setting(&pool, SHARED_SECRET_KEY, "0").await.unwrap();
    assert_eq!(load_shared_secret(&pool).await.unwrap(), 0);
}
