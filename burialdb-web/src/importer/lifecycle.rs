//! Import lifecycle: materialize, undo, apply, delete
//!
//! ```text
//! pending --materialize--> data_added --undo--> pending
//!                               |
//!                               +--apply--> (import removed, rows kept)
//! ```
//!
//! Every transition runs in one transaction. Source files are removed only
//! after the transaction commits.

use burialdb_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::mapping::{translate_cell, ColumnMapping, Translated};
use super::reader::ParsedImport;
use crate::db::{hospitals, imports, persons};
use crate::models::{FieldValue, Import, PersonRecord};
use crate::storage::MediaStorage;

/// Action requested on a materialized import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportAction {
    Undo,
    Apply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializeSummary {
    pub import_id: i64,
    pub persons_added: usize,
    pub hospitals_added: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoSummary {
    pub import_id: i64,
    pub persons_removed: u64,
    pub hospitals_removed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub import_id: i64,
    pub persons_kept: u64,
    pub hospitals_kept: u64,
    pub file_removed: bool,
}

/// Outcome of an [`ImportAction`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionOutcome {
    Undo(UndoSummary),
    Apply(ApplySummary),
}

/// Lock in the import row and check its state inside a transaction
async fn load_for_transition(
    conn: &mut SqliteConnection,
    import_id: i64,
    expect_data_added: bool,
) -> Result<Import> {
    let import = imports::get_import(&mut *conn, import_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Import {} not found", import_id)))?;

    match (import.data_added, expect_data_added) {
        (true, false) => Err(Error::Conflict(format!(
            "Import {} already has data added",
            import_id
        ))),
        (false, true) => Err(Error::Conflict(format!(
            "Import {} has no data added",
            import_id
        ))),
        _ => Ok(import),
    }
}

/// Create one person per parsed row and flag the import as materialized
pub async fn materialize(
    pool: &SqlitePool,
    import_id: i64,
    parsed: &ParsedImport,
    mapping: &ColumnMapping,
) -> Result<MaterializeSummary> {
    let mut tx = pool.begin().await?;
    let import = load_for_transition(&mut tx, import_id, false).await?;

    let mut hospitals_added = 0;
    for row in &parsed.rows {
        let mut record = PersonRecord {
            active_import: Some(import.id),
            ..PersonRecord::default()
        };
        if let Some(cemetery) = import.cemetery {
            record
                .values
                .set("cemetery", Some(FieldValue::Ref(cemetery)))
                .map_err(|e| Error::Internal(e.to_string()))?;
        }

        for (column, index) in mapping.assignments() {
            let raw = row.data.get(*index).map(String::as_str).unwrap_or("");
            let value = match translate_cell(column.kind, raw) {
                None => None,
                Some(Translated::Value(value)) => Some(value),
                Some(Translated::HospitalName(name)) => {
                    let (id, created) =
                        hospitals::find_or_create_for_import(&mut tx, &name, import.id).await?;
                    if created {
                        hospitals_added += 1;
                    }
                    Some(FieldValue::Ref(id))
                }
            };
            record
                .values
                .set(column.column, value)
                .map_err(|e| Error::Internal(e.to_string()))?;
        }

        persons::insert_person(&mut *tx, &record).await?;
    }

    imports::set_data_added(&mut *tx, import.id, true).await?;
    tx.commit().await?;

    info!(
        import_id = import.id,
        persons = parsed.rows.len(),
        hospitals = hospitals_added,
        "Import materialized"
    );

    Ok(MaterializeSummary {
        import_id: import.id,
        persons_added: parsed.rows.len(),
        hospitals_added,
    })
}

/// Delete everything the import created and return it to pending
pub async fn undo(pool: &SqlitePool, import_id: i64) -> Result<UndoSummary> {
    let mut tx = pool.begin().await?;
    load_for_transition(&mut tx, import_id, true).await?;

    let persons_removed = sqlx::query("DELETE FROM persons WHERE active_import = ?")
        .bind(import_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let hospitals_removed = sqlx::query("DELETE FROM hospitals WHERE active_import = ?")
        .bind(import_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    imports::set_data_added(&mut *tx, import_id, false).await?;

    tx.commit().await?;

    info!(
        import_id,
        persons = persons_removed,
        hospitals = hospitals_removed,
        "Import undone"
    );

    Ok(UndoSummary {
        import_id,
        persons_removed,
        hospitals_removed,
    })
}

/// Keep the created rows, drop the import and its source file
pub async fn apply(pool: &SqlitePool, storage: &MediaStorage, import_id: i64) -> Result<ApplySummary> {
    let mut tx = pool.begin().await?;
    let import = load_for_transition(&mut tx, import_id, true).await?;

    let persons_kept = sqlx::query("UPDATE persons SET active_import = NULL WHERE active_import = ?")
        .bind(import_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let hospitals_kept =
        sqlx::query("UPDATE hospitals SET active_import = NULL WHERE active_import = ?")
            .bind(import_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    imports::delete_import_row(&mut *tx, import_id).await?;

    tx.commit().await?;

    let file_removed = remove_source_file(storage, &import);

    info!(
        import_id,
        persons = persons_kept,
        hospitals = hospitals_kept,
        "Import applied"
    );

    Ok(ApplySummary {
        import_id,
        persons_kept,
        hospitals_kept,
        file_removed,
    })
}

/// Run an undo or apply action
pub async fn run_action(
    pool: &SqlitePool,
    storage: &MediaStorage,
    import_id: i64,
    action: ImportAction,
) -> Result<ActionOutcome> {
    match action {
        ImportAction::Undo => undo(pool, import_id).await.map(ActionOutcome::Undo),
        ImportAction::Apply => apply(pool, storage, import_id)
            .await
            .map(ActionOutcome::Apply),
    }
}

/// Delete a pending import and its source file
pub async fn delete_pending(pool: &SqlitePool, storage: &MediaStorage, import_id: i64) -> Result<()> {
    let mut tx = pool.begin().await?;
    let import = load_for_transition(&mut tx, import_id, false).await?;
    imports::delete_import_row(&mut *tx, import_id).await?;
    tx.commit().await?;

    remove_source_file(storage, &import);
    info!(import_id, "Import deleted");
    Ok(())
}

fn remove_source_file(storage: &MediaStorage, import: &Import) -> bool {
    match storage.remove(&import.file_path) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                import_id = import.id,
                file = %import.file_path,
                error = %e,
                "Failed to remove import file"
            );
            false
        }
    }
}
