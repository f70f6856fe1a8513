//! Import endpoints: upload, preview, column mapping, undo/apply

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use burialdb_common::db::fields::FieldColumn;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use super::ApiJson;
use crate::db::imports::{self, NewImport};
use crate::db::{cemeteries, hospitals, persons, PersonFilter};
use crate::error::{ApiError, ApiResult};
use crate::importer::lifecycle::{self, ActionOutcome, ImportAction, MaterializeSummary};
use crate::importer::{mappable_columns, read_import, ColumnMapping, ImportError, ParsedImport, ParsedRow};
use crate::models::{Hospital, Import, ImportSettings, ImportState, PersonSummary};
use crate::pagination::{calculate_pagination, Page, PageQuery};
use crate::AppState;

/// Rows shown by the preview unless `show_all` is given
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Serialize)]
pub struct ImportDetail {
    #[serde(flatten)]
    pub import: Import,
    pub state: ImportState,
    /// Persons currently linked to the import
    pub persons_added: i64,
}

#[derive(Debug, Serialize)]
pub struct ImportPreview {
    pub import: Import,
    pub state: ImportState,
    pub header: Vec<Vec<String>>,
    pub rows: Vec<ParsedRow>,
    pub total_rows: usize,
    pub data_cols: usize,
    pub showing_all: bool,
    /// Fields a data column may be mapped to
    pub mappable_fields: Vec<FieldColumn>,
    pub added_persons: Vec<PersonSummary>,
    pub added_hospitals: Vec<Hospital>,
    /// Why the file could not be read, if it could not
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MaterializeRequest {
    /// Target column per data column, `null` to skip
    pub columns: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: ImportAction,
}

/// GET /api/imports
pub async fn list_imports(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Import>>> {
    let total = imports::count_imports(&state.db).await?;
    let pagination = calculate_pagination(total, query.number(), state.page_size);
    let items = imports::list_imports(&state.db, pagination.limit, pagination.offset).await?;

    Ok(Json(Page::new(items, pagination, total)))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// POST /api/imports
///
/// Multipart form: a `file` part plus optional `name`, `cemetery`,
/// `header`, `numbering`, `delimiter` and `quotechar` text parts.
pub async fn create_import(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Import>)> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let data = field.bytes().await.map_err(multipart_error)?;
            upload = Some((filename, data.to_vec()));
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, value);
        }
    }

    let (original_filename, data) =
        upload.ok_or_else(|| ApiError::BadRequest("missing file part".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("uploaded file is empty".to_string()));
    }

    let settings = ImportSettings::from_form(&fields).map_err(ApiError::BadRequest)?;
    check_settings(&state, &settings).await?;

    let file_path = state.storage.save_upload(&original_filename, &data).await?;
    let new = NewImport {
        name: settings.display_name(),
        file_path,
        original_filename,
        settings,
        created_at: Utc::now(),
    };

    let import = match imports::insert_import(&state.db, &new).await {
        Ok(import) => import,
        Err(e) => {
            if let Err(remove_err) = state.storage.remove(&new.file_path) {
                warn!(file = %new.file_path, error = %remove_err, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    info!(
        import_id = import.id,
        file = %import.original_filename,
        bytes = data.len(),
        "Import uploaded"
    );
    Ok((StatusCode::CREATED, Json(import)))
}

/// GET /api/imports/:id
pub async fn get_import(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ImportDetail>> {
    let import = load_import(&state, id).await?;
    let persons_added = persons::count_persons(&state.db, &PersonFilter::for_import(id)).await?;

    Ok(Json(ImportDetail {
        state: import.state(),
        import,
        persons_added,
    }))
}

/// PUT /api/imports/:id
///
/// Only pending imports may change their parse settings.
pub async fn update_import(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(settings): ApiJson<ImportSettings>,
) -> ApiResult<Json<Import>> {
    let import = load_import(&state, id).await?;
    if import.data_added {
        return Err(ApiError::Conflict(format!(
            "Import {} already has data added; undo it first",
            id
        )));
    }
    check_settings(&state, &settings).await?;

    let name = settings
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&import.name)
        .to_string();

    if !imports::update_settings(&state.db, id, &name, &settings).await? {
        return Err(ApiError::Conflict(format!("Import {} changed state", id)));
    }

    info!(import_id = id, "Import settings updated");
    Ok(Json(load_import(&state, id).await?))
}

/// DELETE /api/imports/:id
///
/// Refused while data is added; apply or undo first.
pub async fn delete_import(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    lifecycle::delete_pending(&state.db, &state.storage, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/imports/:id/preview
///
/// A file that cannot be read is reported in `error`, not as a failure.
pub async fn preview_import(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<ImportPreview>> {
    let import = load_import(&state, id).await?;
    let showing_all = params.contains_key("show_all");

    let (parsed, error) = match parse_stored_file(&state, &import).await? {
        Ok(parsed) => (parsed, None),
        Err(e) => {
            warn!(import_id = id, error = %e, "Import file unreadable");
            (ParsedImport::default(), Some(e.to_string()))
        }
    };

    let total_rows = parsed.rows.len();
    let mut rows = parsed.rows;
    if !showing_all {
        rows.truncate(PREVIEW_ROWS);
    }

    let added_persons = persons::list_all_persons(&state.db, &PersonFilter::for_import(id))
        .await?
        .iter()
        .map(PersonSummary::from)
        .collect();
    let added_hospitals = hospitals::list_hospitals_for_import(&state.db, id).await?;

    Ok(Json(ImportPreview {
        state: import.state(),
        import,
        header: parsed.header,
        rows,
        total_rows,
        data_cols: parsed.data_cols,
        showing_all,
        mappable_fields: mappable_columns().collect(),
        added_persons,
        added_hospitals,
        error,
    }))
}

/// POST /api/imports/:id/materialize
pub async fn materialize_import(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<MaterializeRequest>,
) -> ApiResult<Json<MaterializeSummary>> {
    let import = load_import(&state, id).await?;
    if import.data_added {
        return Err(ApiError::Conflict(format!("Import {} already has data added", id)));
    }

    let parsed = parse_stored_file(&state, &import).await??;
    let mapping = ColumnMapping::from_columns(&request.columns, parsed.data_cols)?;
    let summary = lifecycle::materialize(&state.db, id, &parsed, &mapping).await?;

    Ok(Json(summary))
}

/// POST /api/imports/:id/action
pub async fn import_action(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<ActionRequest>,
) -> ApiResult<Json<ActionOutcome>> {
    let outcome = lifecycle::run_action(&state.db, &state.storage, id, request.action).await?;
    Ok(Json(outcome))
}

async fn load_import(state: &AppState, id: i64) -> ApiResult<Import> {
    imports::get_import(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Import {}", id)))
}

async fn check_settings(state: &AppState, settings: &ImportSettings) -> ApiResult<()> {
    settings.validate().map_err(ApiError::BadRequest)?;
    if let Some(cemetery) = settings.cemetery {
        if !cemeteries::cemetery_exists(&state.db, cemetery).await? {
            return Err(ApiError::BadRequest(format!("no cemetery with id {}", cemetery)));
        }
    }
    Ok(())
}

/// Parse the stored file off the async runtime
async fn parse_stored_file(
    state: &AppState,
    import: &Import,
) -> ApiResult<Result<ParsedImport, ImportError>> {
    let path = state.storage.resolve(&import.file_path)?;
    let options = import.reader_options();

    tokio::task::spawn_blocking(move || read_import(&path, &options))
        .await
        .map_err(|e| ApiError::Internal(format!("Import reader task failed: {}", e)))
}
