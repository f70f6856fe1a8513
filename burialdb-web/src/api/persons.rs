//! Person endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use burialdb_common::db::fields::{FieldKind, PAIRED_FIELDS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::{person_page, ApiJson};
use crate::db::{cemeteries, hospitals, persons, PersonFilter};
use crate::error::{ApiError, ApiResult};
use crate::importer::mappable_columns;
use crate::models::{FieldValue, Person, PersonRecord, PersonStatus, PersonSummary, PersonValues};
use crate::pagination::{Page, PageQuery};
use crate::AppState;

/// Create/edit body
#[derive(Debug, Deserialize)]
pub struct PersonPayload {
    /// Column name to value; omitted columns are stored as NULL
    #[serde(default)]
    pub values: Map<String, Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PersonPayload {
    fn into_record(self) -> ApiResult<PersonRecord> {
        Ok(PersonRecord {
            values: PersonValues::from_json_map(&self.values)?,
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            active_import: None,
        })
    }
}

/// A value shown on a person card; references carry the referenced name
#[derive(Debug, Serialize)]
pub struct CardValue {
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One paired field of a person card
#[derive(Debug, Serialize)]
pub struct CardRow {
    pub name: &'static str,
    pub caption: &'static str,
    pub kind: FieldKind,
    pub original: Option<CardValue>,
    pub actual: Option<CardValue>,
}

#[derive(Debug, Serialize)]
pub struct PersonCard {
    pub id: i64,
    pub name: String,
    pub status: PersonStatus,
    pub rows: Vec<CardRow>,
    pub notes: Option<String>,
    pub active_import: Option<i64>,
}

/// Registry entry served by `/api/persons/fields`
#[derive(Debug, Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    pub actual: &'static str,
    pub caption: &'static str,
    pub kind: FieldKind,
    /// True when import files may fill this pair
    pub importable: bool,
}

/// GET /api/persons
///
/// Persons created by a pending import are left out.
pub async fn list_persons(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<PersonSummary>>> {
    Ok(Json(person_page(&state, PersonFilter::unlinked(), &query).await?))
}

/// GET /api/persons/fields
pub async fn list_fields() -> Json<Vec<FieldInfo>> {
    let importable: Vec<&str> = mappable_columns().map(|c| c.column).collect();

    Json(
        PAIRED_FIELDS
            .iter()
            .map(|field| FieldInfo {
                name: field.name,
                actual: field.actual,
                caption: field.caption,
                kind: field.kind,
                importable: importable.contains(&field.name),
            })
            .collect(),
    )
}

/// POST /api/persons
pub async fn create_person(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PersonPayload>,
) -> ApiResult<(StatusCode, Json<PersonCard>)> {
    let record = payload.into_record()?;
    check_references(&state, &record.values).await?;

    let id = persons::insert_person(&state.db, &record).await?;
    info!(person_id = id, name = %record.name(), "Person created");

    let card = load_card(&state, id).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// GET /api/persons/:id
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PersonCard>> {
    Ok(Json(load_card(&state, id).await?))
}

/// PUT /api/persons/:id
///
/// Replaces every value and the notes.
pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<PersonPayload>,
) -> ApiResult<Json<PersonCard>> {
    let record = payload.into_record()?;
    check_references(&state, &record.values).await?;

    if !persons::update_person(&state.db, id, &record).await? {
        return Err(ApiError::NotFound(format!("Person {}", id)));
    }
    info!(person_id = id, "Person updated");

    Ok(Json(load_card(&state, id).await?))
}

/// DELETE /api/persons/:id
pub async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !persons::delete_person(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Person {}", id)));
    }
    info!(person_id = id, "Person deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Reject hospital and cemetery ids that do not exist
async fn check_references(state: &AppState, values: &PersonValues) -> ApiResult<()> {
    for field in PAIRED_FIELDS.iter().filter(|f| f.kind.is_reference()) {
        for column in [field.name, field.actual] {
            let Some(id) = values.reference(column) else {
                continue;
            };
            let exists = match field.kind {
                FieldKind::Hospital => hospitals::hospital_exists(&state.db, id).await?,
                _ => cemeteries::cemetery_exists(&state.db, id).await?,
            };
            if !exists {
                return Err(ApiError::BadRequest(format!(
                    "{}: no {:?} with id {}",
                    column, field.kind, id
                )));
            }
        }
    }
    Ok(())
}

async fn load_card(state: &AppState, id: i64) -> ApiResult<PersonCard> {
    let person = persons::get_person(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Person {}", id)))?;
    build_card(state, person).await
}

async fn build_card(state: &AppState, person: Person) -> ApiResult<PersonCard> {
    let mut rows = Vec::with_capacity(PAIRED_FIELDS.len());

    for field in PAIRED_FIELDS {
        let original = card_value(state, field.kind, person.record.values.get(field.name)).await?;
        let actual = card_value(state, field.kind, person.record.values.get(field.actual)).await?;
        rows.push(CardRow {
            name: field.name,
            caption: field.caption,
            kind: field.kind,
            original,
            actual,
        });
    }

    Ok(PersonCard {
        id: person.id,
        name: person.name().to_string(),
        status: person.status(),
        rows,
        notes: person.record.notes,
        active_import: person.record.active_import,
    })
}

async fn card_value(
    state: &AppState,
    kind: FieldKind,
    value: Option<&FieldValue>,
) -> ApiResult<Option<CardValue>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let label = match (kind, value) {
        (FieldKind::Hospital, FieldValue::Ref(id)) => hospitals::get_hospital(&state.db, *id)
            .await?
            .map(|h| h.name),
        (FieldKind::Cemetery, FieldValue::Ref(id)) => cemeteries::get_cemetery(&state.db, *id)
            .await?
            .map(|c| c.name),
        _ => None,
    };

    Ok(Some(CardValue {
        value: value.clone(),
        label,
    }))
}
