//! Hospital endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use super::{person_page, ApiJson};
use crate::db::{hospitals, PersonFilter};
use crate::error::{ApiError, ApiResult};
use crate::models::{Hospital, NamePayload, PersonSummary};
use crate::pagination::{calculate_pagination, Page, PageQuery};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HospitalDetail {
    #[serde(flatten)]
    pub hospital: Hospital,
    pub persons: Page<PersonSummary>,
}

/// GET /api/hospitals
///
/// Hospitals created by a pending import are left out.
pub async fn list_hospitals(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Hospital>>> {
    let total = hospitals::count_hospitals(&state.db).await?;
    let pagination = calculate_pagination(total, query.number(), state.page_size);
    let items = hospitals::list_hospitals(&state.db, pagination.limit, pagination.offset).await?;

    Ok(Json(Page::new(items, pagination, total)))
}

/// POST /api/hospitals
pub async fn create_hospital(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> ApiResult<(StatusCode, Json<Hospital>)> {
    let name = payload.validated().map_err(ApiError::BadRequest)?;
    let hospital = hospitals::create_hospital(&state.db, &name).await?;

    info!(hospital_id = hospital.id, name = %hospital.name, "Hospital created");
    Ok((StatusCode::CREATED, Json(hospital)))
}

/// GET /api/hospitals/:id
pub async fn get_hospital(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<HospitalDetail>> {
    let hospital = hospitals::get_hospital(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Hospital {}", id)))?;

    let persons = person_page(&state, PersonFilter::for_hospital(id), &query).await?;
    Ok(Json(HospitalDetail { hospital, persons }))
}

/// PUT /api/hospitals/:id
pub async fn update_hospital(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> ApiResult<Json<Hospital>> {
    let name = payload.validated().map_err(ApiError::BadRequest)?;
    if !hospitals::update_hospital(&state.db, id, &name).await? {
        return Err(ApiError::NotFound(format!("Hospital {}", id)));
    }

    let hospital = hospitals::get_hospital(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Hospital {}", id)))?;
    Ok(Json(hospital))
}

/// DELETE /api/hospitals/:id
pub async fn delete_hospital(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !hospitals::delete_hospital(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Hospital {}", id)));
    }
    info!(hospital_id = id, "Hospital deleted");
    Ok(StatusCode::NO_CONTENT)
}
