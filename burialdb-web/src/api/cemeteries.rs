//! Cemetery endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use super::{person_page, ApiJson};
use crate::db::{cemeteries, PersonFilter};
use crate::error::{ApiError, ApiResult};
use crate::models::{Cemetery, NamePayload, PersonSummary};
use crate::pagination::{calculate_pagination, Page, PageQuery};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CemeteryDetail {
    #[serde(flatten)]
    pub cemetery: Cemetery,
    pub persons: Page<PersonSummary>,
}

/// GET /api/cemeteries
pub async fn list_cemeteries(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<Cemetery>>> {
    let total = cemeteries::count_cemeteries(&state.db).await?;
    let pagination = calculate_pagination(total, query.number(), state.page_size);
    let items =
        cemeteries::list_cemeteries(&state.db, pagination.limit, pagination.offset).await?;

    Ok(Json(Page::new(items, pagination, total)))
}

/// POST /api/cemeteries
pub async fn create_cemetery(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> ApiResult<(StatusCode, Json<Cemetery>)> {
    let name = payload.validated().map_err(ApiError::BadRequest)?;
    let cemetery = cemeteries::create_cemetery(&state.db, &name).await?;

    info!(cemetery_id = cemetery.id, name = %cemetery.name, "Cemetery created");
    Ok((StatusCode::CREATED, Json(cemetery)))
}

/// GET /api/cemeteries/:id
///
/// Includes a page of persons buried there.
pub async fn get_cemetery(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<CemeteryDetail>> {
    let cemetery = cemeteries::get_cemetery(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cemetery {}", id)))?;

    let persons = person_page(&state, PersonFilter::for_cemetery(id), &query).await?;
    Ok(Json(CemeteryDetail { cemetery, persons }))
}

/// PUT /api/cemeteries/:id
pub async fn update_cemetery(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<NamePayload>,
) -> ApiResult<Json<Cemetery>> {
    let name = payload.validated().map_err(ApiError::BadRequest)?;
    if !cemeteries::update_cemetery(&state.db, id, &name).await? {
        return Err(ApiError::NotFound(format!("Cemetery {}", id)));
    }
    Ok(Json(Cemetery { id, name }))
}

/// DELETE /api/cemeteries/:id
pub async fn delete_cemetery(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !cemeteries::delete_cemetery(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Cemetery {}", id)));
    }
    info!(cemetery_id = id, "Cemetery deleted");
    Ok(StatusCode::NO_CONTENT)
}
