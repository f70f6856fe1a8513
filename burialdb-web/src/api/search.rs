//! Person search endpoints
//!
//! Each distinct filter is cached under a short id so result pages can be
//! bookmarked as `/api/search/:id?page=N`.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::person_page;
use crate::error::ApiResult;
use crate::models::PersonSummary;
use crate::pagination::{Page, PageQuery};
use crate::search::{cache_search, load_search, SearchFilter};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub search_id: i64,
    pub criteria: BTreeMap<String, String>,
    pub results: Page<PersonSummary>,
}

/// GET /api/search?field=value&...
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<SearchResponse>> {
    let page = PageQuery {
        page: params
            .iter()
            .rev()
            .find(|(k, _)| k == "page")
            .map(|(_, v)| v.clone()),
    };

    let filter = SearchFilter::from_params(params)?;
    let search_id = cache_search(&state.db, &filter).await?;
    debug!(search_id, criteria = filter.criteria().len(), "Search resolved");

    respond(&state, search_id, filter, &page).await
}

/// GET /api/search/:id
pub async fn cached_search(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let filter = load_search(&state.db, id).await?;
    respond(&state, id, filter, &page).await
}

async fn respond(
    state: &AppState,
    search_id: i64,
    filter: SearchFilter,
    page: &PageQuery,
) -> ApiResult<Json<SearchResponse>> {
    let results = person_page(state, filter.to_person_filter(), page).await?;

    Ok(Json(SearchResponse {
        search_id,
        criteria: filter.criteria().clone(),
        results,
    }))
}
