//! HTTP API handlers

pub mod auth;
pub mod cemeteries;
pub mod extract;
pub mod health;
pub mod hospitals;
pub mod imports;
pub mod persons;
pub mod search;
pub mod ui;

pub use auth::auth_middleware;
pub use extract::ApiJson;
pub use health::health_routes;
pub use ui::serve_index;

use crate::db::{persons as person_db, PersonFilter};
use crate::error::ApiResult;
use crate::models::PersonSummary;
use crate::pagination::{calculate_pagination, Page, PageQuery};
use crate::AppState;

/// One page of person summaries matching `filter`
pub(crate) async fn person_page(
    state: &AppState,
    filter: PersonFilter,
    query: &PageQuery,
) -> ApiResult<Page<PersonSummary>> {
    let total = person_db::count_persons(&state.db, &filter).await?;
    let pagination = calculate_pagination(total, query.number(), state.page_size);
    let rows =
        person_db::list_persons(&state.db, &filter, pagination.limit, pagination.offset).await?;

    Ok(Page::new(
        rows.iter().map(PersonSummary::from).collect(),
        pagination,
        total,
    ))
}
