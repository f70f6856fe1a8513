//! burialdb web service library
//!
//! Records of the fallen and missing: persons with paired original and
//! confirmed fields, cemeteries, hospitals, bulk imports from CSV or
//! spreadsheet files, and bookmarkable searches.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod importer;
pub mod models;
pub mod pagination;
pub mod search;
pub mod storage;

use storage::MediaStorage;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Shared secret for API authentication; 0 disables it
    pub shared_secret: i64,
    pub storage: MediaStorage,
    /// Rows per list page
    pub page_size: i64,
    /// Largest accepted request body, uploads included
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: SqlitePool, shared_secret: i64, storage: MediaStorage) -> Self {
        Self {
            db,
            shared_secret,
            storage,
            page_size: burialdb_common::config::DEFAULT_PAGE_SIZE,
            max_upload_bytes: burialdb_common::config::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Build application router
///
/// `/api` routes require authentication; `/` and `/health` do not.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let protected = Router::new()
        .route(
            "/api/cemeteries",
            get(api::cemeteries::list_cemeteries).post(api::cemeteries::create_cemetery),
        )
        .route(
            "/api/cemeteries/:id",
            get(api::cemeteries::get_cemetery)
                .put(api::cemeteries::update_cemetery)
                .delete(api::cemeteries::delete_cemetery),
        )
        .route(
            "/api/hospitals",
            get(api::hospitals::list_hospitals).post(api::hospitals::create_hospital),
        )
        .route(
            "/api/hospitals/:id",
            get(api::hospitals::get_hospital)
                .put(api::hospitals::update_hospital)
                .delete(api::hospitals::delete_hospital),
        )
        .route(
            "/api/persons",
            get(api::persons::list_persons).post(api::persons::create_person),
        )
        .route("/api/persons/fields", get(api::persons::list_fields))
        .route(
            "/api/persons/:id",
            get(api::persons::get_person)
                .put(api::persons::update_person)
                .delete(api::persons::delete_person),
        )
        .route(
            "/api/imports",
            get(api::imports::list_imports).post(api::imports::create_import),
        )
        .route(
            "/api/imports/:id",
            get(api::imports::get_import)
                .put(api::imports::update_import)
                .delete(api::imports::delete_import),
        )
        .route("/api/imports/:id/preview", get(api::imports::preview_import))
        .route(
            "/api/imports/:id/materialize",
            post(api::imports::materialize_import),
        )
        .route("/api/imports/:id/action", post(api::imports::import_action))
        .route("/api/search", get(api::search::search))
        .route("/api/search/:id", get(api::search::cached_search))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
