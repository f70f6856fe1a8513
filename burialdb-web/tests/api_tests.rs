//! Integration tests for the burialdb API
//!
//! Tests cover:
//! - Health endpoint and landing page (no auth required)
//! - Authentication middleware
//! - Cemetery, hospital and person CRUD with pagination
//! - Search with cached, bookmarkable ids

mod common;

use axum::http::StatusCode;
use burialdb_common::api::auth::calculate_hash;
use common::{empty_request, TestApp};
use serde_json::json;

// =============================================================================
// Health and landing page
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = TestApp::with_secret(42).await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "burialdb-web");
    assert_eq!(body["database"], true);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_landing_page_served() {
    let app = TestApp::with_secret(42).await;

    let (status, body) = app.get("/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("<h1>burialdb</h1>"));
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_missing_credentials_rejected() {
    let app = TestApp::with_secret(42).await;

    let (status, body) = app.get("/api/persons").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_signed_request_accepted() {
    let app = TestApp::with_secret(42).await;
    let timestamp = chrono::Utc::now().timestamp_millis();
    let hash = calculate_hash("GET", "/api/persons", timestamp, 42);

    let uri = format!("/api/persons?page=1&timestamp={}&hash={}", timestamp, hash);
    let (status, body) = app.send(empty_request("GET", &uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 0);
}

#[tokio::test]
async fn test_wrong_secret_and_stale_timestamp_rejected() {
    let app = TestApp::with_secret(42).await;
    let now = chrono::Utc::now().timestamp_millis();

    let bad_hash = calculate_hash("GET", "/api/persons", now, 43);
    let uri = format!("/api/persons?timestamp={}&hash={}", now, bad_hash);
    let (status, _) = app.send(empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let stale = now - 120_000;
    let hash = calculate_hash("GET", "/api/persons", stale, 42);
    let uri = format!("/api/persons?timestamp={}&hash={}", stale, hash);
    let (status, body) = app.send(empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"]["message"].as_str().unwrap().contains("too old"));
}

#[tokio::test]
async fn test_signature_bound_to_path() {
    let app = TestApp::with_secret(42).await;
    let timestamp = chrono::Utc::now().timestamp_millis();
    let hash = calculate_hash("GET", "/api/hospitals", timestamp, 42);

    let uri = format!("/api/cemeteries?timestamp={}&hash={}", timestamp, hash);
    let (status, _) = app.send(empty_request("GET", &uri)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Cemeteries
// =============================================================================

#[tokio::test]
async fn test_cemetery_crud() {
    let app = TestApp::new().await;

    let (status, created) = app
        .post_json("/api/cemeteries", json!({"name": "  Nevsky Pyatachok "}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Nevsky Pyatachok");
    let id = created["id"].as_i64().unwrap();

    let (status, renamed) = app
        .put_json(&format!("/api/cemeteries/{}", id), json!({"name": "Sinyavino"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Sinyavino");

    let (status, detail) = app.get(&format!("/api/cemeteries/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Sinyavino");
    assert_eq!(detail["persons"]["total_results"], 0);

    let (status, _) = app.delete(&format!("/api/cemeteries/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/api/cemeteries/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_cemetery_blank_name_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app.post_json("/api/cemeteries", json!({"name": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = app.post_json("/api/cemeteries", json!({"title": "x"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cemetery_list_paginates_by_name() {
    let app = TestApp::new().await;
    for i in (1..=12).rev() {
        app.post_json("/api/cemeteries", json!({"name": format!("Cemetery {:02}", i)}))
            .await;
    }

    let (status, first) = app.get("/api/cemeteries").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["total_results"], 12);
    assert_eq!(first["total_pages"], 2);
    assert_eq!(first["items"].as_array().unwrap().len(), 10);
    assert_eq!(first["items"][0]["name"], "Cemetery 01");

    let (_, last) = app.get("/api/cemeteries?page=99").await;
    assert_eq!(last["page"], 2);
    assert_eq!(last["items"].as_array().unwrap().len(), 2);

    let (_, garbage) = app.get("/api/cemeteries?page=abc").await;
    assert_eq!(garbage["page"], 1);
}

#[tokio::test]
async fn test_cemetery_detail_lists_buried_persons() {
    let app = TestApp::new().await;
    let (_, cemetery) = app.post_json("/api/cemeteries", json!({"name": "Memorial"})).await;
    let cemetery_id = cemetery["id"].as_i64().unwrap();

    app.post_json(
        "/api/persons",
        json!({"values": {"full_name": "Orlov", "cemetery_actual": cemetery_id}}),
    )
    .await;
    app.post_json("/api/persons", json!({"values": {"full_name": "Elsewhere"}}))
        .await;

    let (_, detail) = app.get(&format!("/api/cemeteries/{}", cemetery_id)).await;
    assert_eq!(detail["persons"]["total_results"], 1);
    assert_eq!(detail["persons"]["items"][0]["name"], "Orlov");
    assert_eq!(detail["persons"]["items"][0]["cemetery"], cemetery_id);
}

// =============================================================================
// Hospitals
// =============================================================================

#[tokio::test]
async fn test_hospital_crud() {
    let app = TestApp::new().await;

    let (status, created) = app.post_json("/api/hospitals", json!({"name": "EG 2754"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["active_import"].is_null());
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = app
        .put_json(&format!("/api/hospitals/{}", id), json!({"name": "MSB 56"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "MSB 56");

    let (_, list) = app.get("/api/hospitals").await;
    assert_eq!(list["total_results"], 1);

    let (status, _) = app.delete(&format!("/api/hospitals/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.delete(&format!("/api/hospitals/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Persons
// =============================================================================

#[tokio::test]
async fn test_person_create_and_card() {
    let app = TestApp::new().await;
    let (_, hospital) = app.post_json("/api/hospitals", json!({"name": "EG 1170"})).await;

    let (status, card) = app
        .post_json(
            "/api/persons",
            json!({
                "values": {
                    "full_name": "Kuznetsov Ivan",
                    "birth_date": "1915-04-12",
                    "fate": "died of wounds",
                    "hospital": hospital["id"],
                    "rank_actual": "Private"
                },
                "notes": "  from family archive  "
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(card["name"], "Kuznetsov Ivan");
    assert_eq!(card["status"], "partial");
    assert_eq!(card["notes"], "from family archive");

    let rows = card["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 20);
    assert_eq!(rows[0]["name"], "full_name");
    assert_eq!(rows[1]["original"]["value"], "1915-04-12");
    assert_eq!(rows[9]["original"]["value"], "died_of_wounds");
    assert_eq!(rows[13]["original"]["label"], "EG 1170");
    assert!(rows[13]["actual"].is_null());
}

#[tokio::test]
async fn test_person_unknown_name_incomplete() {
    let app = TestApp::new().await;

    let (status, card) = app.post_json("/api/persons", json!({})).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(card["name"], "Unknown");
    assert_eq!(card["status"], "incomplete");
}

#[tokio::test]
async fn test_person_invalid_values_rejected() {
    let app = TestApp::new().await;

    let cases = [
        json!({"values": {"shoe_size": "42"}}),
        json!({"values": {"death_date": "spring 1942"}}),
        json!({"values": {"fate": 9}}),
        json!({"values": {"hospital": 999}}),
        json!({"values": {"cemetery": "Memorial"}}),
    ];

    for body in cases {
        let (status, response) = app.post_json("/api/persons", body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {} -> {}", body, response);
    }

    let (_, list) = app.get("/api/persons").await;
    assert_eq!(list["total_results"], 0);
}

#[tokio::test]
async fn test_person_update_and_delete() {
    let app = TestApp::new().await;
    let (_, card) = app
        .post_json("/api/persons", json!({"values": {"full_name": "Belov"}}))
        .await;
    let id = card["id"].as_i64().unwrap();

    let (status, updated) = app
        .put_json(
            &format!("/api/persons/{}", id),
            json!({"values": {"full_name": "Belov", "full_name_actual": "Belov Pavel"}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Belov Pavel");

    let (status, _) = app.delete(&format!("/api/persons/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .put_json(&format!("/api/persons/{}", id), json!({"values": {}}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_person_fields_registry() {
    let app = TestApp::new().await;

    let (status, fields) = app.get("/api/persons/fields").await;

    assert_eq!(status, StatusCode::OK);
    let fields = fields.as_array().unwrap();
    assert_eq!(fields.len(), 20);
    assert_eq!(fields[0]["name"], "full_name");
    assert_eq!(fields[0]["actual"], "full_name_actual");

    let cemetery = fields.iter().find(|f| f["name"] == "cemetery").unwrap();
    assert_eq!(cemetery["kind"], "cemetery");
    assert_eq!(cemetery["importable"], false);
}

// =============================================================================
// Search
// =============================================================================

async fn seed_people(app: &TestApp) {
    for values in [
        json!({"full_name": "Ivanov Sergei", "fate": 4, "death_place": "Rzhev"}),
        json!({"full_name": "Ivanova Maria", "fate": 1, "death_date": "1942-08-30"}),
        json!({"full_name": "Petrov Oleg", "full_name_actual": "Petrov Oleg Ivanovich", "fate": 4}),
    ] {
        let (status, _) = app.post_json("/api/persons", json!({"values": values})).await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_search_text_matches_either_column() {
    let app = TestApp::new().await;
    seed_people(&app).await;

    let (status, body) = app.get("/api/search?full_name=ivan").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["total_results"], 3);
    assert_eq!(body["criteria"]["full_name"], "ivan");
}

#[tokio::test]
async fn test_search_combines_criteria() {
    let app = TestApp::new().await;
    seed_people(&app).await;

    let (_, body) = app.get("/api/search?full_name=ivanov&fate=killed").await;
    assert_eq!(body["results"]["total_results"], 1);
    assert_eq!(body["results"]["items"][0]["name"], "Ivanova Maria");

    let (_, body) = app.get("/api/search?fate=missing").await;
    assert_eq!(body["results"]["total_results"], 2);

    let (_, body) = app.get("/api/search?death_date=1942-08-30").await;
    assert_eq!(body["results"]["total_results"], 1);

    let (_, body) = app.get("/api/search?status=partial").await;
    assert_eq!(body["results"]["total_results"], 1);
    assert_eq!(body["results"]["items"][0]["name"], "Petrov Oleg Ivanovich");
}

#[tokio::test]
async fn test_search_id_stable_and_bookmarkable() {
    let app = TestApp::new().await;
    seed_people(&app).await;

    let (_, first) = app.get("/api/search?fate=4&full_name=iv&rank=").await;
    let (_, second) = app.get("/api/search?full_name=iv&fate=4").await;
    let search_id = first["search_id"].as_i64().unwrap();
    assert_eq!(second["search_id"], search_id);

    let (_, other) = app.get("/api/search?fate=1").await;
    assert_ne!(other["search_id"], search_id);

    let (status, cached) = app.get(&format!("/api/search/{}", search_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cached["results"]["total_results"], first["results"]["total_results"]);

    let (status, _) = app.get("/api/search/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_rejects_unknown_and_invalid() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/search?favourite_colour=red").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("favourite_colour"));

    let (status, _) = app.get("/api/search?birth_date=12.05.1920").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_like_wildcards_are_literal() {
    let app = TestApp::new().await;
    seed_people(&app).await;

    let (_, body) = app.get("/api/search?full_name=%25").await;
    assert_eq!(body["results"]["total_results"], 0);
}
