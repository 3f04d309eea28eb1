//! HTTP-level integration tests for the notification category catalog and
//! the public reference data.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get, post_json_auth, put_json_auth, MARIA_CPF,
};
use serde_json::json;

const ADMIN_CATEGORIES: &str = "/api/v1/admin/notification-categories";

// ---------------------------------------------------------------------------
// Public catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn active_categories_are_listed_in_display_order() {
    let app = common::build_test_app().await;

    let response = get(&app.router, "/api/v1/notification-categories").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let ids: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        ["events", "services", "alerts", "mei_opportunities", "courses", "health"]
    );
    assert_eq!(json["data"][3]["default_opt_in"], false);
}

#[tokio::test]
async fn get_category_by_id() {
    let app = common::build_test_app().await;

    let response = get(&app.router, "/api/v1/notification-categories/alerts").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Alertas Importantes");
    assert_eq!(json["data"]["active"], true);
}

#[tokio::test]
async fn get_unknown_category_is_404() {
    let app = common::build_test_app().await;

    let response = get(&app.router, "/api/v1/notification-categories/lottery").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Admin CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_category_appears_in_listing() {
    let app = common::build_test_app().await;

    let response = post_json_auth(
        &app.router,
        ADMIN_CATEGORIES,
        &app.admin_token(),
        json!({
            "id": "culture",
            "name": "Cultura",
            "description": "Agenda cultural",
            "default_opt_in": true,
            "order": 0,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["active"], true);

    let json = body_json(get(&app.router, "/api/v1/notification-categories").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 7);
    assert_eq!(json["data"][0]["id"], "culture");
}

#[tokio::test]
async fn creating_existing_category_conflicts() {
    let app = common::build_test_app().await;

    let response = post_json_auth(
        &app.router,
        ADMIN_CATEGORIES,
        &app.admin_token(),
        json!({ "id": "events", "name": "Eventos" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn creating_category_with_invalid_id_is_400() {
    let app = common::build_test_app().await;

    let response = post_json_auth(
        &app.router,
        ADMIN_CATEGORIES,
        &app.admin_token(),
        json!({ "id": "Bad Id", "name": "Whatever" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn category_writes_require_admin() {
    let app = common::build_test_app().await;

    let response = post_json_auth(
        &app.router,
        ADMIN_CATEGORIES,
        &app.citizen_token(MARIA_CPF),
        json!({ "id": "culture", "name": "Cultura" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn updated_category_is_visible_in_listing() {
    let app = common::build_test_app().await;
    // Warm the listing cache first.
    get(&app.router, "/api/v1/notification-categories").await;

    let response = put_json_auth(
        &app.router,
        &format!("{ADMIN_CATEGORIES}/health"),
        &app.admin_token(),
        json!({ "name": "Saúde Pública", "order": 0 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(&app.router, "/api/v1/notification-categories").await).await;
    assert_eq!(json["data"][0]["id"], "health");
    assert_eq!(json["data"][0]["name"], "Saúde Pública");
}

#[tokio::test]
async fn deleted_category_leaves_listing_but_stays_readable() {
    let app = common::build_test_app().await;
    get(&app.router, "/api/v1/notification-categories").await;

    let response = delete_auth(
        &app.router,
        &format!("{ADMIN_CATEGORIES}/courses"),
        &app.admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(get(&app.router, "/api/v1/notification-categories").await).await;
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["id"] != "courses"));

    let json = body_json(get(&app.router, "/api/v1/notification-categories/courses").await).await;
    assert_eq!(json["data"]["active"], false);

    // Deleting again is a no-op success.
    let response = delete_auth(
        &app.router,
        &format!("{ADMIN_CATEGORIES}/courses"),
        &app.admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deleting_unknown_category_is_404() {
    let app = common::build_test_app().await;

    let response = delete_auth(
        &app.router,
        &format!("{ADMIN_CATEGORIES}/lottery"),
        &app.admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn seeding_twice_inserts_nothing() {
    let app = common::build_test_app().await;

    let inserted = app
        .state
        .categories
        .seed_defaults(chrono::Utc::now())
        .await
        .unwrap();
    assert_eq!(inserted, 0);
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn channels_are_listed() {
    let app = common::build_test_app().await;

    let json = body_json(get(&app.router, "/api/v1/config/channels").await).await;
    let codes: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, ["whatsapp", "web", "mobile"]);
}

#[tokio::test]
async fn opt_out_reasons_are_listed() {
    let app = common::build_test_app().await;

    let json = body_json(get(&app.router, "/api/v1/config/opt-out-reasons").await).await;
    let codes: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(
        codes,
        ["irrelevant_content", "not_from_rio", "incorrect_person", "too_many_messages"]
    );
}
