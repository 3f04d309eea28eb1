#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use citizen_api::auth::jwt::{generate_access_token, JwtConfig};
use citizen_api::config::ServerConfig;
use citizen_api::router::build_app_router;
use citizen_api::state::AppState;
use citizen_core::roles::ROLE_ADMIN;
use citizen_db::cache::MokaCacheStore;
use citizen_db::collections::CITIZENS;
use citizen_db::store::{DocumentStore, MemoryDocumentStore};

/// CPF of the seeded citizen Maria.
pub const MARIA_CPF: &str = "03561350712";
/// CPF of the seeded citizen João.
pub const JOAO_CPF: &str = "45049725810";
/// CPF used by admin tokens. Not a seeded citizen.
pub const ADMIN_CPF: &str = "52998224725";

pub const PHONE: &str = "+5521999887766";
pub const PHONE_KEY: &str = "5521999887766";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        store_timeout_ms: 200,
        phone_quarantine_ttl_hours: 4320,
        user_config_cache_ttl_secs: 3600,
        phone_mapping_cache_ttl_secs: 3600,
        category_cache_ttl_secs: 3600,
        citizen_cache_ttl_secs: 3600,
        cache_max_capacity: 10_000,
        seed_notification_categories: true,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// A router over in-memory stores, with handles for seeding and fault
/// injection.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryDocumentStore>,
    pub config: ServerConfig,
}

impl TestApp {
    pub fn citizen_token(&self, cpf: &str) -> String {
        generate_access_token(cpf, &[], &self.config.jwt).expect("token generation")
    }

    pub fn admin_token(&self) -> String {
        generate_access_token(ADMIN_CPF, &[ROLE_ADMIN], &self.config.jwt)
            .expect("token generation")
    }
}

/// Build the full application router over a fresh in-memory store, with the
/// default category catalog and two base citizens seeded.
pub async fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryDocumentStore::new());
    let cache = Arc::new(MokaCacheStore::new(config.cache_max_capacity));

    let state = AppState::new(config.clone(), store.clone(), cache);
    state
        .categories
        .seed_defaults(chrono::Utc::now())
        .await
        .expect("seeding categories");

    seed_citizen(&store, MARIA_CPF, "Maria da Silva Santos", "1985-04-12").await;
    seed_citizen(&store, JOAO_CPF, "João Silva Santos", "1990-01-20").await;

    let router = build_app_router(state.clone(), &config);
    TestApp {
        router,
        state,
        store,
        config,
    }
}

pub async fn seed_citizen(store: &MemoryDocumentStore, cpf: &str, name: &str, birth_date: &str) {
    store
        .upsert(
            CITIZENS,
            cpf,
            &json!({ "cpf": cpf, "name": name, "birth_date": birth_date }),
        )
        .await
        .expect("seeding citizen");
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn post_json_auth(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(app: &Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Scenario helpers
// ---------------------------------------------------------------------------

/// Admin-bind `phone` to `cpf` via whatsapp.
pub async fn bind(app: &TestApp, phone: &str, cpf: &str) -> Value {
    let response = post_json_auth(
        &app.router,
        &format!("/api/v1/phone/{phone}/bind"),
        &app.admin_token(),
        json!({ "cpf": cpf, "channel": "whatsapp" }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await
}

/// Opt `phone` in as the citizen owning `cpf`.
pub async fn opt_in(app: &TestApp, phone: &str, cpf: &str) -> Response<Body> {
    post_json_auth(
        &app.router,
        &format!("/api/v1/phone/{phone}/opt-in"),
        &app.citizen_token(cpf),
        json!({ "cpf": cpf, "channel": "whatsapp" }),
    )
    .await
}
