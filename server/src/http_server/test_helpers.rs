use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use db::SqlitePool;
use serde::de::DeserializeOwned;

use crate::{AppConfig, AppState};

pub async fn create_test_app(pool: SqlitePool) -> Router {
    let config = AppConfig {
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        seed_data: false,
    };

    crate::http_server::routes::make_router().with_state(AppState::new(config, pool))
}

/// An app backed by a fresh in-memory database with the sample data loaded
pub async fn create_seeded_test_app() -> Router {
    let pool = db::test_utils::create_seeded_test_db().await;

    create_test_app(pool).await
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn response_body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}
