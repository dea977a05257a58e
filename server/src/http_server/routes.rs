use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::{api, errors::ErrorResponse};
use crate::AppState;

pub(crate) fn make_router() -> Router<AppState> {
    Router::new()
        .route("/_", get(versions))
        .nest("/api/ingredients", api::ingredients::routes())
        .nest("/api/recipes", api::recipes::routes())
        .nest("/api/pantry", api::pantry::routes())
        .nest("/api/company", api::companies::routes())
        .nest("/api/employees", api::employees::routes())
        .fallback(fallback)
}

async fn versions(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "version": state.versions.version,
        "git_commit": state.versions.git_commit,
    }))
}

async fn fallback(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("No route for {}", uri.path()),
        }),
    )
}
