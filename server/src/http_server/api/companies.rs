use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use color_eyre::eyre::{eyre, WrapErr};
use db::companies::{Company, CompanyInput};

use crate::{
    http_server::{
        errors::{ServerError, WithStatus as _},
        ResponseResult,
    },
    AppState,
};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route(
            "/{id}",
            get(get_company).put(update_company).delete(delete_company),
        )
}

#[axum_macros::debug_handler]
async fn list_companies(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    let companies = Company::list_all(state.db())
        .await
        .wrap_err("Failed to fetch companies")?;

    Ok(Json(companies))
}

#[axum_macros::debug_handler]
async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let company = Company::get_by_id(state.db(), id)
        .await
        .wrap_err("Failed to fetch company")?
        .ok_or_else(|| eyre!("Company {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(company))
}

#[axum_macros::debug_handler]
async fn create_company(
    State(state): State<AppState>,
    Json(input): Json<CompanyInput>,
) -> ResponseResult<impl IntoResponse> {
    let company = Company::create(state.db(), input)
        .await
        .wrap_err("Failed to create company")?;

    Ok(Json(company))
}

#[axum_macros::debug_handler]
async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CompanyInput>,
) -> ResponseResult<impl IntoResponse> {
    let company = Company::update(state.db(), id, input)
        .await
        .wrap_err("Failed to update company")?
        .ok_or_else(|| eyre!("Company {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(company))
}

#[axum_macros::debug_handler]
async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let deleted = Company::delete(state.db(), id)
        .await
        .wrap_err("Failed to delete company")?;
    if !deleted {
        return Err(ServerError(
            eyre!("Company {id} not found"),
            StatusCode::NOT_FOUND,
        ));
    }

    Ok(StatusCode::OK)
}
