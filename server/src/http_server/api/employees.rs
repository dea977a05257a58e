use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use color_eyre::eyre::{eyre, WrapErr};
use db::employees::{Employee, EmployeeInput};

use crate::{
    http_server::{
        errors::{ServerError, WithStatus as _},
        ResponseResult,
    },
    AppState,
};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route("/username/{username}", get(employee_by_username))
        .route(
            "/{id}",
            get(get_employee)
                .put(update_employee)
                .delete(delete_employee),
        )
}

fn username_taken(username: &str) -> ServerError {
    ServerError(
        eyre!("Username {username} already exists"),
        StatusCode::BAD_REQUEST,
    )
}

#[axum_macros::debug_handler]
async fn list_employees(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    let employees = Employee::list_all(state.db())
        .await
        .wrap_err("Failed to fetch employees")?;

    Ok(Json(employees))
}

#[axum_macros::debug_handler]
async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let employee = Employee::get_by_id(state.db(), id)
        .await
        .wrap_err("Failed to fetch employee")?
        .ok_or_else(|| eyre!("Employee {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(employee))
}

#[axum_macros::debug_handler]
async fn employee_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ResponseResult<impl IntoResponse> {
    let employee = Employee::get_by_username(state.db(), &username)
        .await
        .wrap_err("Failed to fetch employee")?
        .ok_or_else(|| eyre!("Employee {username} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(employee))
}

#[axum_macros::debug_handler]
async fn create_employee(
    State(state): State<AppState>,
    Json(input): Json<EmployeeInput>,
) -> ResponseResult<impl IntoResponse> {
    let username = input.username.trim().to_string();
    if Employee::username_exists(state.db(), &username)
        .await
        .wrap_err("Failed to check username")?
    {
        return Err(username_taken(&username));
    }

    let employee = Employee::create(state.db(), input)
        .await
        .wrap_err("Failed to create employee")?;

    Ok(Json(employee))
}

#[axum_macros::debug_handler]
async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<EmployeeInput>,
) -> ResponseResult<impl IntoResponse> {
    let existing = Employee::get_by_id(state.db(), id)
        .await
        .wrap_err("Failed to fetch employee")?
        .ok_or_else(|| eyre!("Employee {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    let username = input.username.trim().to_string();
    if username != existing.username
        && Employee::username_exists(state.db(), &username)
            .await
            .wrap_err("Failed to check username")?
    {
        return Err(username_taken(&username));
    }

    let employee = Employee::update(state.db(), id, input)
        .await
        .wrap_err("Failed to update employee")?
        .ok_or_else(|| eyre!("Employee {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(employee))
}

#[axum_macros::debug_handler]
async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let deleted = Employee::delete(state.db(), id)
        .await
        .wrap_err("Failed to delete employee")?;
    if !deleted {
        return Err(ServerError(
            eyre!("Employee {id} not found"),
            StatusCode::NOT_FOUND,
        ));
    }

    Ok(StatusCode::OK)
}
