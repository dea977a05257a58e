use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use color_eyre::eyre::{eyre, WrapErr};
use db::{
    pantry::{PantryItem, PantryItemInput, PantryUpdate},
    SqlitePool,
};
use serde::{Deserialize, Serialize};

use crate::{
    http_server::{
        errors::{ServerError, WithStatus as _},
        ResponseResult,
    },
    state::USER_ID,
    AppState,
};

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct CheckQuery {
    ingredient: String,
    quantity: f64,
    unit: Option<String>,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_pantry).post(add_pantry_item).delete(clear_pantry),
        )
        .route("/ingredients", get(pantry_ingredient_names))
        .route("/check", get(check_pantry))
        .route(
            "/{id}",
            get(get_pantry_item)
                .put(update_pantry_item)
                .delete(delete_pantry_item),
        )
}

/// Items that belong to someone else are reported as missing
async fn find_own_item(pool: &SqlitePool, id: i64) -> ResponseResult<PantryItem> {
    PantryItem::get_by_id(pool, id)
        .await
        .wrap_err("Failed to fetch pantry item")?
        .filter(|item| item.user_id == USER_ID)
        .ok_or_else(|| eyre!("Pantry item {id} not found"))
        .with_status(StatusCode::NOT_FOUND)
}

#[axum_macros::debug_handler]
async fn list_pantry(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    let items = PantryItem::list_for_user(state.db(), USER_ID)
        .await
        .wrap_err("Failed to fetch pantry")?;

    Ok(Json(items))
}

#[axum_macros::debug_handler]
async fn get_pantry_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let item = find_own_item(state.db(), id).await?;

    Ok(Json(item))
}

#[axum_macros::debug_handler]
async fn pantry_ingredient_names(
    State(state): State<AppState>,
) -> ResponseResult<impl IntoResponse> {
    let names = PantryItem::ingredient_names_for_user(state.db(), USER_ID)
        .await
        .wrap_err("Failed to fetch pantry ingredients")?;

    Ok(Json(names))
}

#[axum_macros::debug_handler]
async fn check_pantry(
    State(state): State<AppState>,
    Query(CheckQuery {
        ingredient,
        quantity,
        unit,
    }): Query<CheckQuery>,
) -> ResponseResult<impl IntoResponse> {
    if quantity < 0.0 {
        return Err(ServerError(
            eyre!("quantity must be at least 0"),
            StatusCode::BAD_REQUEST,
        ));
    }

    let check =
        PantryItem::has_sufficient(state.db(), USER_ID, &ingredient, quantity, unit.as_deref())
            .await
            .wrap_err("Failed to check pantry")?;

    Ok(Json(check))
}

#[axum_macros::debug_handler]
async fn add_pantry_item(
    State(state): State<AppState>,
    Json(input): Json<PantryItemInput>,
) -> ResponseResult<impl IntoResponse> {
    let item = PantryItem::create(state.db(), USER_ID, input)
        .await
        .wrap_err("Failed to add pantry item")?;

    Ok((StatusCode::CREATED, Json(item)))
}

#[axum_macros::debug_handler]
async fn update_pantry_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<PantryUpdate>,
) -> ResponseResult<impl IntoResponse> {
    find_own_item(state.db(), id).await?;

    let item = PantryItem::update(state.db(), id, update)
        .await
        .wrap_err("Failed to update pantry item")?
        .ok_or_else(|| eyre!("Pantry item {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(item))
}

#[axum_macros::debug_handler]
async fn delete_pantry_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let owned = PantryItem::get_by_id(state.db(), id)
        .await
        .wrap_err("Failed to fetch pantry item")?
        .is_some_and(|item| item.user_id == USER_ID);

    if owned {
        PantryItem::delete(state.db(), id)
            .await
            .wrap_err("Failed to delete pantry item")?;
    }

    Ok(StatusCode::NO_CONTENT)
}

#[axum_macros::debug_handler]
async fn clear_pantry(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    PantryItem::clear_for_user(state.db(), USER_ID)
        .await
        .wrap_err("Failed to clear pantry")?;

    Ok(StatusCode::NO_CONTENT)
}
