use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use color_eyre::eyre::{eyre, WrapErr};
use db::ingredients::{Ingredient, IngredientInput};
use serde::{Deserialize, Serialize};

use crate::{
    http_server::{errors::WithStatus as _, ResponseResult},
    AppState,
};

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct SearchQuery {
    query: String,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients).post(create_ingredient))
        .route("/search", get(search_ingredients))
        .route("/category/{category}", get(ingredients_by_category))
        .route("/name/{name}", get(ingredient_by_name))
        .route(
            "/{id}",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
}

#[axum_macros::debug_handler]
async fn list_ingredients(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    let ingredients = Ingredient::list_all(state.db())
        .await
        .wrap_err("Failed to fetch ingredients")?;

    Ok(Json(ingredients))
}

#[axum_macros::debug_handler]
async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let ingredient = Ingredient::get_by_id(state.db(), id)
        .await
        .wrap_err("Failed to fetch ingredient")?
        .ok_or_else(|| eyre!("Ingredient {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(ingredient))
}

#[axum_macros::debug_handler]
async fn search_ingredients(
    State(state): State<AppState>,
    Query(SearchQuery { query }): Query<SearchQuery>,
) -> ResponseResult<impl IntoResponse> {
    let ingredients = Ingredient::search(state.db(), &query)
        .await
        .wrap_err("Failed to search ingredients")?;

    Ok(Json(ingredients))
}

#[axum_macros::debug_handler]
async fn ingredients_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> ResponseResult<impl IntoResponse> {
    let ingredients = Ingredient::get_by_category(state.db(), &category)
        .await
        .wrap_err("Failed to fetch ingredients by category")?;

    Ok(Json(ingredients))
}

#[axum_macros::debug_handler]
async fn ingredient_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ResponseResult<impl IntoResponse> {
    let ingredient = Ingredient::get_by_name(state.db(), &name)
        .await
        .wrap_err("Failed to fetch ingredient")?
        .ok_or_else(|| eyre!("Ingredient {name} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(ingredient))
}

#[axum_macros::debug_handler]
async fn create_ingredient(
    State(state): State<AppState>,
    Json(input): Json<IngredientInput>,
) -> ResponseResult<impl IntoResponse> {
    let ingredient = Ingredient::create(state.db(), input)
        .await
        .wrap_err("Failed to create ingredient")?;

    Ok((StatusCode::CREATED, Json(ingredient)))
}

#[axum_macros::debug_handler]
async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<IngredientInput>,
) -> ResponseResult<impl IntoResponse> {
    let ingredient = Ingredient::update(state.db(), id, input)
        .await
        .wrap_err("Failed to update ingredient")?
        .ok_or_else(|| eyre!("Ingredient {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(ingredient))
}

#[axum_macros::debug_handler]
async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let deleted = Ingredient::delete(state.db(), id)
        .await
        .wrap_err("Failed to delete ingredient")?;
    if !deleted {
        tracing::debug!(id, "Ingredient was already gone");
    }

    Ok(StatusCode::NO_CONTENT)
}
