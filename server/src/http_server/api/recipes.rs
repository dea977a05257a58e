use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use color_eyre::eyre::{eyre, WrapErr};
use db::{
    pantry::PantryItem,
    recipes::{Recipe, RecipeFilter, RecipeInput},
};
use serde::{Deserialize, Serialize};

use crate::{
    http_server::{
        errors::{ServerError, WithStatus as _},
        ResponseResult,
    },
    recommendations::{is_valid_coverage, recommend, DEFAULT_MIN_COVERAGE},
    state::USER_ID,
    AppState,
};

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct SearchQuery {
    query: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct RecommendationQuery {
    #[serde(alias = "minCoverage")]
    min_coverage: Option<f64>,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/search", get(search_recipes))
        .route("/filter", get(filter_recipes))
        .route("/recommendations", get(recommended_recipes))
        .route("/difficulty/{level}", get(recipes_by_difficulty))
        .route("/cuisine/{cuisine_type}", get(recipes_by_cuisine))
        .route("/max-time/{minutes}", get(recipes_by_max_time))
        .route("/ingredient/{name}", get(recipes_with_ingredient))
        .route(
            "/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

#[axum_macros::debug_handler]
async fn list_recipes(State(state): State<AppState>) -> ResponseResult<impl IntoResponse> {
    let recipes = Recipe::list_all(state.db())
        .await
        .wrap_err("Failed to fetch recipes")?;

    Ok(Json(recipes))
}

#[axum_macros::debug_handler]
async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    let recipe = Recipe::get_by_id(state.db(), id)
        .await
        .wrap_err("Failed to fetch recipe")?
        .ok_or_else(|| eyre!("Recipe {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(recipe))
}

#[axum_macros::debug_handler]
async fn search_recipes(
    State(state): State<AppState>,
    Query(SearchQuery { query }): Query<SearchQuery>,
) -> ResponseResult<impl IntoResponse> {
    let recipes = Recipe::search(state.db(), &query)
        .await
        .wrap_err("Failed to search recipes")?;

    Ok(Json(recipes))
}

#[axum_macros::debug_handler]
async fn recipes_by_difficulty(
    State(state): State<AppState>,
    Path(level): Path<String>,
) -> ResponseResult<impl IntoResponse> {
    let recipes = Recipe::get_by_difficulty(state.db(), &level)
        .await
        .wrap_err("Failed to fetch recipes by difficulty")?;

    Ok(Json(recipes))
}

#[axum_macros::debug_handler]
async fn recipes_by_cuisine(
    State(state): State<AppState>,
    Path(cuisine_type): Path<String>,
) -> ResponseResult<impl IntoResponse> {
    let recipes = Recipe::get_by_cuisine(state.db(), &cuisine_type)
        .await
        .wrap_err("Failed to fetch recipes by cuisine")?;

    Ok(Json(recipes))
}

#[axum_macros::debug_handler]
async fn recipes_by_max_time(
    State(state): State<AppState>,
    Path(minutes): Path<i32>,
) -> ResponseResult<impl IntoResponse> {
    if minutes < 0 {
        return Err(ServerError(
            eyre!("minutes must be at least 0, got {minutes}"),
            StatusCode::BAD_REQUEST,
        ));
    }

    let recipes = Recipe::get_by_max_total_time(state.db(), minutes)
        .await
        .wrap_err("Failed to fetch recipes by total time")?;

    Ok(Json(recipes))
}

#[axum_macros::debug_handler]
async fn recipes_with_ingredient(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ResponseResult<impl IntoResponse> {
    let recipes = Recipe::get_containing_ingredient(state.db(), &name)
        .await
        .wrap_err("Failed to fetch recipes by ingredient")?;

    Ok(Json(recipes))
}

#[axum_macros::debug_handler]
async fn filter_recipes(
    State(state): State<AppState>,
    Query(filter): Query<RecipeFilter>,
) -> ResponseResult<impl IntoResponse> {
    if filter.max_total_time.is_some_and(|minutes| minutes < 0) {
        return Err(ServerError(
            eyre!("max_total_time must be at least 0"),
            StatusCode::BAD_REQUEST,
        ));
    }

    let recipes = Recipe::filter(state.db(), &filter)
        .await
        .wrap_err("Failed to filter recipes")?;

    Ok(Json(recipes))
}

/// Recipes ranked by how much of them is already in the pantry
#[axum_macros::debug_handler]
async fn recommended_recipes(
    State(state): State<AppState>,
    Query(RecommendationQuery { min_coverage }): Query<RecommendationQuery>,
) -> ResponseResult<impl IntoResponse> {
    let min_coverage = min_coverage.unwrap_or(DEFAULT_MIN_COVERAGE);
    if !is_valid_coverage(min_coverage) {
        return Err(ServerError(
            eyre!("min_coverage must be between 0 and 1, got {min_coverage}"),
            StatusCode::BAD_REQUEST,
        ));
    }

    let pantry_names = PantryItem::ingredient_names_for_user(state.db(), USER_ID)
        .await
        .wrap_err("Failed to fetch pantry ingredients")?;
    let recipes = Recipe::list_all(state.db())
        .await
        .wrap_err("Failed to fetch recipes")?;

    Ok(Json(recommend(recipes, &pantry_names, min_coverage)))
}

#[axum_macros::debug_handler]
async fn create_recipe(
    State(state): State<AppState>,
    Json(input): Json<RecipeInput>,
) -> ResponseResult<impl IntoResponse> {
    let recipe = Recipe::create(state.db(), input)
        .await
        .wrap_err("Failed to create recipe")?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

#[axum_macros::debug_handler]
async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<RecipeInput>,
) -> ResponseResult<impl IntoResponse> {
    let recipe = Recipe::update(state.db(), id, input)
        .await
        .wrap_err("Failed to update recipe")?
        .ok_or_else(|| eyre!("Recipe {id} not found"))
        .with_status(StatusCode::NOT_FOUND)?;

    Ok(Json(recipe))
}

#[axum_macros::debug_handler]
async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ResponseResult<impl IntoResponse> {
    Recipe::delete(state.db(), id)
        .await
        .wrap_err("Failed to delete recipe")?;

    Ok(StatusCode::NO_CONTENT)
}
