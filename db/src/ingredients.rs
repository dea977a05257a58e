use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    contains_ignoring_case,
    validation::{require, ValidationError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub category: Option<String>, // e.g. "Dairy", "Vegetable", "Spice"
    pub unit: Option<String>,     // default unit, e.g. "cups", "whole"
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientInput {
    #[serde(default)]
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
}

impl IngredientInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

impl Ingredient {
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "
            SELECT id, name, category, unit
            FROM ingredients
            ORDER BY id
            ",
        )
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            SELECT id, name, category, unit
            FROM ingredients
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(ingredient)
    }

    /// Case-insensitive exact match on the name
    pub async fn get_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Self>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            SELECT id, name, category, unit
            FROM ingredients
            WHERE name = ? COLLATE UNICASE
            ",
        )
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;

        Ok(ingredient)
    }

    pub async fn get_by_category(pool: &SqlitePool, category: &str) -> Result<Vec<Self>> {
        let ingredients = sqlx::query_as::<_, Ingredient>(
            "
            SELECT id, name, category, unit
            FROM ingredients
            WHERE category = ? COLLATE UNICASE
            ORDER BY id
            ",
        )
        .bind(category)
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }

    /// Case-insensitive substring match on the name
    pub async fn search(pool: &SqlitePool, term: &str) -> Result<Vec<Self>> {
        let ingredients = Self::list_all(pool).await?;

        Ok(ingredients
            .into_iter()
            .filter(|ingredient| contains_ignoring_case(&ingredient.name, term))
            .collect())
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn create(pool: &SqlitePool, input: IngredientInput) -> Result<Self> {
        input.validate()?;

        let mut conn = pool.acquire().await?;
        Self::insert(&mut conn, &input).await
    }

    pub(crate) async fn insert(conn: &mut SqliteConnection, input: &IngredientInput) -> Result<Self> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            INSERT INTO ingredients (name, category, unit)
            VALUES (?, ?, ?)
            RETURNING id, name, category, unit
            ",
        )
        .bind(input.name.trim())
        .bind(&input.category)
        .bind(&input.unit)
        .fetch_one(conn)
        .await?;

        Ok(ingredient)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn update(pool: &SqlitePool, id: i64, input: IngredientInput) -> Result<Option<Self>> {
        input.validate()?;

        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            UPDATE ingredients
            SET name = ?,
                category = ?,
                unit = ?
            WHERE id = ?
            RETURNING id, name, category, unit
            ",
        )
        .bind(input.name.trim())
        .bind(input.category)
        .bind(input.unit)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(ingredient)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
