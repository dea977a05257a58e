use std::collections::{HashMap, HashSet};

use color_eyre::{
    eyre::{bail, WrapErr},
    Result,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    ingredients::{Ingredient, IngredientInput},
    pantry::{PantryItem, PantryItemInput},
    recipes::{Recipe, RecipeInput},
};

const SEED_JSON: &str = include_str!("../seed/flavorhub.json");

/// Sample data bundled into the binary
#[derive(Debug, Clone, Deserialize)]
pub struct SeedData {
    pub ingredients: Vec<IngredientInput>,
    pub recipes: Vec<RecipeInput>,
    pub pantry: SeedPantry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedPantry {
    pub user_id: i64,
    pub items: Vec<SeedPantryItem>,
}

/// Pantry entries refer to ingredients by name since ids are assigned on insert
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPantryItem {
    pub ingredient_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub ingredients: usize,
    pub recipes: usize,
    pub pantry_items: usize,
}

impl SeedData {
    pub fn load() -> Result<Self> {
        serde_json::from_str(SEED_JSON).wrap_err("Failed to parse the bundled seed data")
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for ingredient in &self.ingredients {
            ingredient
                .validate()
                .wrap_err_with(|| format!("Invalid seed ingredient {:?}", ingredient.name))?;

            if !names.insert(normalize(&ingredient.name)) {
                bail!("Duplicate seed ingredient {:?}", ingredient.name);
            }
        }

        for recipe in &self.recipes {
            recipe
                .validate()
                .wrap_err_with(|| format!("Invalid seed recipe {:?}", recipe.name))?;
        }

        for item in &self.pantry.items {
            if !names.contains(&normalize(&item.ingredient_name)) {
                bail!(
                    "Seed pantry item {:?} is not a known ingredient",
                    item.ingredient_name
                );
            }
        }

        Ok(())
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Loads the bundled sample data into an empty database.
///
/// Returns `None` without touching anything when ingredients already exist.
#[tracing::instrument(skip(pool), err)]
pub async fn seed(pool: &SqlitePool) -> Result<Option<SeedSummary>> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ingredients")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        tracing::info!(existing, "Database already has ingredients, skipping seed");
        return Ok(None);
    }

    let data = SeedData::load()?;
    let mut summary = SeedSummary::default();
    let mut ids_by_name = HashMap::new();

    let mut tx = pool.begin().await?;

    for input in &data.ingredients {
        let ingredient = Ingredient::insert(&mut tx, input)
            .await
            .wrap_err_with(|| format!("Failed to seed ingredient {:?}", input.name))?;
        ids_by_name.insert(normalize(&ingredient.name), ingredient.id);
        summary.ingredients += 1;
    }

    for input in &data.recipes {
        Recipe::insert(&mut tx, input)
            .await
            .wrap_err_with(|| format!("Failed to seed recipe {:?}", input.name))?;
        summary.recipes += 1;
    }

    for item in data.pantry.items {
        let Some(&ingredient_id) = ids_by_name.get(&normalize(&item.ingredient_name)) else {
            tracing::warn!(
                ingredient = %item.ingredient_name,
                "Skipping seed pantry item for unknown ingredient"
            );
            continue;
        };

        let input = PantryItemInput {
            ingredient_id,
            quantity: item.quantity,
            unit: item.unit,
            notes: item.notes,
        };
        PantryItem::insert(&mut tx, data.pantry.user_id, &input).await?;
        summary.pantry_items += 1;
    }

    tx.commit().await?;

    tracing::info!(
        ingredients = summary.ingredients,
        recipes = summary.recipes,
        pantry_items = summary.pantry_items,
        "Seeded sample data"
    );

    Ok(Some(summary))
}
