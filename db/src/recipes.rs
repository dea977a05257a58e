use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    contains_ignoring_case,
    validation::{at_least, require, ValidationError},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub prep_time: Option<i32>, // minutes
    pub cook_time: Option<i32>, // minutes
    pub servings: Option<i32>,
    pub difficulty_level: Option<String>,
    pub cuisine_type: Option<String>,
    pub image_url: Option<String>,
}

impl RecipeIngredient {
    /// The line as it is stored, with the ingredient name trimmed
    fn trimmed(&self) -> Self {
        Self {
            ingredient_name: self.ingredient_name.trim().to_string(),
            ..self.clone()
        }
    }
}

impl Recipe {
    pub fn total_time(&self) -> i32 {
        self.prep_time.unwrap_or(0) + self.cook_time.unwrap_or(0)
    }
}

/// One line of a recipe's ingredient list. Ingredients are referenced by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipeIngredient {
    #[serde(default, alias = "ingredientName")]
    pub ingredient_name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>, // e.g. "chopped", "optional"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeWithDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeInput {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(alias = "prepTime")]
    pub prep_time: Option<i32>,
    #[serde(alias = "cookTime")]
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    #[serde(alias = "difficultyLevel")]
    pub difficulty_level: Option<String>,
    #[serde(alias = "cuisineType")]
    pub cuisine_type: Option<String>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl RecipeInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        at_least("prep_time", self.prep_time, 0)?;
        at_least("cook_time", self.cook_time, 0)?;
        at_least("servings", self.servings, 1)?;

        for ingredient in &self.ingredients {
            require("ingredient_name", &ingredient.ingredient_name)?;
            at_least("quantity", ingredient.quantity, 0.0)?;
        }

        Ok(())
    }
}

/// Every criterion that is set must hold
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeFilter {
    pub difficulty: Option<String>,
    pub cuisine: Option<String>,
    #[serde(alias = "maxTotalTime")]
    pub max_total_time: Option<i32>,
    pub ingredient: Option<String>,
    pub query: Option<String>,
}

impl Recipe {
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<RecipeWithDetails>> {
        Self::filter(pool, &RecipeFilter::default()).await
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<RecipeWithDetails>> {
        let recipe = sqlx::query_as::<_, Recipe>(
            "
            SELECT
                id,
                name,
                description,
                prep_time,
                cook_time,
                servings,
                difficulty_level,
                cuisine_type,
                image_url
            FROM recipes
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match recipe {
            Some(recipe) => Ok(Some(RecipeWithDetails::load(pool, recipe).await?)),
            None => Ok(None),
        }
    }

    pub async fn search(pool: &SqlitePool, term: &str) -> Result<Vec<RecipeWithDetails>> {
        let filter = RecipeFilter {
            query: Some(term.to_string()),
            ..Default::default()
        };

        Self::filter(pool, &filter).await
    }

    pub async fn get_by_difficulty(
        pool: &SqlitePool,
        difficulty_level: &str,
    ) -> Result<Vec<RecipeWithDetails>> {
        let filter = RecipeFilter {
            difficulty: Some(difficulty_level.to_string()),
            ..Default::default()
        };

        Self::filter(pool, &filter).await
    }

    pub async fn get_by_cuisine(
        pool: &SqlitePool,
        cuisine_type: &str,
    ) -> Result<Vec<RecipeWithDetails>> {
        let filter = RecipeFilter {
            cuisine: Some(cuisine_type.to_string()),
            ..Default::default()
        };

        Self::filter(pool, &filter).await
    }

    /// Recipes whose prep + cook time fits in `minutes`
    pub async fn get_by_max_total_time(
        pool: &SqlitePool,
        minutes: i32,
    ) -> Result<Vec<RecipeWithDetails>> {
        let filter = RecipeFilter {
            max_total_time: Some(minutes),
            ..Default::default()
        };

        Self::filter(pool, &filter).await
    }

    pub async fn get_containing_ingredient(
        pool: &SqlitePool,
        ingredient_name: &str,
    ) -> Result<Vec<RecipeWithDetails>> {
        let filter = RecipeFilter {
            ingredient: Some(ingredient_name.to_string()),
            ..Default::default()
        };

        Self::filter(pool, &filter).await
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn filter(pool: &SqlitePool, filter: &RecipeFilter) -> Result<Vec<RecipeWithDetails>> {
        let recipes = sqlx::query_as::<_, Recipe>(
            "
            SELECT
                id,
                name,
                description,
                prep_time,
                cook_time,
                servings,
                difficulty_level,
                cuisine_type,
                image_url
            FROM recipes
            WHERE (?1 IS NULL OR difficulty_level = ?1 COLLATE UNICASE)
              AND (?2 IS NULL OR cuisine_type = ?2 COLLATE UNICASE)
              AND (?3 IS NULL OR COALESCE(prep_time, 0) + COALESCE(cook_time, 0) <= ?3)
              AND (?4 IS NULL OR EXISTS (
                    SELECT 1
                    FROM recipe_ingredients ri
                    WHERE ri.recipe_id = recipes.id
                      AND ri.ingredient_name = ?4 COLLATE UNICASE
                  ))
            ORDER BY id
            ",
        )
        .bind(&filter.difficulty)
        .bind(&filter.cuisine)
        .bind(filter.max_total_time)
        .bind(filter.ingredient.as_deref().map(str::trim))
        .fetch_all(pool)
        .await?;

        let recipes = match &filter.query {
            Some(query) => recipes
                .into_iter()
                .filter(|recipe| contains_ignoring_case(&recipe.name, query))
                .collect(),
            None => recipes,
        };

        RecipeWithDetails::load_all(pool, recipes).await
    }

    #[tracing::instrument(skip_all, fields(name = %input.name), err)]
    pub async fn create(pool: &SqlitePool, input: RecipeInput) -> Result<RecipeWithDetails> {
        input.validate()?;

        let mut tx = pool.begin().await?;
        let recipe = Self::insert(&mut tx, &input).await?;
        tx.commit().await?;

        tracing::info!(recipe_id = recipe.recipe.id, "Recipe created");

        Ok(recipe)
    }

    /// Inserts the recipe and its child rows. The caller owns the transaction.
    pub(crate) async fn insert(
        conn: &mut SqliteConnection,
        input: &RecipeInput,
    ) -> Result<RecipeWithDetails> {
        let recipe = sqlx::query_as::<_, Recipe>(
            "
            INSERT INTO recipes (
                name, description, prep_time, cook_time, servings,
                difficulty_level, cuisine_type, image_url
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                name,
                description,
                prep_time,
                cook_time,
                servings,
                difficulty_level,
                cuisine_type,
                image_url
            ",
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.prep_time)
        .bind(input.cook_time)
        .bind(input.servings)
        .bind(&input.difficulty_level)
        .bind(&input.cuisine_type)
        .bind(&input.image_url)
        .fetch_one(&mut *conn)
        .await?;

        let ingredients = insert_children(conn, recipe.id, input).await?;

        Ok(RecipeWithDetails {
            recipe,
            ingredients,
            instructions: input.instructions.clone(),
        })
    }

    /// Replaces the recipe row and all of its ingredient and instruction rows
    #[tracing::instrument(skip(pool, input), err)]
    pub async fn update(
        pool: &SqlitePool,
        id: i64,
        input: RecipeInput,
    ) -> Result<Option<RecipeWithDetails>> {
        input.validate()?;

        let mut tx = pool.begin().await?;

        let recipe = sqlx::query_as::<_, Recipe>(
            "
            UPDATE recipes
            SET name = ?,
                description = ?,
                prep_time = ?,
                cook_time = ?,
                servings = ?,
                difficulty_level = ?,
                cuisine_type = ?,
                image_url = ?
            WHERE id = ?
            RETURNING
                id,
                name,
                description,
                prep_time,
                cook_time,
                servings,
                difficulty_level,
                cuisine_type,
                image_url
            ",
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.prep_time)
        .bind(input.cook_time)
        .bind(input.servings)
        .bind(&input.difficulty_level)
        .bind(&input.cuisine_type)
        .bind(&input.image_url)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(recipe) = recipe else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipe_instructions WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let ingredients = insert_children(&mut tx, id, &input).await?;

        tx.commit().await?;

        Ok(Some(RecipeWithDetails {
            recipe,
            ingredients,
            instructions: input.instructions,
        }))
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Writes the ingredient lines and instructions, returning the lines as stored
async fn insert_children(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    input: &RecipeInput,
) -> Result<Vec<RecipeIngredient>> {
    let ingredients: Vec<RecipeIngredient> =
        input.ingredients.iter().map(RecipeIngredient::trimmed).collect();

    for (position, ingredient) in ingredients.iter().enumerate() {
        sqlx::query(
            "
            INSERT INTO recipe_ingredients (
                recipe_id, position, ingredient_name, quantity, unit, notes
            )
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(recipe_id)
        .bind(i64::try_from(position)?)
        .bind(&ingredient.ingredient_name)
        .bind(ingredient.quantity)
        .bind(&ingredient.unit)
        .bind(&ingredient.notes)
        .execute(&mut *conn)
        .await?;
    }

    for (step_number, instruction) in input.instructions.iter().enumerate() {
        sqlx::query(
            "
            INSERT INTO recipe_instructions (recipe_id, step_number, instruction)
            VALUES (?, ?, ?)
            ",
        )
        .bind(recipe_id)
        .bind(i64::try_from(step_number)?)
        .bind(instruction)
        .execute(&mut *conn)
        .await?;
    }

    Ok(ingredients)
}

impl RecipeIngredient {
    pub async fn get_by_recipe(pool: &SqlitePool, recipe_id: i64) -> Result<Vec<Self>> {
        let ingredients = sqlx::query_as::<_, RecipeIngredient>(
            "
            SELECT ingredient_name, quantity, unit, notes
            FROM recipe_ingredients
            WHERE recipe_id = ?
            ORDER BY position
            ",
        )
        .bind(recipe_id)
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }
}

impl RecipeWithDetails {
    pub async fn load(pool: &SqlitePool, recipe: Recipe) -> Result<Self> {
        let ingredients = RecipeIngredient::get_by_recipe(pool, recipe.id).await?;

        let instructions = sqlx::query_scalar::<_, String>(
            "
            SELECT instruction
            FROM recipe_instructions
            WHERE recipe_id = ?
            ORDER BY step_number
            ",
        )
        .bind(recipe.id)
        .fetch_all(pool)
        .await?;

        Ok(Self {
            recipe,
            ingredients,
            instructions,
        })
    }

    pub async fn load_all(pool: &SqlitePool, recipes: Vec<Recipe>) -> Result<Vec<Self>> {
        let mut detailed = Vec::with_capacity(recipes.len());
        for recipe in recipes {
            detailed.push(Self::load(pool, recipe).await?);
        }

        Ok(detailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_seeded_test_db, create_test_db};

    fn line(name: &str, quantity: f64, unit: &str) -> RecipeIngredient {
        RecipeIngredient {
            ingredient_name: name.to_string(),
            quantity: Some(quantity),
            unit: Some(unit.to_string()),
            notes: None,
        }
    }

    fn names(recipes: &[RecipeWithDetails]) -> Vec<&str> {
        recipes.iter().map(|r| r.recipe.name.as_str()).collect()
    }

    fn toast() -> RecipeInput {
        RecipeInput {
            name: "Buttered Toast".to_string(),
            description: Some("Breakfast of champions".to_string()),
            prep_time: Some(1),
            cook_time: Some(3),
            servings: Some(1),
            difficulty_level: Some("Easy".to_string()),
            cuisine_type: Some("American".to_string()),
            image_url: None,
            ingredients: vec![line("Bread", 2.0, "slices"), line("Butter", 1.0, "tablespoons")],
            instructions: vec!["Toast the bread".to_string(), "Spread the butter".to_string()],
        }
    }

    #[tokio::test]
    async fn create_round_trips_children_in_order() {
        let pool = create_test_db().await;

        let created = Recipe::create(&pool, toast()).await.unwrap();
        let fetched = Recipe::get_by_id(&pool, created.recipe.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.ingredients[0].ingredient_name, "Bread");
        assert_eq!(fetched.instructions[1], "Spread the butter");
        assert_eq!(fetched.recipe.total_time(), 4);
    }

    #[tokio::test]
    async fn saved_lines_match_what_is_returned() {
        let pool = create_test_db().await;
        let mut padded = toast();
        padded.ingredients[0].ingredient_name = "  Bread ".to_string();

        let created = Recipe::create(&pool, padded.clone()).await.unwrap();
        let fetched = Recipe::get_by_id(&pool, created.recipe.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created, fetched);
        assert_eq!(created.ingredients[0].ingredient_name, "Bread");

        padded.ingredients[1].ingredient_name = "\tButter".to_string();
        let updated = Recipe::update(&pool, created.recipe.id, padded)
            .await
            .unwrap()
            .unwrap();
        let fetched = Recipe::get_by_id(&pool, created.recipe.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated, fetched);
        assert_eq!(updated.ingredients[1].ingredient_name, "Butter");
    }

    #[tokio::test]
    async fn invalid_recipes_are_not_saved() {
        let pool = create_test_db().await;

        let mut no_servings = toast();
        no_servings.servings = Some(0);
        let err = Recipe::create(&pool, no_servings).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::TooSmall {
                field: "servings",
                min: 1.0
            })
        );

        let mut negative_prep = toast();
        negative_prep.prep_time = Some(-5);
        assert!(Recipe::create(&pool, negative_prep).await.is_err());

        let mut nameless_line = toast();
        nameless_line.ingredients.push(line(" ", 1.0, "cups"));
        assert!(Recipe::create(&pool, nameless_line).await.is_err());

        assert!(Recipe::list_all(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_children() {
        let pool = create_test_db().await;
        let created = Recipe::create(&pool, toast()).await.unwrap();

        let mut changed = toast();
        changed.name = "Cinnamon Toast".to_string();
        changed.ingredients.push(line("Cinnamon", 0.5, "teaspoons"));
        changed.instructions = vec!["Do it all at once".to_string()];

        let updated = Recipe::update(&pool, created.recipe.id, changed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.recipe.id, created.recipe.id);

        let fetched = Recipe::get_by_id(&pool, created.recipe.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.recipe.name, "Cinnamon Toast");
        assert_eq!(fetched.ingredients.len(), 3);
        assert_eq!(fetched.instructions, vec!["Do it all at once"]);

        assert_eq!(Recipe::update(&pool, 999, toast()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_cascades_to_children() {
        let pool = create_test_db().await;
        let created = Recipe::create(&pool, toast()).await.unwrap();

        assert!(Recipe::delete(&pool, created.recipe.id).await.unwrap());
        assert!(!Recipe::delete(&pool, created.recipe.id).await.unwrap());

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipe_ingredients")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn queries_over_seed_data() {
        let pool = create_seeded_test_db().await;

        let italian = Recipe::get_by_cuisine(&pool, "italian").await.unwrap();
        assert_eq!(italian.len(), 5);

        let hard = Recipe::get_by_difficulty(&pool, "Hard").await.unwrap();
        let names: Vec<_> = hard.iter().map(|r| r.recipe.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Creamy Mushroom Risotto",
                "Beef Bourguignon",
                "Molten Chocolate Lava Cake"
            ]
        );

        let quick = Recipe::get_by_max_total_time(&pool, 20).await.unwrap();
        let names: Vec<_> = quick.iter().map(|r| r.recipe.name.as_str()).collect();
        assert_eq!(names, vec!["Quick Vegetable Stir-Fry"]);
        assert!(Recipe::get_by_max_total_time(&pool, 0).await.unwrap().is_empty());

        let with_shrimp = Recipe::get_containing_ingredient(&pool, "SHRIMP").await.unwrap();
        let names: Vec<_> = with_shrimp.iter().map(|r| r.recipe.name.as_str()).collect();
        assert_eq!(names, vec!["Authentic Pad Thai", "Garlic Shrimp Scampi"]);

        let chicken = Recipe::search(&pool, "chicken").await.unwrap();
        assert_eq!(chicken.len(), 2);
    }

    #[tokio::test]
    async fn accented_names_match_in_any_case() {
        let pool = create_test_db().await;
        let mut salsa = toast();
        salsa.name = "Salsa Jalapeño".to_string();
        salsa.ingredients = vec![line("Jalapeño", 2.0, "whole")];
        Recipe::create(&pool, salsa).await.unwrap();
        Recipe::create(&pool, toast()).await.unwrap();

        let spicy = Recipe::get_containing_ingredient(&pool, "JALAPEÑO").await.unwrap();
        assert_eq!(names(&spicy), vec!["Salsa Jalapeño"]);

        let found = Recipe::search(&pool, "PEÑO").await.unwrap();
        assert_eq!(names(&found), vec!["Salsa Jalapeño"]);
    }

    #[tokio::test]
    async fn filter_combines_criteria() {
        let pool = create_seeded_test_db().await;

        let filter = RecipeFilter {
            cuisine: Some("Italian".to_string()),
            max_total_time: Some(30),
            ingredient: Some("Eggs".to_string()),
            ..Default::default()
        };
        let found = Recipe::filter(&pool, &filter).await.unwrap();
        let names: Vec<_> = found.iter().map(|r| r.recipe.name.as_str()).collect();
        assert_eq!(names, vec!["Classic Spaghetti Carbonara"]);

        let everything = Recipe::filter(&pool, &RecipeFilter::default()).await.unwrap();
        assert_eq!(everything.len(), 14);
    }
}
