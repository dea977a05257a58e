use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    ingredients::Ingredient,
    validation::{at_least, ValidationError},
};

/// An ingredient in a user's pantry, with the ingredient joined in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PantryItem {
    pub id: i64,
    pub user_id: i64,
    pub ingredient: Ingredient,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>, // e.g. "expires soon", "in freezer"
}

#[derive(sqlx::FromRow)]
struct PantryRow {
    id: i64,
    user_id: i64,
    quantity: Option<f64>,
    unit: Option<String>,
    notes: Option<String>,
    ingredient_id: i64,
    ingredient_name: String,
    ingredient_category: Option<String>,
    ingredient_unit: Option<String>,
}

impl From<PantryRow> for PantryItem {
    fn from(row: PantryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            ingredient: Ingredient {
                id: row.ingredient_id,
                name: row.ingredient_name,
                category: row.ingredient_category,
                unit: row.ingredient_unit,
            },
            quantity: row.quantity,
            unit: row.unit,
            notes: row.notes,
        }
    }
}

const PANTRY_SELECT: &str = "
    SELECT
        p.id,
        p.user_id,
        p.quantity,
        p.unit,
        p.notes,
        i.id AS ingredient_id,
        i.name AS ingredient_name,
        i.category AS ingredient_category,
        i.unit AS ingredient_unit
    FROM user_pantry p
    JOIN ingredients i ON i.id = p.ingredient_id
";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "PantryItemBody")]
pub struct PantryItemInput {
    pub ingredient_id: i64,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

/// The ingredient can be given as `ingredient_id` or nested as `"ingredient": { "id": .. }`
#[derive(Deserialize)]
struct PantryItemBody {
    #[serde(alias = "ingredientId")]
    ingredient_id: Option<i64>,
    ingredient: Option<IngredientRef>,
    quantity: Option<f64>,
    unit: Option<String>,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct IngredientRef {
    id: i64,
}

impl TryFrom<PantryItemBody> for PantryItemInput {
    type Error = &'static str;

    fn try_from(body: PantryItemBody) -> Result<Self, Self::Error> {
        let ingredient_id = body
            .ingredient_id
            .or(body.ingredient.map(|ingredient| ingredient.id))
            .ok_or("ingredient_id is required")?;

        Ok(Self {
            ingredient_id,
            quantity: body.quantity,
            unit: body.unit,
            notes: body.notes,
        })
    }
}

impl PantryItemInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        at_least("quantity", self.quantity, 0.0)
    }
}

/// The fields of a pantry item that can change after it is added
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PantryUpdate {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

impl PantryUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        at_least("quantity", self.quantity, 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SufficiencyCheck {
    pub ingredient_name: String,
    pub required: f64,
    pub available: f64,
    pub unit: Option<String>,
    pub sufficient: bool,
}

impl PantryItem {
    pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, PantryRow>(&format!(
            "{PANTRY_SELECT} WHERE p.user_id = ? ORDER BY p.id"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, PantryRow>(&format!("{PANTRY_SELECT} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    pub async fn get_by_user_and_ingredient(
        pool: &SqlitePool,
        user_id: i64,
        ingredient_id: i64,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, PantryRow>(&format!(
            "{PANTRY_SELECT} WHERE p.user_id = ? AND p.ingredient_id = ? ORDER BY p.id LIMIT 1"
        ))
        .bind(user_id)
        .bind(ingredient_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Into::into))
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn create(pool: &SqlitePool, user_id: i64, input: PantryItemInput) -> Result<Self> {
        input.validate()?;

        if Ingredient::get_by_id(pool, input.ingredient_id).await?.is_none() {
            return Err(ValidationError::UnknownIngredient(input.ingredient_id).into());
        }

        let id = {
            let mut conn = pool.acquire().await?;
            Self::insert(&mut conn, user_id, &input).await?
        };

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| color_eyre::eyre::eyre!("Pantry item {id} vanished after insert"))
    }

    pub(crate) async fn insert(
        conn: &mut SqliteConnection,
        user_id: i64,
        input: &PantryItemInput,
    ) -> Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "
            INSERT INTO user_pantry (user_id, ingredient_id, quantity, unit, notes)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(input.ingredient_id)
        .bind(input.quantity)
        .bind(&input.unit)
        .bind(&input.notes)
        .fetch_one(conn)
        .await;

        // The ingredient can disappear between the existence check and the insert
        match id {
            Err(err)
                if err
                    .as_database_error()
                    .is_some_and(|db_err| db_err.is_foreign_key_violation()) =>
            {
                Err(ValidationError::UnknownIngredient(input.ingredient_id).into())
            }
            result => Ok(result?),
        }
    }

    /// Changes quantity, unit and notes. The user and ingredient stay as they were.
    #[tracing::instrument(skip(pool), err)]
    pub async fn update(pool: &SqlitePool, id: i64, update: PantryUpdate) -> Result<Option<Self>> {
        update.validate()?;

        let result = sqlx::query(
            "
            UPDATE user_pantry
            SET quantity = ?,
                unit = ?,
                notes = ?
            WHERE id = ?
            ",
        )
        .bind(update.quantity)
        .bind(update.unit)
        .bind(update.notes)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::get_by_id(pool, id).await
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_pantry WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn clear_for_user(pool: &SqlitePool, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM user_pantry WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        tracing::info!(removed = result.rows_affected(), "Pantry cleared");

        Ok(result.rows_affected())
    }

    pub async fn ingredient_names_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            "
            SELECT DISTINCT i.name
            FROM user_pantry p
            JOIN ingredients i ON i.id = p.ingredient_id
            WHERE p.user_id = ?
            ORDER BY i.name
            ",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(names)
    }

    /// Adds up every matching pantry row for the ingredient. When `unit` is given only rows
    /// in that unit count, since quantities in different units can't be summed.
    #[tracing::instrument(skip(pool), err)]
    pub async fn has_sufficient(
        pool: &SqlitePool,
        user_id: i64,
        ingredient_name: &str,
        required: f64,
        unit: Option<&str>,
    ) -> Result<SufficiencyCheck> {
        let available = sqlx::query_scalar::<_, f64>(
            "
            SELECT CAST(COALESCE(SUM(p.quantity), 0) AS REAL)
            FROM user_pantry p
            JOIN ingredients i ON i.id = p.ingredient_id
            WHERE p.user_id = ?1
              AND i.name = ?2 COLLATE UNICASE
              AND (?3 IS NULL OR p.unit = ?3 COLLATE UNICASE)
            ",
        )
        .bind(user_id)
        .bind(ingredient_name.trim())
        .bind(unit)
        .fetch_one(pool)
        .await?;

        Ok(SufficiencyCheck {
            ingredient_name: ingredient_name.trim().to_string(),
            required,
            available,
            unit: unit.map(ToString::to_string),
            sufficient: available >= required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ingredients::IngredientInput,
        test_utils::{create_seeded_test_db, create_test_db},
    };

    async fn ingredient(pool: &SqlitePool, name: &str) -> Ingredient {
        Ingredient::create(
            pool,
            IngredientInput {
                name: name.to_string(),
                category: Some("Dairy".to_string()),
                unit: Some("cups".to_string()),
            },
        )
        .await
        .unwrap()
    }

    fn item(ingredient_id: i64, quantity: f64, unit: &str) -> PantryItemInput {
        PantryItemInput {
            ingredient_id,
            quantity: Some(quantity),
            unit: Some(unit.to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_joins_the_ingredient() {
        let pool = create_test_db().await;
        let milk = ingredient(&pool, "Milk").await;

        let created = PantryItem::create(&pool, 1, item(milk.id, 2.0, "cups"))
            .await
            .unwrap();

        assert_eq!(created.user_id, 1);
        assert_eq!(created.ingredient, milk);
        assert_eq!(created.quantity, Some(2.0));

        let found = PantryItem::get_by_user_and_ingredient(&pool, 1, milk.id)
            .await
            .unwrap();
        assert_eq!(found, Some(created));
        assert_eq!(
            PantryItem::get_by_user_and_ingredient(&pool, 2, milk.id)
                .await
                .unwrap(),
            None
        );
    }

    #[test]
    fn input_accepts_a_nested_ingredient() {
        let flat: PantryItemInput =
            serde_json::from_value(serde_json::json!({ "ingredient_id": 3, "quantity": 2.0 }))
                .unwrap();
        assert_eq!(flat.ingredient_id, 3);
        assert_eq!(flat.quantity, Some(2.0));

        let nested: PantryItemInput = serde_json::from_value(serde_json::json!({
            "ingredient": { "id": 4, "name": "Milk" },
            "unit": "cups"
        }))
        .unwrap();
        assert_eq!(nested.ingredient_id, 4);
        assert_eq!(nested.unit.as_deref(), Some("cups"));

        let camel: PantryItemInput =
            serde_json::from_value(serde_json::json!({ "ingredientId": 5 })).unwrap();
        assert_eq!(camel.ingredient_id, 5);

        let err = serde_json::from_value::<PantryItemInput>(serde_json::json!({ "quantity": 1.0 }))
            .unwrap_err();
        assert!(err.to_string().contains("ingredient_id is required"));
    }

    #[tokio::test]
    async fn unknown_ingredients_are_rejected() {
        let pool = create_test_db().await;

        let err = PantryItem::create(&pool, 1, item(404, 1.0, "cups"))
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::UnknownIngredient(404))
        );
    }

    #[tokio::test]
    async fn missing_ingredient_at_insert_time_is_a_validation_error() {
        let pool = create_test_db().await;
        let mut conn = pool.acquire().await.unwrap();

        let err = PantryItem::insert(&mut conn, 1, &item(404, 1.0, "cups"))
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::UnknownIngredient(404))
        );
    }

    #[tokio::test]
    async fn negative_quantities_are_rejected() {
        let pool = create_test_db().await;
        let milk = ingredient(&pool, "Milk").await;

        assert!(PantryItem::create(&pool, 1, item(milk.id, -1.0, "cups"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn update_only_touches_quantity_unit_and_notes() {
        let pool = create_test_db().await;
        let milk = ingredient(&pool, "Milk").await;
        let created = PantryItem::create(&pool, 1, item(milk.id, 2.0, "cups"))
            .await
            .unwrap();

        let updated = PantryItem::update(
            &pool,
            created.id,
            PantryUpdate {
                quantity: Some(0.5),
                unit: Some("liters".to_string()),
                notes: Some("expires soon".to_string()),
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.user_id, 1);
        assert_eq!(updated.ingredient, milk);
        assert_eq!(updated.quantity, Some(0.5));
        assert_eq!(updated.unit.as_deref(), Some("liters"));
        assert_eq!(updated.notes.as_deref(), Some("expires soon"));

        let missing = PantryItem::update(&pool, 999, PantryUpdate::default())
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn clear_only_removes_one_users_items() {
        let pool = create_test_db().await;
        let milk = ingredient(&pool, "Milk").await;
        PantryItem::create(&pool, 1, item(milk.id, 2.0, "cups"))
            .await
            .unwrap();
        PantryItem::create(&pool, 1, item(milk.id, 1.0, "cups"))
            .await
            .unwrap();
        PantryItem::create(&pool, 2, item(milk.id, 3.0, "cups"))
            .await
            .unwrap();

        assert_eq!(PantryItem::clear_for_user(&pool, 1).await.unwrap(), 2);
        assert!(PantryItem::list_for_user(&pool, 1).await.unwrap().is_empty());
        assert_eq!(PantryItem::list_for_user(&pool, 2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_an_item() {
        let pool = create_test_db().await;
        let milk = ingredient(&pool, "Milk").await;
        let created = PantryItem::create(&pool, 1, item(milk.id, 2.0, "cups"))
            .await
            .unwrap();

        assert!(PantryItem::delete(&pool, created.id).await.unwrap());
        assert!(!PantryItem::delete(&pool, created.id).await.unwrap());
        assert_eq!(PantryItem::get_by_id(&pool, created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn seeded_pantry_names() {
        let pool = create_seeded_test_db().await;

        let names = PantryItem::ingredient_names_for_user(&pool, 1).await.unwrap();

        assert_eq!(names.len(), 23);
        assert_eq!(names.first().map(String::as_str), Some("Bell Pepper"));
        assert!(names.contains(&"Eggs".to_string()));
        assert!(PantryItem::ingredient_names_for_user(&pool, 2)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn sufficiency_sums_rows_in_the_same_unit() {
        let pool = create_test_db().await;
        let milk = ingredient(&pool, "Milk").await;
        PantryItem::create(&pool, 1, item(milk.id, 1.5, "cups"))
            .await
            .unwrap();
        PantryItem::create(&pool, 1, item(milk.id, 1.0, "Cups"))
            .await
            .unwrap();
        PantryItem::create(&pool, 1, item(milk.id, 500.0, "ml"))
            .await
            .unwrap();

        let check = PantryItem::has_sufficient(&pool, 1, "milk", 2.0, Some("cups"))
            .await
            .unwrap();
        assert!(check.sufficient);
        assert!((check.available - 2.5).abs() < f64::EPSILON);

        let check = PantryItem::has_sufficient(&pool, 1, "milk", 3.0, Some("cups"))
            .await
            .unwrap();
        assert!(!check.sufficient);

        let any_unit = PantryItem::has_sufficient(&pool, 1, "Milk", 100.0, None)
            .await
            .unwrap();
        assert!(any_unit.sufficient);

        let absent = PantryItem::has_sufficient(&pool, 1, "Saffron", 0.1, None)
            .await
            .unwrap();
        assert!(!absent.sufficient);
        assert!(absent.available.abs() < f64::EPSILON);
    }
}
