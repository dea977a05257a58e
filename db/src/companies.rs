use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::validation::{require, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInput {
    #[serde(default)]
    pub name: String,
    pub address: Option<String>,
}

impl CompanyInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)
    }
}

impl Company {
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>> {
        let companies =
            sqlx::query_as::<_, Company>("SELECT id, name, address FROM company ORDER BY id")
                .fetch_all(pool)
                .await?;

        Ok(companies)
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>> {
        let company =
            sqlx::query_as::<_, Company>("SELECT id, name, address FROM company WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(company)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn create(pool: &SqlitePool, input: CompanyInput) -> Result<Self> {
        input.validate()?;

        let company = sqlx::query_as::<_, Company>(
            "
            INSERT INTO company (name, address)
            VALUES (?, ?)
            RETURNING id, name, address
            ",
        )
        .bind(input.name.trim())
        .bind(input.address)
        .fetch_one(pool)
        .await?;

        Ok(company)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn update(pool: &SqlitePool, id: i64, input: CompanyInput) -> Result<Option<Self>> {
        input.validate()?;

        let company = sqlx::query_as::<_, Company>(
            "
            UPDATE company
            SET name = ?,
                address = ?
            WHERE id = ?
            RETURNING id, name, address
            ",
        )
        .bind(input.name.trim())
        .bind(input.address)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM company WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_db;

    #[tokio::test]
    async fn company_crud() {
        let pool = create_test_db().await;

        let created = Company::create(
            &pool,
            CompanyInput {
                name: "Coveros".to_string(),
                address: Some("5030 Sugarloaf Pkwy".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            Company::get_by_id(&pool, created.id).await.unwrap(),
            Some(created.clone())
        );

        let updated = Company::update(
            &pool,
            created.id,
            CompanyInput {
                name: "Coveros Inc".to_string(),
                address: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.name, "Coveros Inc");
        assert_eq!(updated.address, None);

        assert_eq!(Company::list_all(&pool).await.unwrap(), vec![updated]);

        assert!(Company::delete(&pool, created.id).await.unwrap());
        assert_eq!(Company::get_by_id(&pool, created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn company_requires_a_name() {
        let pool = create_test_db().await;

        let err = Company::create(&pool, CompanyInput::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::Required("name"))
        );
        assert_eq!(
            Company::update(&pool, 1, CompanyInput::default())
                .await
                .unwrap_err()
                .downcast_ref::<ValidationError>(),
            Some(&ValidationError::Required("name"))
        );
    }
}
