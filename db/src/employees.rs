use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::validation::{require, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub social_security_number: Option<String>,
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: String,
    #[serde(alias = "socialSecurityNumber")]
    pub social_security_number: Option<String>,
    pub occupation: Option<String>,
}

impl EmployeeInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("password", &self.password)?;
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)
    }
}

impl Employee {
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Self>> {
        let employees = sqlx::query_as::<_, Employee>(
            "
            SELECT
                id,
                username,
                password,
                first_name,
                last_name,
                social_security_number,
                occupation
            FROM employees
            ORDER BY id
            ",
        )
        .fetch_all(pool)
        .await?;

        Ok(employees)
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>> {
        let employee = sqlx::query_as::<_, Employee>(
            "
            SELECT
                id,
                username,
                password,
                first_name,
                last_name,
                social_security_number,
                occupation
            FROM employees
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(employee)
    }

    pub async fn get_by_username(pool: &SqlitePool, username: &str) -> Result<Option<Self>> {
        let employee = sqlx::query_as::<_, Employee>(
            "
            SELECT
                id,
                username,
                password,
                first_name,
                last_name,
                social_security_number,
                occupation
            FROM employees
            WHERE username = ?
            ",
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(employee)
    }

    pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM employees WHERE username = ?)",
        )
        .bind(username)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip_all, fields(username = %input.username), err)]
    pub async fn create(pool: &SqlitePool, input: EmployeeInput) -> Result<Self> {
        input.validate()?;

        let employee = sqlx::query_as::<_, Employee>(
            "
            INSERT INTO employees (
                username, password, first_name, last_name,
                social_security_number, occupation
            )
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING
                id,
                username,
                password,
                first_name,
                last_name,
                social_security_number,
                occupation
            ",
        )
        .bind(input.username.trim())
        .bind(input.password)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.social_security_number)
        .bind(input.occupation)
        .fetch_one(pool)
        .await?;

        Ok(employee)
    }

    #[tracing::instrument(skip(pool, input), fields(username = %input.username), err)]
    pub async fn update(pool: &SqlitePool, id: i64, input: EmployeeInput) -> Result<Option<Self>> {
        input.validate()?;

        let employee = sqlx::query_as::<_, Employee>(
            "
            UPDATE employees
            SET username = ?,
                password = ?,
                first_name = ?,
                last_name = ?,
                social_security_number = ?,
                occupation = ?
            WHERE id = ?
            RETURNING
                id,
                username,
                password,
                first_name,
                last_name,
                social_security_number,
                occupation
            ",
        )
        .bind(input.username.trim())
        .bind(input.password)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.social_security_number)
        .bind(input.occupation)
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(employee)
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
