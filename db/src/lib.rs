use std::{cmp::Ordering, str::FromStr};

use color_eyre::{eyre::WrapErr, Report, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub mod companies;
pub mod employees;
pub mod ingredients;
pub mod pantry;
pub mod recipes;
pub mod seed;
pub mod test_utils;
pub mod validation;

pub use sqlx;
pub use sqlx::SqlitePool;
pub use validation::ValidationError;

/// Case-insensitive collation over all of Unicode. SQLite's own `NOCASE` only folds ASCII.
pub const UNICASE: &str = "UNICASE";

/// Whether `haystack` contains `needle`, ignoring case
pub fn contains_ignoring_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn unicase(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[tracing::instrument(err)]
pub async fn setup_db_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .wrap_err_with(|| format!("Invalid database url {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true)
        .collation(UNICASE, unicase);

    // Every connection to `:memory:` is its own database, so keep exactly one alive
    let pool_options = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .wrap_err("Failed to connect to the database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .wrap_err("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    Ok(pool)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Whether anything in the error chain is a unique constraint violation
pub fn is_unique_violation(report: &Report) -> bool {
    report.chain().any(|err| {
        err.downcast_ref::<sqlx::Error>()
            .and_then(|err| err.as_database_error())
            .is_some_and(|db_err| db_err.is_unique_violation())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite:file:flavorhub?mode=memory&cache=shared"));
        assert!(!is_in_memory("sqlite:flavorhub.db"));
    }

    #[test]
    fn unicase_folds_beyond_ascii() {
        assert_eq!(unicase("JALAPEÑO", "jalapeño"), Ordering::Equal);
        assert_eq!(unicase("Salt", "salt"), Ordering::Equal);
        assert_eq!(unicase("Basil", "chive"), Ordering::Less);
        assert!(contains_ignoring_case("Jalapeño", "PEÑO"));
        assert!(contains_ignoring_case("Jalapeño", ""));
        assert!(!contains_ignoring_case("Jalapeño", "pena"));
    }

    #[tokio::test]
    async fn unique_violations_are_detected_through_context() {
        let pool = test_utils::create_test_db().await;

        sqlx::query("INSERT INTO ingredients (name) VALUES ('Salt')")
            .execute(&pool)
            .await
            .unwrap();
        let err = sqlx::query("INSERT INTO ingredients (name) VALUES ('salt')")
            .execute(&pool)
            .await
            .wrap_err("Failed to insert")
            .unwrap_err();

        assert!(is_unique_violation(&err));
        assert!(!is_unique_violation(&color_eyre::eyre::eyre!("nope")));
    }
}
