use sqlx::SqlitePool;

use crate::setup_db_pool;

/// A fresh, migrated, empty in-memory database
pub async fn create_test_db() -> SqlitePool {
    setup_db_pool("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

/// A fresh in-memory database loaded with the bundled sample data
pub async fn create_seeded_test_db() -> SqlitePool {
    let pool = create_test_db().await;

    crate::seed::seed(&pool)
        .await
        .expect("Failed to seed test database");

    pool
}
