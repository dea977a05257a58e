use crate::{AppConfig, Result};

pub(crate) async fn seed() -> Result<()> {
    let config = AppConfig::from_env()?;
    let pool = db::setup_db_pool(&config.database_url).await?;

    match db::seed::seed(&pool).await? {
        Some(summary) => println!(
            "Seeded {} ingredients, {} recipes and {} pantry items ✅",
            summary.ingredients, summary.recipes, summary.pantry_items
        ),
        None => println!("Database already has data, nothing to seed"),
    }

    Ok(())
}
