use db::seed::SeedData;

use crate::Result;

pub(crate) fn validate() -> Result<()> {
    let data = SeedData::load()?;

    println!(
        "Validating {} ingredients, {} recipes and {} pantry items...",
        data.ingredients.len(),
        data.recipes.len(),
        data.pantry.items.len()
    );
    data.validate()?;
    println!("Seed data Valid! ✅");

    Ok(())
}
