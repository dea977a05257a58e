use std::{cmp::Ordering, collections::HashSet};

use db::recipes::RecipeWithDetails;
use serde::{Deserialize, Serialize};

/// Only recommend recipes that can be made entirely from the pantry
pub(crate) const DEFAULT_MIN_COVERAGE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recipe: RecipeWithDetails,
    /// Share of the recipe's distinct ingredients found in the pantry, from 0 to 1
    pub coverage: f64,
    pub matched_ingredients: Vec<String>,
    pub missing_ingredients: Vec<String>,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

pub(crate) fn is_valid_coverage(min_coverage: f64) -> bool {
    (0.0..=1.0).contains(&min_coverage)
}

/// Ranks recipes by how much of them the pantry already covers.
///
/// A recipe is kept when at least one ingredient matched and its coverage reaches
/// `min_coverage`. Best coverage comes first, then fewer missing ingredients, then
/// lower recipe ids.
pub fn recommend(
    recipes: Vec<RecipeWithDetails>,
    pantry_names: &[String],
    min_coverage: f64,
) -> Vec<Recommendation> {
    let pantry: HashSet<String> = pantry_names.iter().map(|name| normalize(name)).collect();

    let mut recommendations: Vec<Recommendation> = recipes
        .into_iter()
        .filter_map(|recipe| {
            let mut seen = HashSet::new();
            let mut matched_ingredients = Vec::new();
            let mut missing_ingredients = Vec::new();

            for ingredient in &recipe.ingredients {
                let name = ingredient.ingredient_name.trim();
                let key = normalize(name);
                if key.is_empty() || !seen.insert(key.clone()) {
                    continue;
                }

                if pantry.contains(&key) {
                    matched_ingredients.push(name.to_string());
                } else {
                    missing_ingredients.push(name.to_string());
                }
            }

            let total = matched_ingredients.len() + missing_ingredients.len();
            if total == 0 || matched_ingredients.is_empty() {
                return None;
            }

            #[allow(clippy::cast_precision_loss)]
            let coverage = matched_ingredients.len() as f64 / total as f64;
            if coverage < min_coverage {
                return None;
            }

            Some(Recommendation {
                recipe,
                coverage,
                matched_ingredients,
                missing_ingredients,
            })
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.coverage
            .partial_cmp(&a.coverage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.missing_ingredients.len().cmp(&b.missing_ingredients.len()))
            .then_with(|| a.recipe.recipe.id.cmp(&b.recipe.recipe.id))
    });

    recommendations
}
