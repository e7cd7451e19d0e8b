//! Nutrition labeling tool
//!
//! Loads a recipe and its resolved components from storage, then runs the
//! nutrition engine to produce the facts table.

use crate::db::Database;
use crate::models::{resolve_components, Recipe};
use crate::nutrition::{calculate_table, NutritionError, NutritionTable};

/// Compute the nutrition-facts table for a stored recipe
pub fn calculate_nutrition_table(db: &Database, recipe_id: i64) -> Result<NutritionTable, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, recipe_id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
        .ok_or_else(|| format!("Recipe not found with id: {}", recipe_id))?;

    // Enforced on create/update as well; re-checked here so the engine never
    // divides by a non-positive portion
    if recipe.total_portion <= rust_decimal::Decimal::ZERO {
        return Err(format!(
            "Recipe {} has a non-positive total portion ({})",
            recipe_id, recipe.total_portion
        ));
    }

    let components = resolve_components(&conn, recipe_id)
        .map_err(|e| format!("Failed to resolve recipe ingredients: {}", e))?;

    calculate_table(
        Some(recipe.id),
        &recipe.name,
        &recipe.preparation_method,
        recipe.total_portion,
        &components,
    )
    .map_err(|e| match e {
        NutritionError::EmptyRecipe => format!(
            "Recipe {} has no ingredients; add at least one before calculating",
            recipe_id
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Ingredient, IngredientCreate, RecipeCreate, RecipeIngredient, RecipeIngredientCreate};
    use rust_decimal_macros::dec;

    // Shared-cache URI so every pooled connection sees the same in-memory db
    fn test_db(name: &str) -> Database {
        let db = Database::new(format!("file:{}?mode=memory&cache=shared", name)).unwrap();
        let conn = db.get_conn().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        db
    }

    #[test]
    fn test_calculate_for_stored_recipe() {
        let db = test_db("labels_stored_recipe");
        let conn = db.get_conn().unwrap();

        let ingredient = Ingredient::create(
            &conn,
            &IngredientCreate {
                name: "White rice, cooked".to_string(),
                portion_unit: "g".to_string(),
                energy_kcal: Some(dec!(128)),
                carbohydrates: Some(dec!(28.1)),
                proteins: Some(dec!(2.5)),
                ..Default::default()
            },
        )
        .unwrap();

        let recipe = crate::models::Recipe::create(
            &conn,
            &RecipeCreate {
                name: "Plain rice".to_string(),
                preparation_method: "BOILED".to_string(),
                total_portion: dec!(200),
                portion_unit: "g".to_string(),
                servings: Some(2),
                instructions: None,
            },
        )
        .unwrap();

        RecipeIngredient::create(
            &conn,
            &RecipeIngredientCreate {
                recipe_id: recipe.id,
                ingredient_id: ingredient.id,
                quantity: dec!(200),
                notes: None,
            },
        )
        .unwrap();
        drop(conn);

        let table = calculate_nutrition_table(&db, recipe.id).unwrap();
        assert_eq!(table.recipe_id, Some(recipe.id));
        // energy: 128 * 2 = 256, normalized by 0.5 -> 128.00
        assert_eq!(table.energy_kcal, dec!(128.00));
        // protein: 2.5 * 2 * 0.95 = 4.75, * 0.5 = 2.38 (half-up)
        assert_eq!(table.proteins, dec!(2.38));
    }

    #[test]
    fn test_calculate_rejects_recipe_without_ingredients() {
        let db = test_db("labels_empty_recipe");
        let conn = db.get_conn().unwrap();

        let recipe = crate::models::Recipe::create(
            &conn,
            &RecipeCreate {
                name: "Empty".to_string(),
                preparation_method: "RAW".to_string(),
                total_portion: dec!(100),
                portion_unit: "g".to_string(),
                servings: None,
                instructions: None,
            },
        )
        .unwrap();
        drop(conn);

        let err = calculate_nutrition_table(&db, recipe.id).unwrap_err();
        assert!(err.contains("no ingredients"));
    }

    #[test]
    fn test_calculate_missing_recipe() {
        let db = test_db("labels_missing_recipe");
        let err = calculate_nutrition_table(&db, 999).unwrap_err();
        assert!(err.contains("not found"));
    }
}
