//! Recipe MCP tools
//!
//! Tools for managing recipes and their ingredient rows.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    Ingredient, Recipe, RecipeCreate, RecipeIngredient, RecipeIngredientCreate,
    RecipeIngredientDetail, RecipeIngredientUpdate, RecipeUpdate,
};
use crate::nutrition::PreparationMethod;

use super::validate_portion_unit;

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub name: String,
    pub preparation_method: String,
    pub created_at: String,
}

/// Full recipe detail with ingredient rows
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub name: String,
    pub preparation_method: String,
    pub total_portion: Decimal,
    pub portion_unit: String,
    pub servings: Option<i64>,
    pub instructions: Option<String>,
    pub ingredients: Vec<RecipeIngredientDetail>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub preparation_method: String,
    pub total_portion: Decimal,
    pub portion_unit: String,
    pub ingredient_count: usize,
}

/// Response for list_recipes
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for successful update
#[derive(Debug, Serialize)]
pub struct RecipeUpdateResponse {
    pub success: bool,
    pub updated_at: String,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct RecipeDeleteResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for add_recipe_ingredient
#[derive(Debug, Serialize)]
pub struct AddRecipeIngredientResponse {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub quantity: Decimal,
}

/// Response for update_recipe_ingredient
#[derive(Debug, Serialize)]
pub struct UpdateRecipeIngredientResponse {
    pub success: bool,
    pub quantity: Decimal,
}

/// Response for remove_recipe_ingredient
#[derive(Debug, Serialize)]
pub struct RemoveRecipeIngredientResponse {
    pub success: bool,
    pub removed_id: i64,
}

/// Validate a preparation method, accepting unknown tags with a note.
///
/// Unknown methods are stored as given and calculate with identity factors,
/// matching the lenient lookup in the engine.
fn normalize_method(method: &str) -> String {
    match PreparationMethod::from_str(method) {
        Some(m) => m.as_str().to_string(),
        None => method.trim().to_uppercase(),
    }
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a new recipe
pub fn create_recipe(db: &Database, mut data: RecipeCreate) -> Result<CreateRecipeResponse, String> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }
    if data.total_portion <= Decimal::ZERO {
        return Err("total_portion must be greater than 0".to_string());
    }
    validate_portion_unit(&data.portion_unit)?;
    if let Some(servings) = data.servings {
        if servings <= 0 {
            return Err("servings must be greater than 0".to_string());
        }
    }
    data.preparation_method = normalize_method(&data.preparation_method);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::create(&conn, &data)
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    Ok(CreateRecipeResponse {
        id: recipe.id,
        name: recipe.name,
        preparation_method: recipe.preparation_method,
        created_at: recipe.created_at,
    })
}

/// Get a recipe with its ingredient rows
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?;

    match recipe {
        Some(recipe) => {
            let ingredients = RecipeIngredient::get_details_for_recipe(&conn, id)
                .map_err(|e| format!("Failed to get ingredients: {}", e))?;

            Ok(Some(RecipeDetail {
                id: recipe.id,
                name: recipe.name,
                preparation_method: recipe.preparation_method,
                total_portion: recipe.total_portion,
                portion_unit: recipe.portion_unit,
                servings: recipe.servings,
                instructions: recipe.instructions,
                ingredients,
                created_at: recipe.created_at,
                updated_at: recipe.updated_at,
            }))
        }
        None => Ok(None),
    }
}

/// List recipes with filtering and pagination
pub fn list_recipes(
    db: &Database,
    query: Option<&str>,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListRecipesResponse, String> {
    let limit = limit.min(200).max(1);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query, sort_by, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let total = Recipe::count(&conn)
        .map_err(|e| format!("Failed to count recipes: {}", e))?;

    let mut summaries = Vec::new();
    for recipe in recipes {
        let ingredients = RecipeIngredient::get_for_recipe(&conn, recipe.id)
            .map_err(|e| format!("Failed to get ingredients: {}", e))?;

        summaries.push(RecipeSummary {
            id: recipe.id,
            name: recipe.name,
            preparation_method: recipe.preparation_method,
            total_portion: recipe.total_portion,
            portion_unit: recipe.portion_unit,
            ingredient_count: ingredients.len(),
        });
    }

    Ok(ListRecipesResponse {
        recipes: summaries,
        total,
        limit,
        offset,
    })
}

/// Update a recipe
pub fn update_recipe(db: &Database, id: i64, mut data: RecipeUpdate) -> Result<RecipeUpdateResponse, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Recipe name cannot be empty".to_string());
        }
    }
    if let Some(portion) = data.total_portion {
        if portion <= Decimal::ZERO {
            return Err("total_portion must be greater than 0".to_string());
        }
    }
    if let Some(ref unit) = data.portion_unit {
        validate_portion_unit(unit)?;
    }
    if let Some(servings) = data.servings {
        if servings <= 0 {
            return Err("servings must be greater than 0".to_string());
        }
    }
    if let Some(ref method) = data.preparation_method {
        data.preparation_method = Some(normalize_method(method));
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Recipe::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update recipe: {}", e))?;

    match updated {
        Some(recipe) => Ok(RecipeUpdateResponse {
            success: true,
            updated_at: recipe.updated_at,
        }),
        None => Err(format!("Recipe not found with id: {}", id)),
    }
}

/// Delete a recipe and its ingredient rows
pub fn delete_recipe(db: &Database, id: i64) -> Result<RecipeDeleteResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Recipe::delete(&conn, id)
        .map_err(|e| format!("Failed to delete recipe: {}", e))?;

    if !deleted {
        return Err(format!("Recipe not found with id: {}", id));
    }

    Ok(RecipeDeleteResponse {
        success: true,
        deleted_id: id,
    })
}

// ============================================================================
// Recipe Ingredient Tools
// ============================================================================

/// Add an ingredient to a recipe
pub fn add_recipe_ingredient(
    db: &Database,
    data: RecipeIngredientCreate,
) -> Result<AddRecipeIngredientResponse, String> {
    if data.quantity <= Decimal::ZERO {
        return Err("quantity must be greater than 0".to_string());
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, data.recipe_id)
        .map_err(|e| format!("Database error: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", data.recipe_id));
    }

    let ingredient = Ingredient::get_by_id(&conn, data.ingredient_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Ingredient not found with id: {}", data.ingredient_id))?;

    let row = RecipeIngredient::create(&conn, &data)
        .map_err(|e| format!("Failed to add recipe ingredient: {}", e))?;

    Ok(AddRecipeIngredientResponse {
        id: row.id,
        recipe_id: row.recipe_id,
        ingredient_id: row.ingredient_id,
        ingredient_name: ingredient.name,
        quantity: row.quantity,
    })
}

/// Update a recipe ingredient's quantity or notes
pub fn update_recipe_ingredient(
    db: &Database,
    id: i64,
    data: RecipeIngredientUpdate,
) -> Result<UpdateRecipeIngredientResponse, String> {
    if let Some(quantity) = data.quantity {
        if quantity <= Decimal::ZERO {
            return Err("quantity must be greater than 0".to_string());
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = RecipeIngredient::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update recipe ingredient: {}", e))?;

    match updated {
        Some(row) => Ok(UpdateRecipeIngredientResponse {
            success: true,
            quantity: row.quantity,
        }),
        None => Err(format!("Recipe ingredient not found with id: {}", id)),
    }
}

/// Remove an ingredient from a recipe
pub fn remove_recipe_ingredient(
    db: &Database,
    id: i64,
) -> Result<RemoveRecipeIngredientResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let removed = RecipeIngredient::delete(&conn, id)
        .map_err(|e| format!("Failed to remove recipe ingredient: {}", e))?;

    if !removed {
        return Err(format!("Recipe ingredient not found with id: {}", id));
    }

    Ok(RemoveRecipeIngredientResponse {
        success: true,
        removed_id: id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IngredientCreate;
    use rust_decimal_macros::dec;

    // Shared-cache URI so every pooled connection sees the same in-memory db
    fn test_db(name: &str) -> Database {
        let db = Database::new(format!("file:{}?mode=memory&cache=shared", name)).unwrap();
        let conn = db.get_conn().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        db
    }

    fn valid_recipe() -> RecipeCreate {
        RecipeCreate {
            name: "Feijoada".to_string(),
            preparation_method: "BOILED".to_string(),
            total_portion: dec!(500),
            portion_unit: "g".to_string(),
            servings: Some(4),
            instructions: None,
        }
    }

    #[test]
    fn test_create_recipe_rejects_non_positive_portion() {
        let db = test_db("recipes_zero_portion");

        let mut data = valid_recipe();
        data.total_portion = dec!(0);
        let err = create_recipe(&db, data).unwrap_err();
        assert!(err.contains("total_portion"));

        let mut data = valid_recipe();
        data.total_portion = dec!(-100);
        assert!(create_recipe(&db, data).is_err());
    }

    #[test]
    fn test_create_recipe_rejects_bad_unit_and_empty_name() {
        let db = test_db("recipes_bad_unit");

        let mut data = valid_recipe();
        data.portion_unit = "cup".to_string();
        let err = create_recipe(&db, data).unwrap_err();
        assert!(err.contains("portion_unit"));

        let mut data = valid_recipe();
        data.name = "   ".to_string();
        let err = create_recipe(&db, data).unwrap_err();
        assert!(err.contains("name"));
    }

    #[test]
    fn test_update_recipe_rejects_non_positive_portion() {
        let db = test_db("recipes_update_portion");
        let created = create_recipe(&db, valid_recipe()).unwrap();

        let err = update_recipe(
            &db,
            created.id,
            RecipeUpdate {
                total_portion: Some(dec!(0)),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.contains("total_portion"));
    }

    #[test]
    fn test_recipe_ingredient_quantity_must_be_positive() {
        let db = test_db("recipes_zero_quantity");
        let recipe = create_recipe(&db, valid_recipe()).unwrap();

        let conn = db.get_conn().unwrap();
        let beans = Ingredient::create(
            &conn,
            &IngredientCreate {
                name: "Black beans, cooked".to_string(),
                portion_unit: "g".to_string(),
                energy_kcal: Some(dec!(76)),
                ..Default::default()
            },
        )
        .unwrap();
        drop(conn);

        let err = add_recipe_ingredient(
            &db,
            RecipeIngredientCreate {
                recipe_id: recipe.id,
                ingredient_id: beans.id,
                quantity: dec!(0),
                notes: None,
            },
        )
        .unwrap_err();
        assert!(err.contains("quantity"));

        // A valid row can be added, but not updated to a non-positive quantity
        let row = add_recipe_ingredient(
            &db,
            RecipeIngredientCreate {
                recipe_id: recipe.id,
                ingredient_id: beans.id,
                quantity: dec!(300),
                notes: None,
            },
        )
        .unwrap();

        let err = update_recipe_ingredient(
            &db,
            row.id,
            RecipeIngredientUpdate {
                quantity: Some(dec!(-1)),
                notes: None,
            },
        )
        .unwrap_err();
        assert!(err.contains("quantity"));
    }

    #[test]
    fn test_unknown_method_stored_uppercase() {
        let db = test_db("recipes_unknown_method");

        let mut data = valid_recipe();
        data.preparation_method = "microwaved".to_string();
        let created = create_recipe(&db, data).unwrap();
        assert_eq!(created.preparation_method, "MICROWAVED");
    }
}
