//! Ingredient MCP tools
//!
//! Tools for managing the ingredient catalog.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::Database;
use crate::models::{Ingredient, IngredientCreate, IngredientUpdate};

use super::validate_portion_unit;

/// Response for add_ingredient
#[derive(Debug, Serialize)]
pub struct AddIngredientResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// Ingredient summary for listing
#[derive(Debug, Serialize)]
pub struct IngredientSummary {
    pub id: i64,
    pub name: String,
    pub portion_unit: String,
    pub energy_kcal: Option<Decimal>,
    pub category: Option<String>,
    pub tbca_code: Option<String>,
}

/// Response for list_ingredients
#[derive(Debug, Serialize)]
pub struct ListIngredientsResponse {
    pub ingredients: Vec<IngredientSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for search_ingredients
#[derive(Debug, Serialize)]
pub struct SearchIngredientsResponse {
    pub ingredients: Vec<IngredientSummary>,
    pub count: usize,
}

/// Response for list_ingredient_categories
#[derive(Debug, Serialize)]
pub struct ListCategoriesResponse {
    pub categories: Vec<String>,
    pub count: usize,
}

/// Response for successful update
#[derive(Debug, Serialize)]
pub struct IngredientUpdateResponse {
    pub success: bool,
    pub updated_at: String,
}

/// Response for delete blocked
#[derive(Debug, Serialize)]
pub struct IngredientDeleteBlockedResponse {
    pub error: String,
    pub used_in_recipes: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct IngredientDeleteSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Reject negative nutrient values before they reach storage
fn validate_nutrients(fields: &[(&str, Option<Decimal>)]) -> Result<(), String> {
    for (name, value) in fields {
        if let Some(v) = value {
            if v.is_sign_negative() {
                return Err(format!("{} cannot be negative", name));
            }
        }
    }
    Ok(())
}

/// Add an ingredient to the catalog
pub fn add_ingredient(db: &Database, data: IngredientCreate) -> Result<AddIngredientResponse, String> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err("Ingredient name cannot be empty".to_string());
    }
    validate_portion_unit(&data.portion_unit)?;
    validate_nutrients(&[
        ("energy_kcal", data.energy_kcal),
        ("energy_kj", data.energy_kj),
        ("carbohydrates", data.carbohydrates),
        ("total_sugars", data.total_sugars),
        ("added_sugars", data.added_sugars),
        ("proteins", data.proteins),
        ("total_fats", data.total_fats),
        ("saturated_fats", data.saturated_fats),
        ("trans_fats", data.trans_fats),
        ("dietary_fiber", data.dietary_fiber),
        ("sodium", data.sodium),
    ])?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredient = Ingredient::create(&conn, &data)
        .map_err(|e| format!("Failed to add ingredient: {}", e))?;

    Ok(AddIngredientResponse {
        id: ingredient.id,
        name: ingredient.name,
        created_at: ingredient.created_at,
    })
}

/// Get an ingredient with its full nutrient profile
pub fn get_ingredient(db: &Database, id: i64) -> Result<Option<Ingredient>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    Ingredient::get_by_id(&conn, id).map_err(|e| format!("Failed to get ingredient: {}", e))
}

/// List ingredients with optional name filter and category filter
pub fn list_ingredients(
    db: &Database,
    query: Option<&str>,
    category: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<ListIngredientsResponse, String> {
    let limit = limit.min(200).max(1);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredients = Ingredient::list(&conn, query, category, limit, offset)
        .map_err(|e| format!("Failed to list ingredients: {}", e))?;

    let total = Ingredient::count(&conn)
        .map_err(|e| format!("Failed to count ingredients: {}", e))?;

    Ok(ListIngredientsResponse {
        ingredients: ingredients.into_iter().map(summarize).collect(),
        total,
        limit,
        offset,
    })
}

/// Search ingredients by name, TBCA code, or category
pub fn search_ingredients(
    db: &Database,
    term: &str,
    limit: i64,
) -> Result<SearchIngredientsResponse, String> {
    let term = term.trim();
    if term.is_empty() {
        return Err("Search term cannot be empty".to_string());
    }
    let limit = limit.min(200).max(1);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredients = Ingredient::search(&conn, term, limit)
        .map_err(|e| format!("Failed to search ingredients: {}", e))?;

    let summaries: Vec<_> = ingredients.into_iter().map(summarize).collect();
    let count = summaries.len();

    Ok(SearchIngredientsResponse {
        ingredients: summaries,
        count,
    })
}

/// List the distinct ingredient categories in use
pub fn list_ingredient_categories(db: &Database) -> Result<ListCategoriesResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let categories = Ingredient::categories(&conn)
        .map_err(|e| format!("Failed to list categories: {}", e))?;

    let count = categories.len();
    Ok(ListCategoriesResponse { categories, count })
}

/// Update an ingredient's profile
pub fn update_ingredient(
    db: &Database,
    id: i64,
    data: IngredientUpdate,
) -> Result<IngredientUpdateResponse, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Ingredient name cannot be empty".to_string());
        }
    }
    if let Some(ref unit) = data.portion_unit {
        validate_portion_unit(unit)?;
    }
    validate_nutrients(&[
        ("energy_kcal", data.energy_kcal),
        ("energy_kj", data.energy_kj),
        ("carbohydrates", data.carbohydrates),
        ("total_sugars", data.total_sugars),
        ("added_sugars", data.added_sugars),
        ("proteins", data.proteins),
        ("total_fats", data.total_fats),
        ("saturated_fats", data.saturated_fats),
        ("trans_fats", data.trans_fats),
        ("dietary_fiber", data.dietary_fiber),
        ("sodium", data.sodium),
    ])?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Ingredient::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update ingredient: {}", e))?;

    match updated {
        Some(ingredient) => Ok(IngredientUpdateResponse {
            success: true,
            updated_at: ingredient.updated_at,
        }),
        None => Err(format!("Ingredient not found with id: {}", id)),
    }
}

/// Delete an ingredient (blocked while referenced by any recipe)
pub fn delete_ingredient(
    db: &Database,
    id: i64,
) -> Result<Result<IngredientDeleteSuccessResponse, IngredientDeleteBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredient = Ingredient::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if ingredient.is_none() {
        return Err(format!("Ingredient not found with id: {}", id));
    }

    let used_in_recipes = Ingredient::get_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check recipe usage: {}", e))?;

    if used_in_recipes > 0 {
        return Ok(Err(IngredientDeleteBlockedResponse {
            error: format!("Cannot delete ingredient: used in {} recipe(s)", used_in_recipes),
            used_in_recipes,
        }));
    }

    Ingredient::delete(&conn, id)
        .map_err(|e| format!("Failed to delete ingredient: {}", e))?;

    Ok(Ok(IngredientDeleteSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}

fn summarize(ingredient: Ingredient) -> IngredientSummary {
    IngredientSummary {
        id: ingredient.id,
        name: ingredient.name,
        portion_unit: ingredient.portion_unit,
        energy_kcal: ingredient.energy_kcal,
        category: ingredient.category,
        tbca_code: ingredient.tbca_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Recipe, RecipeCreate, RecipeIngredient, RecipeIngredientCreate};
    use rust_decimal_macros::dec;

    // Shared-cache URI so every pooled connection sees the same in-memory db
    fn test_db(name: &str) -> Database {
        let db = Database::new(format!("file:{}?mode=memory&cache=shared", name)).unwrap();
        let conn = db.get_conn().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        db
    }

    fn valid_ingredient() -> IngredientCreate {
        IngredientCreate {
            name: "Black beans, cooked".to_string(),
            portion_unit: "g".to_string(),
            energy_kcal: Some(dec!(76)),
            proteins: Some(dec!(4.8)),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_ingredient_rejects_empty_name_and_bad_unit() {
        let db = test_db("ingredients_bad_input");

        let mut data = valid_ingredient();
        data.name = "  ".to_string();
        let err = add_ingredient(&db, data).unwrap_err();
        assert!(err.contains("name"));

        let mut data = valid_ingredient();
        data.portion_unit = "cup".to_string();
        let err = add_ingredient(&db, data).unwrap_err();
        assert!(err.contains("portion_unit"));
    }

    #[test]
    fn test_add_ingredient_rejects_negative_nutrient() {
        let db = test_db("ingredients_negative");

        let mut data = valid_ingredient();
        data.sodium = Some(dec!(-1));
        let err = add_ingredient(&db, data).unwrap_err();
        assert!(err.contains("sodium"));
    }

    #[test]
    fn test_update_ingredient_rejects_negative_nutrient() {
        let db = test_db("ingredients_update_negative");
        let created = add_ingredient(&db, valid_ingredient()).unwrap();

        let err = update_ingredient(
            &db,
            created.id,
            IngredientUpdate {
                total_fats: Some(dec!(-0.5)),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.contains("total_fats"));
    }

    #[test]
    fn test_delete_ingredient_blocked_while_in_use() {
        let db = test_db("ingredients_delete_blocked");
        let created = add_ingredient(&db, valid_ingredient()).unwrap();

        let conn = db.get_conn().unwrap();
        let recipe = Recipe::create(
            &conn,
            &RecipeCreate {
                name: "Feijoada".to_string(),
                preparation_method: "BOILED".to_string(),
                total_portion: dec!(500),
                portion_unit: "g".to_string(),
                servings: None,
                instructions: None,
            },
        )
        .unwrap();
        RecipeIngredient::create(
            &conn,
            &RecipeIngredientCreate {
                recipe_id: recipe.id,
                ingredient_id: created.id,
                quantity: dec!(300),
                notes: None,
            },
        )
        .unwrap();
        drop(conn);

        let blocked = delete_ingredient(&db, created.id).unwrap().unwrap_err();
        assert_eq!(blocked.used_in_recipes, 1);

        let conn = db.get_conn().unwrap();
        Recipe::delete(&conn, recipe.id).unwrap();
        drop(conn);

        let deleted = delete_ingredient(&db, created.id).unwrap().unwrap();
        assert_eq!(deleted.deleted_id, created.id);
    }
}
