//! Recipe ingredient model
//!
//! Junction rows linking ingredients to recipes with a quantity, plus the
//! resolution step that loads full ingredient profiles for the nutrition
//! engine.

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::{get_decimal, Ingredient};

/// A recipe ingredient linking an ingredient to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    /// Amount used, in the ingredient's own portion-unit basis
    pub quantity: Decimal,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe ingredient with ingredient details for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientDetail {
    pub id: i64,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub portion_unit: String,
    pub quantity: Decimal,
    pub notes: Option<String>,
}

/// Data for adding an ingredient to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientCreate {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub quantity: Decimal,
    pub notes: Option<String>,
}

/// Data for updating a recipe ingredient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeIngredientUpdate {
    pub quantity: Option<Decimal>,
    pub notes: Option<String>,
}

/// A recipe component resolved for calculation: the full ingredient profile
/// plus the quantity used. Plain value, no back-reference to the recipe.
#[derive(Debug, Clone)]
pub struct ResolvedComponent {
    pub ingredient: Ingredient,
    pub quantity: Decimal,
}

impl RecipeIngredient {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            ingredient_id: row.get("ingredient_id")?,
            quantity: get_decimal(row, "quantity")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Add an ingredient to a recipe
    pub fn create(conn: &Connection, data: &RecipeIngredientCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, notes)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                data.recipe_id,
                data.ingredient_id,
                data.quantity.to_string(),
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a recipe ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipe_ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all ingredient rows for a recipe, in insertion order
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY id"
        )?;

        let ingredients = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// Get ingredients with display details for a recipe
    pub fn get_details_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<RecipeIngredientDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ri.id, ri.ingredient_id, i.name AS ingredient_name,
                   i.portion_unit, ri.quantity, ri.notes
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON ri.ingredient_id = i.id
            WHERE ri.recipe_id = ?1
            ORDER BY ri.id
            "#
        )?;

        let details = stmt
            .query_map([recipe_id], |row| {
                Ok(RecipeIngredientDetail {
                    id: row.get("id")?,
                    ingredient_id: row.get("ingredient_id")?,
                    ingredient_name: row.get("ingredient_name")?,
                    portion_unit: row.get("portion_unit")?,
                    quantity: get_decimal(row, "quantity")?,
                    notes: row.get("notes")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    /// Update a recipe ingredient
    pub fn update(conn: &Connection, id: i64, data: &RecipeIngredientUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(qty) = data.quantity {
            updates.push(format!("quantity = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(qty.to_string()));
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipe_ingredients SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Remove an ingredient from a recipe
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipe_ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Get the recipe_id for a recipe ingredient
    pub fn get_recipe_id(conn: &Connection, id: i64) -> DbResult<Option<i64>> {
        let result: Result<i64, _> = conn.query_row(
            "SELECT recipe_id FROM recipe_ingredients WHERE id = ?1",
            [id],
            |row| row.get(0),
        );
        match result {
            Ok(recipe_id) => Ok(Some(recipe_id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolve the components of a recipe for nutrition calculation: load every
/// referenced ingredient profile in full, paired with the quantity used.
///
/// All storage access happens here, before the engine runs; the engine itself
/// performs no I/O.
pub fn resolve_components(conn: &Connection, recipe_id: i64) -> DbResult<Vec<ResolvedComponent>> {
    let rows = RecipeIngredient::get_for_recipe(conn, recipe_id)?;

    let mut components = Vec::with_capacity(rows.len());
    for row in rows {
        let ingredient = Ingredient::get_by_id(conn, row.ingredient_id)?
            .ok_or_else(|| crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
        components.push(ResolvedComponent {
            ingredient,
            quantity: row.quantity,
        });
    }

    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{IngredientCreate, Recipe, RecipeCreate};
    use rust_decimal_macros::dec;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn sample_recipe(conn: &Connection) -> Recipe {
        Recipe::create(
            conn,
            &RecipeCreate {
                name: "Feijoada".to_string(),
                preparation_method: "BOILED".to_string(),
                total_portion: dec!(500),
                portion_unit: "g".to_string(),
                servings: Some(4),
                instructions: None,
            },
        )
        .unwrap()
    }

    fn sample_ingredient(conn: &Connection, name: &str) -> Ingredient {
        Ingredient::create(
            conn,
            &IngredientCreate {
                name: name.to_string(),
                portion_unit: "g".to_string(),
                energy_kcal: Some(dec!(76)),
                proteins: Some(dec!(4.8)),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_components_round_trip() {
        let conn = test_conn();
        let recipe = sample_recipe(&conn);
        let beans = sample_ingredient(&conn, "Black beans, cooked");

        RecipeIngredient::create(
            &conn,
            &RecipeIngredientCreate {
                recipe_id: recipe.id,
                ingredient_id: beans.id,
                quantity: dec!(300),
                notes: None,
            },
        )
        .unwrap();

        let components = resolve_components(&conn, recipe.id).unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].ingredient.name, "Black beans, cooked");
        assert_eq!(components[0].quantity, dec!(300));
        assert_eq!(components[0].ingredient.energy_kcal, Some(dec!(76)));
        // Absent nutrient stays absent through the round trip
        assert_eq!(components[0].ingredient.trans_fats, None);
    }

    #[test]
    fn test_resolve_components_empty_recipe() {
        let conn = test_conn();
        let recipe = sample_recipe(&conn);

        let components = resolve_components(&conn, recipe.id).unwrap();
        assert!(components.is_empty());
    }

    #[test]
    fn test_ingredient_delete_blocked_while_referenced() {
        let conn = test_conn();
        let recipe = sample_recipe(&conn);
        let beans = sample_ingredient(&conn, "Black beans, cooked");

        RecipeIngredient::create(
            &conn,
            &RecipeIngredientCreate {
                recipe_id: recipe.id,
                ingredient_id: beans.id,
                quantity: dec!(300),
                notes: None,
            },
        )
        .unwrap();

        // ON DELETE RESTRICT blocks the delete
        assert!(Ingredient::delete(&conn, beans.id).is_err());

        // Deleting the recipe cascades to the junction rows, then the
        // ingredient can go
        assert!(Recipe::delete(&conn, recipe.id).unwrap());
        assert!(Ingredient::delete(&conn, beans.id).unwrap());
    }

    #[test]
    fn test_decimal_quantity_round_trip() {
        let conn = test_conn();
        let recipe = sample_recipe(&conn);
        let beans = sample_ingredient(&conn, "Black beans, cooked");

        let row = RecipeIngredient::create(
            &conn,
            &RecipeIngredientCreate {
                recipe_id: recipe.id,
                ingredient_id: beans.id,
                quantity: dec!(12.35),
                notes: Some("soaked overnight".to_string()),
            },
        )
        .unwrap();

        let fetched = RecipeIngredient::get_by_id(&conn, row.id).unwrap().unwrap();
        assert_eq!(fetched.quantity, dec!(12.35));
    }
}
