//! Recipe model
//!
//! Represents a recipe: preparation method, total finished portion, and the
//! ingredient rows that reference it.

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::get_decimal;

/// A recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    /// RAW, BOILED, FRIED, BAKED, GRILLED, STEAMED; unknown values are
    /// accepted and treated as uncorrected (identity factors)
    pub preparation_method: String,
    /// Total finished portion, strictly positive
    pub total_portion: Decimal,
    /// "g" or "ml"
    pub portion_unit: String,
    pub servings: Option<i64>,
    pub instructions: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    #[serde(default = "default_method")]
    pub preparation_method: String,
    pub total_portion: Decimal,
    pub portion_unit: String,
    pub servings: Option<i64>,
    pub instructions: Option<String>,
}

fn default_method() -> String {
    "RAW".to_string()
}

/// Data for updating a recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub preparation_method: Option<String>,
    pub total_portion: Option<Decimal>,
    pub portion_unit: Option<String>,
    pub servings: Option<i64>,
    pub instructions: Option<String>,
}

impl Recipe {
    /// Create a Recipe from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            preparation_method: row.get("preparation_method")?,
            total_portion: get_decimal(row, "total_portion")?,
            portion_unit: row.get("portion_unit")?,
            servings: row.get("servings")?,
            instructions: row.get("instructions")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new recipe into the database
    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipes (name, preparation_method, total_portion, portion_unit, servings, instructions)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                data.name,
                data.preparation_method,
                data.total_portion.to_string(),
                data.portion_unit,
                data.servings,
                data.instructions,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List recipes with optional name search, sorting, and pagination
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        sort_by: &str,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let order = if sort_order.to_lowercase() == "desc" { "DESC" } else { "ASC" };
        let sort_col = match sort_by.to_lowercase().as_str() {
            "created_at" => "created_at",
            "preparation_method" => "preparation_method",
            _ => "name",
        };

        let (sql, search_param) = match query {
            Some(q) => (
                format!(
                    "SELECT * FROM recipes WHERE name LIKE ?1 ORDER BY {} {} LIMIT ?2 OFFSET ?3",
                    sort_col, order
                ),
                Some(format!("%{}%", q)),
            ),
            None => (
                format!(
                    "SELECT * FROM recipes ORDER BY {} {} LIMIT ?1 OFFSET ?2",
                    sort_col, order
                ),
                None,
            ),
        };

        let mut stmt = conn.prepare(&sql)?;

        let recipes = if let Some(pattern) = search_param {
            stmt.query_map(params![pattern, limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(recipes)
    }

    /// Update a recipe
    pub fn update(conn: &Connection, id: i64, data: &RecipeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref method) = data.preparation_method {
            updates.push(format!("preparation_method = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(method.clone()));
        }
        if let Some(portion) = data.total_portion {
            updates.push(format!("total_portion = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(portion.to_string()));
        }
        if let Some(ref unit) = data.portion_unit {
            updates.push(format!("portion_unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit.clone()));
        }
        if let Some(servings) = data.servings {
            updates.push(format!("servings = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(servings));
        }
        if let Some(ref instructions) = data.instructions {
            updates.push(format!("instructions = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(instructions.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipes SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Count recipes
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete a recipe (cascades to its recipe_ingredients rows)
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
