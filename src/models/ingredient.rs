//! Ingredient model
//!
//! Represents an ingredient with its nutrient profile per 100 g / 100 ml.

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use super::{get_opt_decimal, opt_decimal_sql};

/// An ingredient with nutrient values per 100 units of its portion unit.
///
/// Every nutrient field is optional: `None` means no authoritative value is
/// known for that nutrient, which is not the same as a measured zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    /// "g" or "ml"; carried as metadata, never converted
    pub portion_unit: String,
    pub energy_kcal: Option<Decimal>,
    pub energy_kj: Option<Decimal>,
    pub carbohydrates: Option<Decimal>,
    pub total_sugars: Option<Decimal>,
    pub added_sugars: Option<Decimal>,
    pub proteins: Option<Decimal>,
    pub total_fats: Option<Decimal>,
    pub saturated_fats: Option<Decimal>,
    pub trans_fats: Option<Decimal>,
    pub dietary_fiber: Option<Decimal>,
    /// milligrams per 100 units
    pub sodium: Option<Decimal>,
    pub tbca_code: Option<String>,
    pub category: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new ingredient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    pub portion_unit: String,
    pub energy_kcal: Option<Decimal>,
    pub energy_kj: Option<Decimal>,
    pub carbohydrates: Option<Decimal>,
    pub total_sugars: Option<Decimal>,
    pub added_sugars: Option<Decimal>,
    pub proteins: Option<Decimal>,
    pub total_fats: Option<Decimal>,
    pub saturated_fats: Option<Decimal>,
    pub trans_fats: Option<Decimal>,
    pub dietary_fiber: Option<Decimal>,
    pub sodium: Option<Decimal>,
    pub tbca_code: Option<String>,
    pub category: Option<String>,
}

/// Data for updating an ingredient (None = field unchanged)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub portion_unit: Option<String>,
    pub energy_kcal: Option<Decimal>,
    pub energy_kj: Option<Decimal>,
    pub carbohydrates: Option<Decimal>,
    pub total_sugars: Option<Decimal>,
    pub added_sugars: Option<Decimal>,
    pub proteins: Option<Decimal>,
    pub total_fats: Option<Decimal>,
    pub saturated_fats: Option<Decimal>,
    pub trans_fats: Option<Decimal>,
    pub dietary_fiber: Option<Decimal>,
    pub sodium: Option<Decimal>,
    pub tbca_code: Option<String>,
    pub category: Option<String>,
}

impl Ingredient {
    /// Create an Ingredient from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            portion_unit: row.get("portion_unit")?,
            energy_kcal: get_opt_decimal(row, "energy_kcal")?,
            energy_kj: get_opt_decimal(row, "energy_kj")?,
            carbohydrates: get_opt_decimal(row, "carbohydrates")?,
            total_sugars: get_opt_decimal(row, "total_sugars")?,
            added_sugars: get_opt_decimal(row, "added_sugars")?,
            proteins: get_opt_decimal(row, "proteins")?,
            total_fats: get_opt_decimal(row, "total_fats")?,
            saturated_fats: get_opt_decimal(row, "saturated_fats")?,
            trans_fats: get_opt_decimal(row, "trans_fats")?,
            dietary_fiber: get_opt_decimal(row, "dietary_fiber")?,
            sodium: get_opt_decimal(row, "sodium")?,
            tbca_code: row.get("tbca_code")?,
            category: row.get("category")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new ingredient into the database
    pub fn create(conn: &Connection, data: &IngredientCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO ingredients (
                name, portion_unit,
                energy_kcal, energy_kj, carbohydrates, total_sugars, added_sugars,
                proteins, total_fats, saturated_fats, trans_fats, dietary_fiber, sodium,
                tbca_code, category
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                data.name,
                data.portion_unit,
                opt_decimal_sql(&data.energy_kcal),
                opt_decimal_sql(&data.energy_kj),
                opt_decimal_sql(&data.carbohydrates),
                opt_decimal_sql(&data.total_sugars),
                opt_decimal_sql(&data.added_sugars),
                opt_decimal_sql(&data.proteins),
                opt_decimal_sql(&data.total_fats),
                opt_decimal_sql(&data.saturated_fats),
                opt_decimal_sql(&data.trans_fats),
                opt_decimal_sql(&data.dietary_fiber),
                opt_decimal_sql(&data.sodium),
                data.tbca_code,
                data.category,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| {
            crate::db::DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows)
        })
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(ingredient) => Ok(Some(ingredient)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List ingredients with optional name filter and category filter
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        category: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let (sql, name_param) = match (query, category) {
            (Some(q), Some(_)) => (
                "SELECT * FROM ingredients WHERE name LIKE ?1 AND category = ?2 \
                 ORDER BY name ASC LIMIT ?3 OFFSET ?4",
                Some(format!("%{}%", q)),
            ),
            (Some(q), None) => (
                "SELECT * FROM ingredients WHERE name LIKE ?1 \
                 ORDER BY name ASC LIMIT ?2 OFFSET ?3",
                Some(format!("%{}%", q)),
            ),
            (None, Some(_)) => (
                "SELECT * FROM ingredients WHERE category = ?1 \
                 ORDER BY name ASC LIMIT ?2 OFFSET ?3",
                None,
            ),
            (None, None) => (
                "SELECT * FROM ingredients ORDER BY name ASC LIMIT ?1 OFFSET ?2",
                None,
            ),
        };

        let mut stmt = conn.prepare(sql)?;

        let ingredients = match (name_param, category) {
            (Some(pattern), Some(cat)) => stmt
                .query_map(params![pattern, cat, limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            (Some(pattern), None) => stmt
                .query_map(params![pattern, limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            (None, Some(cat)) => stmt
                .query_map(params![cat, limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
            (None, None) => stmt
                .query_map(params![limit, offset], Self::from_row)?
                .collect::<Result<Vec<_>, _>>()?,
        };

        Ok(ingredients)
    }

    /// Global search across name, TBCA code, and category
    pub fn search(conn: &Connection, term: &str, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM ingredients \
             WHERE name LIKE ?1 OR tbca_code LIKE ?1 OR category LIKE ?1 \
             ORDER BY name ASC LIMIT ?2",
        )?;

        let pattern = format!("%{}%", term);
        let ingredients = stmt
            .query_map(params![pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// List distinct non-null categories
    pub fn categories(conn: &Connection) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT category FROM ingredients \
             WHERE category IS NOT NULL ORDER BY category ASC",
        )?;

        let categories = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Update an ingredient
    pub fn update(conn: &Connection, id: i64, data: &IngredientUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref unit) = data.portion_unit {
            updates.push(format!("portion_unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit.clone()));
        }

        let decimal_fields: [(&str, &Option<Decimal>); 11] = [
            ("energy_kcal", &data.energy_kcal),
            ("energy_kj", &data.energy_kj),
            ("carbohydrates", &data.carbohydrates),
            ("total_sugars", &data.total_sugars),
            ("added_sugars", &data.added_sugars),
            ("proteins", &data.proteins),
            ("total_fats", &data.total_fats),
            ("saturated_fats", &data.saturated_fats),
            ("trans_fats", &data.trans_fats),
            ("dietary_fiber", &data.dietary_fiber),
            ("sodium", &data.sodium),
        ];
        for (column, value) in decimal_fields {
            if let Some(v) = value {
                updates.push(format!("{} = ?{}", column, params_vec.len() + 1));
                params_vec.push(Box::new(v.to_string()));
            }
        }

        if let Some(ref code) = data.tbca_code {
            updates.push(format!("tbca_code = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(code.clone()));
        }
        if let Some(ref category) = data.category {
            updates.push(format!("category = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(category.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE ingredients SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Count ingredients
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM ingredients", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of recipes referencing this ingredient
    pub fn get_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT recipe_id) FROM recipe_ingredients WHERE ingredient_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete an ingredient (only if not used in any recipe)
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(false);
        }

        // recipe_ingredients has ON DELETE RESTRICT, so this fails if still referenced
        let rows = conn.execute("DELETE FROM ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
