//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    // Get current version
    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    // Run migrations
    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    debug_assert!(version <= SCHEMA_VERSION);
    Ok(version)
}

/// Migration v1: Initial schema
///
/// Nutrient and quantity columns are stored as TEXT and parsed into
/// `rust_decimal::Decimal` on read; NULL means the value is unknown
/// (distinct from "0").
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- INGREDIENTS
        -- Nutrient profiles per 100 g / 100 ml (TBCA basis)
        -- ============================================
        CREATE TABLE ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            portion_unit TEXT NOT NULL CHECK(portion_unit IN ('g', 'ml')),

            -- Nutritional values per 100 units, NULL = unknown
            energy_kcal TEXT,
            energy_kj TEXT,
            carbohydrates TEXT,
            total_sugars TEXT,
            added_sugars TEXT,
            proteins TEXT,
            total_fats TEXT,
            saturated_fats TEXT,
            trans_fats TEXT,
            dietary_fiber TEXT,
            sodium TEXT,                         -- milligrams

            -- Metadata
            tbca_code TEXT UNIQUE,
            category TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_ingredients_name ON ingredients(name);
        CREATE INDEX idx_ingredients_category ON ingredients(category);

        -- ============================================
        -- RECIPES
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            preparation_method TEXT NOT NULL DEFAULT 'RAW',
            total_portion TEXT NOT NULL,          -- finished portion, > 0
            portion_unit TEXT NOT NULL CHECK(portion_unit IN ('g', 'ml')),
            servings INTEGER,
            instructions TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);

        -- ============================================
        -- RECIPE INGREDIENTS
        -- Junction table: which ingredients in which recipes
        -- ============================================
        CREATE TABLE recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE RESTRICT,
            quantity TEXT NOT NULL,               -- amount used, same unit basis as the ingredient
            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX idx_recipe_ingredients_ingredient ON recipe_ingredients(ingredient_id);
        "#,
    )?;

    Ok(())
}
