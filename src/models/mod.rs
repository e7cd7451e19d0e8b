//! Data models
//!
//! Rust structs representing database entities.

mod ingredient;
mod recipe;
mod recipe_ingredient;

pub use ingredient::{Ingredient, IngredientCreate, IngredientUpdate};
pub use recipe::{Recipe, RecipeCreate, RecipeUpdate};
pub use recipe_ingredient::{
    RecipeIngredient, RecipeIngredientCreate, RecipeIngredientDetail, RecipeIngredientUpdate,
    ResolvedComponent, resolve_components,
};

use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::Decimal;

/// Read a non-null TEXT column as a Decimal
pub(crate) fn get_decimal(row: &Row, col: &str) -> rusqlite::Result<Decimal> {
    let s: String = row.get(col)?;
    parse_decimal(&s)
}

/// Read a nullable TEXT column as an optional Decimal (NULL = unknown)
pub(crate) fn get_opt_decimal(row: &Row, col: &str) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = row.get(col)?;
    s.map(|s| parse_decimal(&s)).transpose()
}

fn parse_decimal(s: &str) -> rusqlite::Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

/// Render an optional Decimal for storage (NULL preserved)
pub(crate) fn opt_decimal_sql(value: &Option<Decimal>) -> Option<String> {
    value.as_ref().map(Decimal::to_string)
}
