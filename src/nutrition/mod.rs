//! Nutrition aggregation and normalization
//!
//! Reference tables, the calculation engine, and the nutrition-facts table it
//! produces.

pub mod engine;
pub mod reference;
pub mod table;

pub use engine::{calculate_table, NutritionError};
pub use reference::{preparation_factors, PreparationFactors, PreparationMethod, ANVISA_VERSION};
pub use table::NutritionTable;
