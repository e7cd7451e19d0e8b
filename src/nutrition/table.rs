//! Nutrition-facts table output

use rust_decimal::Decimal;
use serde::Serialize;

/// A standardized nutrition-facts table for a recipe.
///
/// Nutrient fields are per 100 units of finished product (g or ml, matching
/// the recipe's portion unit) at scale 2; daily-value percentages are at
/// scale 1. Built once by the engine and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct NutritionTable {
    pub recipe_id: Option<i64>,
    pub recipe_name: String,
    pub preparation_method: String,

    // Per-100-unit nutrient values
    pub energy_kcal: Decimal,
    pub energy_kj: Decimal,
    pub carbohydrates: Decimal,
    pub total_sugars: Decimal,
    pub added_sugars: Decimal,
    pub proteins: Decimal,
    pub total_fats: Decimal,
    pub saturated_fats: Decimal,
    pub trans_fats: Decimal,
    pub dietary_fiber: Decimal,
    pub sodium: Decimal,

    // Percent of daily value; trans fat has no reference amount
    pub energy_kcal_dv: Decimal,
    pub carbohydrates_dv: Decimal,
    pub total_sugars_dv: Decimal,
    pub added_sugars_dv: Decimal,
    pub proteins_dv: Decimal,
    pub total_fats_dv: Decimal,
    pub saturated_fats_dv: Decimal,
    pub dietary_fiber_dv: Decimal,
    pub sodium_dv: Decimal,

    /// Regulatory reference-table revision the percentages were computed from
    pub anvisa_version: String,
    /// ISO-8601 UTC timestamp of the computation
    pub calculated_at: String,
}
