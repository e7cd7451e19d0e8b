//! Nutrition calculation engine
//!
//! Pure transform from a recipe's resolved components to a nutrition-facts
//! table: aggregate contributions, normalize to a per-100-unit basis, then
//! derive percent-daily-value figures. All arithmetic is fixed-point decimal
//! with round-half-up applied at fixed stages; no floating point anywhere on
//! this path.

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::ResolvedComponent;

use super::reference::{
    preparation_factors, ANVISA_VERSION, DV_ADDED_SUGARS, DV_CARBOHYDRATES, DV_DIETARY_FIBER,
    DV_ENERGY_KCAL, DV_PROTEINS, DV_SATURATED_FATS, DV_SODIUM, DV_TOTAL_FATS, DV_TOTAL_SUGARS,
};
use super::table::NutritionTable;

/// Errors from nutrition table calculation
#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("recipe has no ingredients; a nutrition table requires at least one")]
    EmptyRecipe,
}

/// Round half-up (midpoint away from zero) to `dp` decimal places
fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Unrounded per-nutrient running totals for the whole recipe portion
#[derive(Debug, Default)]
struct RunningTotals {
    energy_kcal: Decimal,
    energy_kj: Decimal,
    carbohydrates: Decimal,
    total_sugars: Decimal,
    added_sugars: Decimal,
    proteins: Decimal,
    total_fats: Decimal,
    saturated_fats: Decimal,
    trans_fats: Decimal,
    dietary_fiber: Decimal,
    sodium: Decimal,
}

/// Percent of daily value for an already-normalized nutrient amount.
///
/// The ratio is rounded to 4 places before scaling to a percentage, then the
/// percentage to 1 place. A zero reference yields exactly 0 rather than a
/// division error.
fn percent_dv(value: Decimal, reference: Decimal) -> Decimal {
    if reference.is_zero() {
        return Decimal::ZERO;
    }
    let ratio = round_half_up(value / reference, 4);
    round_half_up(ratio * dec!(100), 1)
}

/// Compute the nutrition-facts table for a recipe.
///
/// `components` must be non-empty and `total_portion` strictly positive (the
/// latter is enforced by the callers that load recipes from storage). Absent
/// nutrient values contribute zero to the totals. The preparation method's
/// fat factor corrects total and saturated fats, the protein factor corrects
/// proteins; trans fat and every other nutrient pass through uncorrected.
pub fn calculate_table(
    recipe_id: Option<i64>,
    recipe_name: &str,
    preparation_method: &str,
    total_portion: Decimal,
    components: &[ResolvedComponent],
) -> Result<NutritionTable, NutritionError> {
    if components.is_empty() {
        return Err(NutritionError::EmptyRecipe);
    }

    let factors = preparation_factors(preparation_method);
    debug!(
        recipe = recipe_name,
        method = preparation_method,
        components = components.len(),
        "aggregating nutrient totals"
    );

    let mut totals = RunningTotals::default();
    for component in components {
        // Quantity as a fraction of the ingredient's 100-unit reference basis
        let proportion = round_half_up(component.quantity / dec!(100), 4);
        let nutrient = |v: Option<Decimal>| v.unwrap_or_default() * proportion;

        let p = &component.ingredient;
        totals.energy_kcal += nutrient(p.energy_kcal);
        totals.energy_kj += nutrient(p.energy_kj);
        totals.carbohydrates += nutrient(p.carbohydrates);
        totals.total_sugars += nutrient(p.total_sugars);
        totals.added_sugars += nutrient(p.added_sugars);
        totals.proteins += nutrient(p.proteins) * factors.protein;
        totals.total_fats += nutrient(p.total_fats) * factors.fat;
        totals.saturated_fats += nutrient(p.saturated_fats) * factors.fat;
        totals.trans_fats += nutrient(p.trans_fats);
        totals.dietary_fiber += nutrient(p.dietary_fiber);
        totals.sodium += nutrient(p.sodium);
    }

    // Rescale to the per-100-unit labeling basis. Totals stay unrounded until
    // here; each field is rounded exactly once, after normalization.
    let normalization_factor = round_half_up(dec!(100) / total_portion, 4);
    let normalize = |total: Decimal| round_half_up(total * normalization_factor, 2);

    let energy_kcal = normalize(totals.energy_kcal);
    let energy_kj = normalize(totals.energy_kj);
    let carbohydrates = normalize(totals.carbohydrates);
    let total_sugars = normalize(totals.total_sugars);
    let added_sugars = normalize(totals.added_sugars);
    let proteins = normalize(totals.proteins);
    let total_fats = normalize(totals.total_fats);
    let saturated_fats = normalize(totals.saturated_fats);
    let trans_fats = normalize(totals.trans_fats);
    let dietary_fiber = normalize(totals.dietary_fiber);
    let sodium = normalize(totals.sodium);

    let table = NutritionTable {
        recipe_id,
        recipe_name: recipe_name.to_string(),
        preparation_method: preparation_method.to_string(),
        energy_kcal,
        energy_kj,
        carbohydrates,
        total_sugars,
        added_sugars,
        proteins,
        total_fats,
        saturated_fats,
        trans_fats,
        dietary_fiber,
        sodium,
        energy_kcal_dv: percent_dv(energy_kcal, DV_ENERGY_KCAL),
        carbohydrates_dv: percent_dv(carbohydrates, DV_CARBOHYDRATES),
        total_sugars_dv: percent_dv(total_sugars, DV_TOTAL_SUGARS),
        added_sugars_dv: percent_dv(added_sugars, DV_ADDED_SUGARS),
        proteins_dv: percent_dv(proteins, DV_PROTEINS),
        total_fats_dv: percent_dv(total_fats, DV_TOTAL_FATS),
        saturated_fats_dv: percent_dv(saturated_fats, DV_SATURATED_FATS),
        dietary_fiber_dv: percent_dv(dietary_fiber, DV_DIETARY_FIBER),
        sodium_dv: percent_dv(sodium, DV_SODIUM),
        anvisa_version: ANVISA_VERSION.to_string(),
        calculated_at: Utc::now().to_rfc3339(),
    };

    info!(
        recipe = recipe_name,
        energy_kcal = %table.energy_kcal,
        "nutrition table computed"
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;

    fn blank_ingredient(name: &str) -> Ingredient {
        Ingredient {
            id: 0,
            name: name.to_string(),
            portion_unit: "g".to_string(),
            energy_kcal: None,
            energy_kj: None,
            carbohydrates: None,
            total_sugars: None,
            added_sugars: None,
            proteins: None,
            total_fats: None,
            saturated_fats: None,
            trans_fats: None,
            dietary_fiber: None,
            sodium: None,
            tbca_code: None,
            category: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn component(ingredient: Ingredient, quantity: Decimal) -> ResolvedComponent {
        ResolvedComponent { ingredient, quantity }
    }

    #[test]
    fn test_concrete_scenario_half_portion() {
        // 200 kcal / 20 g carb / 10 g protein / 5 g fat per 100 g; 50 g used
        // in a 50 g finished portion. Normalization factor is 2, so the
        // per-100 values equal the profile values.
        let mut ing = blank_ingredient("Test profile");
        ing.energy_kcal = Some(dec!(200));
        ing.carbohydrates = Some(dec!(20));
        ing.proteins = Some(dec!(10));
        ing.total_fats = Some(dec!(5));

        let table = calculate_table(
            None,
            "Half portion",
            "RAW",
            dec!(50),
            &[component(ing, dec!(50))],
        )
        .unwrap();

        assert_eq!(table.energy_kcal, dec!(200.00));
        assert_eq!(table.carbohydrates, dec!(20.00));
        assert_eq!(table.proteins, dec!(10.00));
        assert_eq!(table.total_fats, dec!(5.00));
        assert_eq!(table.energy_kcal_dv, dec!(10.0));
        assert_eq!(table.anvisa_version, ANVISA_VERSION);
    }

    #[test]
    fn test_empty_recipe_rejected() {
        let result = calculate_table(None, "Empty", "RAW", dec!(100), &[]);
        assert!(matches!(result, Err(NutritionError::EmptyRecipe)));
    }

    #[test]
    fn test_absent_nutrient_equals_explicit_zero() {
        let mut absent = blank_ingredient("Absent carbs");
        absent.energy_kcal = Some(dec!(50));

        let mut zeroed = blank_ingredient("Zero carbs");
        zeroed.energy_kcal = Some(dec!(50));
        zeroed.carbohydrates = Some(dec!(0));
        zeroed.total_sugars = Some(dec!(0));
        zeroed.trans_fats = Some(dec!(0));
        zeroed.sodium = Some(dec!(0));

        let a = calculate_table(None, "A", "FRIED", dec!(100), &[component(absent, dec!(80))])
            .unwrap();
        let b = calculate_table(None, "B", "FRIED", dec!(100), &[component(zeroed, dec!(80))])
            .unwrap();

        assert_eq!(a.energy_kcal, b.energy_kcal);
        assert_eq!(a.carbohydrates, b.carbohydrates);
        assert_eq!(a.total_sugars, b.total_sugars);
        assert_eq!(a.trans_fats, b.trans_fats);
        assert_eq!(a.sodium, b.sodium);
        assert_eq!(a.carbohydrates, dec!(0.00));
    }

    #[test]
    fn test_normalization_identity_at_100_units() {
        // Total portion of 100 makes the normalization factor exactly 1; the
        // output equals the rounded raw sum.
        let mut ing = blank_ingredient("Identity");
        ing.carbohydrates = Some(dec!(10));
        ing.sodium = Some(dec!(120));

        let table = calculate_table(
            None,
            "Identity",
            "RAW",
            dec!(100),
            &[component(ing, dec!(50))],
        )
        .unwrap();

        assert_eq!(table.carbohydrates, dec!(5.00));
        assert_eq!(table.sodium, dec!(60.00));
    }

    #[test]
    fn test_scale_invariance_within_tolerance() {
        let profile = || {
            let mut ing = blank_ingredient("Scaled");
            ing.energy_kcal = Some(dec!(123.45));
            ing.carbohydrates = Some(dec!(20));
            ing.proteins = Some(dec!(8.2));
            ing
        };

        let base = calculate_table(
            None,
            "Base",
            "RAW",
            dec!(100),
            &[component(profile(), dec!(100))],
        )
        .unwrap();

        for k in [dec!(2), dec!(3), dec!(4)] {
            let scaled = calculate_table(
                None,
                "Scaled",
                "RAW",
                dec!(100) * k,
                &[component(profile(), dec!(100) * k)],
            )
            .unwrap();

            let tolerance = dec!(0.01);
            assert!((base.energy_kcal - scaled.energy_kcal).abs() <= tolerance);
            assert!((base.carbohydrates - scaled.carbohydrates).abs() <= tolerance);
            assert!((base.proteins - scaled.proteins).abs() <= tolerance);
        }
    }

    #[test]
    fn test_fat_factor_scales_fats_only() {
        let profile = || {
            let mut ing = blank_ingredient("Fatty");
            ing.total_fats = Some(dec!(10));
            ing.saturated_fats = Some(dec!(4));
            ing.trans_fats = Some(dec!(2));
            ing.proteins = Some(dec!(10));
            ing.carbohydrates = Some(dec!(30));
            ing
        };

        let raw = calculate_table(None, "Raw", "RAW", dec!(100), &[component(profile(), dec!(100))])
            .unwrap();
        let fried =
            calculate_table(None, "Fried", "FRIED", dec!(100), &[component(profile(), dec!(100))])
                .unwrap();

        // FRIED fat factor 1.15, protein factor 1.00
        assert_eq!(fried.total_fats, dec!(11.50));
        assert_eq!(fried.saturated_fats, dec!(4.60));
        assert_eq!(fried.proteins, raw.proteins);
        assert_eq!(fried.carbohydrates, raw.carbohydrates);
        // Trans fat is exempt from preparation correction
        assert_eq!(fried.trans_fats, raw.trans_fats);
        assert_eq!(fried.trans_fats, dec!(2.00));
    }

    #[test]
    fn test_protein_factor_applied_for_boiled() {
        let mut ing = blank_ingredient("Protein source");
        ing.proteins = Some(dec!(10));

        let table =
            calculate_table(None, "Boiled", "BOILED", dec!(100), &[component(ing, dec!(100))])
                .unwrap();
        assert_eq!(table.proteins, dec!(9.50));
    }

    #[test]
    fn test_unknown_method_matches_raw() {
        let profile = || {
            let mut ing = blank_ingredient("Mystery");
            ing.energy_kcal = Some(dec!(150));
            ing.total_fats = Some(dec!(7.5));
            ing.proteins = Some(dec!(6));
            ing
        };

        let raw = calculate_table(None, "Raw", "RAW", dec!(200), &[component(profile(), dec!(150))])
            .unwrap();
        let unknown = calculate_table(
            None,
            "Unknown",
            "MICROWAVED",
            dec!(200),
            &[component(profile(), dec!(150))],
        )
        .unwrap();

        assert_eq!(raw.energy_kcal, unknown.energy_kcal);
        assert_eq!(raw.total_fats, unknown.total_fats);
        assert_eq!(raw.proteins, unknown.proteins);
    }

    #[test]
    fn test_dv_fields_non_negative_and_no_trans_fat_dv() {
        let mut ing = blank_ingredient("Everything");
        ing.energy_kcal = Some(dec!(250));
        ing.carbohydrates = Some(dec!(30));
        ing.total_sugars = Some(dec!(12));
        ing.added_sugars = Some(dec!(6));
        ing.proteins = Some(dec!(9));
        ing.total_fats = Some(dec!(11));
        ing.saturated_fats = Some(dec!(3.5));
        ing.trans_fats = Some(dec!(0.2));
        ing.dietary_fiber = Some(dec!(4));
        ing.sodium = Some(dec!(480));

        let table =
            calculate_table(None, "Everything", "BAKED", dec!(100), &[component(ing, dec!(100))])
                .unwrap();

        for dv in [
            table.energy_kcal_dv,
            table.carbohydrates_dv,
            table.total_sugars_dv,
            table.added_sugars_dv,
            table.proteins_dv,
            table.total_fats_dv,
            table.saturated_fats_dv,
            table.dietary_fiber_dv,
            table.sodium_dv,
        ] {
            assert!(dv >= Decimal::ZERO);
        }

        // The output carries no trans-fat daily value
        let json = serde_json::to_value(&table).unwrap();
        assert!(json.get("trans_fats").is_some());
        assert!(json.get("trans_fats_dv").is_none());
    }

    #[test]
    fn test_zero_reference_yields_zero_not_error() {
        assert_eq!(percent_dv(dec!(42), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_dv_rounding_to_one_place() {
        // 480 mg sodium / 2400 mg reference = 0.2000 -> 20.0
        assert_eq!(percent_dv(dec!(480), dec!(2400)), dec!(20.0));
        // 3.5 g saturated fat / 22 g = 0.1591 (half-up at 4 dp) -> 15.9
        assert_eq!(percent_dv(dec!(3.5), dec!(22)), dec!(15.9));
    }

    #[test]
    fn test_decimal_path_diverges_from_floating_point() {
        // 5.35 g carbohydrate per 100 g, 50 g used in 100 g portion. The
        // exact total is 2.675, which rounds half-up to 2.68. The same
        // computation in f64 lands just below the midpoint and rounds down.
        let mut ing = blank_ingredient("Adversarial");
        ing.carbohydrates = Some(dec!(5.35));

        let table =
            calculate_table(None, "Adversarial", "RAW", dec!(100), &[component(ing, dec!(50))])
                .unwrap();
        assert_eq!(table.carbohydrates, dec!(2.68));

        let float_total = 5.35_f64 * 0.5;
        let float_rounded = (float_total * 100.0).round() / 100.0;
        assert_eq!(float_rounded, 2.67);
        assert_ne!(table.carbohydrates.to_string(), format!("{:.2}", float_rounded));
    }

    #[test]
    fn test_multi_component_aggregation() {
        let mut beans = blank_ingredient("Beans");
        beans.energy_kcal = Some(dec!(76));
        beans.proteins = Some(dec!(4.8));
        beans.sodium = Some(dec!(2));

        let mut pork = blank_ingredient("Pork");
        pork.energy_kcal = Some(dec!(290));
        pork.proteins = Some(dec!(26));
        pork.total_fats = Some(dec!(21));
        pork.sodium = Some(dec!(60));

        // 300 g beans + 200 g pork boiled down to 400 g finished portion
        let table = calculate_table(
            Some(7),
            "Feijoada",
            "BOILED",
            dec!(400),
            &[component(beans, dec!(300)), component(pork, dec!(200))],
        )
        .unwrap();

        // energy: 76*3 + 290*2 = 808; *0.25 = 202.00 (uncorrected)
        assert_eq!(table.energy_kcal, dec!(202.00));
        // protein: (4.8*3 + 26*2) * 0.95 = 66.4 * 0.95 = 63.08; *0.25 = 15.77
        assert_eq!(table.proteins, dec!(15.77));
        // fat: 21*2 * 0.95 = 39.9; *0.25 = 9.98 (rounded once, after normalization)
        assert_eq!(table.total_fats, dec!(9.98));
        // sodium: 2*3 + 60*2 = 126; *0.25 = 31.50
        assert_eq!(table.sodium, dec!(31.50));
        assert_eq!(table.recipe_id, Some(7));
    }
}
