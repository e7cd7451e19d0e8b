//! Regulatory reference tables
//!
//! Daily-value reference amounts (ANVISA RDC 429/2020) and per-preparation-
//! method correction factors. Both tables are fixed at build time and never
//! mutated at runtime.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Reference-table revision embedded in every computed table
pub const ANVISA_VERSION: &str = "RDC-429-2020";

// ============================================================================
// Daily-value reference amounts
// ============================================================================

/// Daily value: energy (kcal)
pub const DV_ENERGY_KCAL: Decimal = dec!(2000);
/// Daily value: carbohydrates (g)
pub const DV_CARBOHYDRATES: Decimal = dec!(300);
/// Daily value: total sugars (g)
pub const DV_TOTAL_SUGARS: Decimal = dec!(50);
/// Daily value: added sugars (g)
pub const DV_ADDED_SUGARS: Decimal = dec!(50);
/// Daily value: proteins (g)
pub const DV_PROTEINS: Decimal = dec!(50);
/// Daily value: total fats (g)
pub const DV_TOTAL_FATS: Decimal = dec!(55);
/// Daily value: saturated fats (g)
pub const DV_SATURATED_FATS: Decimal = dec!(22);
/// Daily value: dietary fiber (g)
pub const DV_DIETARY_FIBER: Decimal = dec!(25);
/// Daily value: sodium (mg)
pub const DV_SODIUM: Decimal = dec!(2400);

// Trans fat has no daily-value reference under RDC 429/2020.

// ============================================================================
// Preparation methods and correction factors
// ============================================================================

/// A cooking technique that scales certain nutrients to model
/// cooking-induced change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PreparationMethod {
    Raw,
    Boiled,
    Fried,
    Baked,
    Grilled,
    Steamed,
}

impl PreparationMethod {
    /// Parse a method tag; None for anything unrecognized
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RAW" => Some(PreparationMethod::Raw),
            "BOILED" => Some(PreparationMethod::Boiled),
            "FRIED" => Some(PreparationMethod::Fried),
            "BAKED" => Some(PreparationMethod::Baked),
            "GRILLED" => Some(PreparationMethod::Grilled),
            "STEAMED" => Some(PreparationMethod::Steamed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PreparationMethod::Raw => "RAW",
            PreparationMethod::Boiled => "BOILED",
            PreparationMethod::Fried => "FRIED",
            PreparationMethod::Baked => "BAKED",
            PreparationMethod::Grilled => "GRILLED",
            PreparationMethod::Steamed => "STEAMED",
        }
    }
}

/// Correction factors applied during aggregation.
///
/// `vitamin_retention` is carried in the table for forward compatibility but
/// is not consumed by the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparationFactors {
    pub fat: Decimal,
    pub protein: Decimal,
    pub vitamin_retention: Decimal,
}

/// Identity factors: no correction
const IDENTITY_FACTORS: PreparationFactors = PreparationFactors {
    fat: dec!(1.00),
    protein: dec!(1.00),
    vitamin_retention: dec!(1.00),
};

impl PreparationMethod {
    /// Correction factors for this method
    pub fn factors(&self) -> PreparationFactors {
        match self {
            PreparationMethod::Raw => IDENTITY_FACTORS,
            PreparationMethod::Boiled => PreparationFactors {
                fat: dec!(0.95),
                protein: dec!(0.95),
                vitamin_retention: dec!(0.80),
            },
            PreparationMethod::Fried => PreparationFactors {
                fat: dec!(1.15),
                protein: dec!(1.00),
                vitamin_retention: dec!(0.70),
            },
            PreparationMethod::Baked => PreparationFactors {
                fat: dec!(1.02),
                protein: dec!(1.00),
                vitamin_retention: dec!(0.90),
            },
            PreparationMethod::Grilled => PreparationFactors {
                fat: dec!(0.98),
                protein: dec!(1.00),
                vitamin_retention: dec!(0.85),
            },
            PreparationMethod::Steamed => PreparationFactors {
                fat: dec!(0.97),
                protein: dec!(0.98),
                vitamin_retention: dec!(0.90),
            },
        }
    }
}

/// Look up the correction factors for a preparation-method tag.
///
/// Total function: an unrecognized method yields the identity factors, the
/// same lenient fallback the regulation-facing behavior requires. Not an
/// error and not silent data loss.
pub fn preparation_factors(method: &str) -> PreparationFactors {
    match PreparationMethod::from_str(method) {
        Some(m) => m.factors(),
        None => IDENTITY_FACTORS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_method_factors() {
        assert_eq!(preparation_factors("RAW").fat, dec!(1.00));
        assert_eq!(preparation_factors("BOILED").fat, dec!(0.95));
        assert_eq!(preparation_factors("BOILED").protein, dec!(0.95));
        assert_eq!(preparation_factors("FRIED").fat, dec!(1.15));
        assert_eq!(preparation_factors("FRIED").protein, dec!(1.00));
        assert_eq!(preparation_factors("BAKED").fat, dec!(1.02));
        assert_eq!(preparation_factors("GRILLED").fat, dec!(0.98));
        assert_eq!(preparation_factors("STEAMED").fat, dec!(0.97));
        assert_eq!(preparation_factors("STEAMED").protein, dec!(0.98));
    }

    #[test]
    fn test_method_parsing_is_case_insensitive() {
        assert_eq!(PreparationMethod::from_str("fried"), Some(PreparationMethod::Fried));
        assert_eq!(PreparationMethod::from_str(" Steamed "), Some(PreparationMethod::Steamed));
        assert_eq!(PreparationMethod::from_str("SOUS_VIDE"), None);
    }

    #[test]
    fn test_unknown_method_falls_back_to_identity() {
        let factors = preparation_factors("MICROWAVED");
        assert_eq!(factors.fat, dec!(1.00));
        assert_eq!(factors.protein, dec!(1.00));
        assert_eq!(factors.vitamin_retention, dec!(1.00));

        // The fallback is exactly the RAW factors
        assert_eq!(factors, preparation_factors("RAW"));
    }

    #[test]
    fn test_vitamin_retention_carried_per_method() {
        assert_eq!(preparation_factors("FRIED").vitamin_retention, dec!(0.70));
        assert_eq!(preparation_factors("BOILED").vitamin_retention, dec!(0.80));
        assert_eq!(preparation_factors("GRILLED").vitamin_retention, dec!(0.85));
    }
}
