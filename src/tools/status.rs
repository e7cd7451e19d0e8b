//! NutriFacts status tool
//!
//! Provides runtime status information about the NutriFacts service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Labeling instructions for AI assistants
pub const LABELING_INSTRUCTIONS: &str = r#"
# NutriFacts Labeling Instructions

This guide explains how to build ANVISA-style nutrition-facts tables (RDC
429/2020) using the NutriFacts tools.

## Overview

To label a recipe, you need:
1. **Ingredients** - Nutrient profiles stored per 100 g or 100 ml
2. **Recipe** - A preparation method, the total finished portion, and the
   ingredient quantities used
3. **Nutrition table** - Computed on demand; per-100-unit values plus %DV

## Ingredient Data Rules

- Nutrient values are ALWAYS per 100 g (solids) or per 100 ml (liquids);
  set `portion_unit` accordingly. Never store per-serving values.
- Leave a nutrient field out entirely when the source does not report it.
  An absent value is treated as zero in recipe totals but stays absent on
  the ingredient record, so it can be filled in later.
- Sodium is in milligrams per 100 units; everything else in grams or kcal/kJ.
- `tbca_code` is the optional TBCA (Brazilian Food Composition Table) code;
  it must be unique when present.

## Recipe Rules

- `total_portion` is the finished weight/volume AFTER preparation, not the
  sum of raw ingredient quantities. A stew that starts at 1200 g of raw
  ingredients and reduces to 900 g has total_portion = 900.
- `preparation_method` is one of RAW, BOILED, FRIED, BAKED, GRILLED,
  STEAMED. Other values are accepted and calculate without correction.
- Ingredient quantities are in the ingredient's own unit basis (g or ml).

## Preparation Correction

The preparation method corrects fats and proteins for cooking-induced
change (e.g. FRIED multiplies fats by 1.15; BOILED multiplies proteins by
0.95). Trans fat is never corrected. Pick the method that matches the final
cooking step of the recipe.

## Workflow

1. `search_ingredients(term)` - check the catalog first
2. `add_ingredient(...)` - add missing profiles (per 100 g / 100 ml!)
3. `create_recipe(name, preparation_method, total_portion, portion_unit)`
4. `add_recipe_ingredient(recipe_id, ingredient_id, quantity)` per item
5. `calculate_nutrition_table(recipe_id)` - returns the facts table

## Reading the Output

- Nutrient values are per 100 g/ml of the finished product, 2 decimal
  places, round-half-up.
- `*_dv` fields are percent of daily value (1 decimal place). Trans fat
  has no daily value under RDC 429/2020 and no %DV field.
- `anvisa_version` records the reference-table revision used.

## Quick Reference

| Task | Tool |
|------|------|
| Find ingredients | `search_ingredients` |
| Add ingredient profile | `add_ingredient` |
| Browse categories | `list_ingredient_categories` |
| Create recipe | `create_recipe` |
| Add ingredient to recipe | `add_recipe_ingredient` |
| View recipe | `get_recipe` |
| Compute facts table | `calculate_nutrition_table` |
| Service status | `nutrifacts_status` |
"#;

/// Runtime status of the NutriFacts service
#[derive(Debug, Clone, Serialize)]
pub struct NutriFactsStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    pub fn get_status(&self) -> NutriFactsStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutriFactsStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
