//! NutriFacts tools module
//!
//! MCP tool implementations: validation and database orchestration on top of
//! the models and the nutrition engine.

pub mod ingredients;
pub mod labels;
pub mod recipes;
pub mod status;

/// Validate a portion unit tag
pub(crate) fn validate_portion_unit(unit: &str) -> Result<(), String> {
    match unit {
        "g" | "ml" => Ok(()),
        other => Err(format!(
            "portion_unit must be \"g\" or \"ml\", got \"{}\"",
            other
        )),
    }
}
