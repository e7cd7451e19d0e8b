//! NutriFacts MCP Server Implementation
//!
//! Implements the MCP server with all NutriFacts tools. Numeric tool
//! parameters arrive as JSON numbers and are converted to fixed-point
//! decimals here, so everything past this boundary is decimal-only.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{
    IngredientCreate, IngredientUpdate, RecipeCreate, RecipeIngredientCreate,
    RecipeIngredientUpdate, RecipeUpdate,
};
use crate::tools::ingredients;
use crate::tools::labels;
use crate::tools::recipes;
use crate::tools::status::StatusTracker;

/// NutriFacts MCP Service
#[derive(Clone)]
pub struct NutriFactsService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<NutriFactsService>,
}

impl NutriFactsService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

/// Convert a JSON number to a scale-2 decimal
fn decimal_param(value: f64, field: &str) -> Result<Decimal, McpError> {
    Decimal::try_from(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .map_err(|e| McpError::invalid_params(format!("Invalid {}: {}", field, e), None))
}

fn opt_decimal_param(value: Option<f64>, field: &str) -> Result<Option<Decimal>, McpError> {
    value.map(|v| decimal_param(v, field)).transpose()
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddIngredientParams {
    /// Ingredient name
    pub name: String,
    /// "g" for solids, "ml" for liquids; nutrient values are per 100 units
    pub portion_unit: String,
    /// Energy in kcal per 100 units
    pub energy_kcal: Option<f64>,
    /// Energy in kJ per 100 units
    pub energy_kj: Option<f64>,
    /// Carbohydrates in g per 100 units
    pub carbohydrates: Option<f64>,
    /// Total sugars in g per 100 units
    pub total_sugars: Option<f64>,
    /// Added sugars in g per 100 units
    pub added_sugars: Option<f64>,
    /// Proteins in g per 100 units
    pub proteins: Option<f64>,
    /// Total fats in g per 100 units
    pub total_fats: Option<f64>,
    /// Saturated fats in g per 100 units
    pub saturated_fats: Option<f64>,
    /// Trans fats in g per 100 units
    pub trans_fats: Option<f64>,
    /// Dietary fiber in g per 100 units
    pub dietary_fiber: Option<f64>,
    /// Sodium in mg per 100 units
    pub sodium: Option<f64>,
    /// Optional TBCA food-composition code (unique)
    pub tbca_code: Option<String>,
    /// Optional category (e.g. "cereals", "meats")
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetIngredientParams {
    /// Ingredient ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListIngredientsParams {
    /// Name filter (optional)
    pub query: Option<String>,
    /// Category filter (optional)
    pub category: Option<String>,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Offset for pagination (default 0)
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 {
    50
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchIngredientsParams {
    /// Search term matched against name, TBCA code, and category
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateIngredientParams {
    /// Ingredient ID to update
    pub id: i64,
    pub name: Option<String>,
    pub portion_unit: Option<String>,
    pub energy_kcal: Option<f64>,
    pub energy_kj: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub total_sugars: Option<f64>,
    pub added_sugars: Option<f64>,
    pub proteins: Option<f64>,
    pub total_fats: Option<f64>,
    pub saturated_fats: Option<f64>,
    pub trans_fats: Option<f64>,
    pub dietary_fiber: Option<f64>,
    pub sodium: Option<f64>,
    pub tbca_code: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteIngredientParams {
    /// Ingredient ID to delete
    pub id: i64,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    /// Name of the recipe
    pub name: String,
    /// RAW, BOILED, FRIED, BAKED, GRILLED, or STEAMED (default RAW).
    /// Other values are accepted and calculate without correction.
    #[serde(default = "default_method")]
    pub preparation_method: String,
    /// Total finished portion after preparation (must be > 0)
    pub total_portion: f64,
    /// "g" or "ml", matching the ingredient basis
    pub portion_unit: String,
    /// Number of servings the recipe yields (optional)
    pub servings: Option<i64>,
    /// Preparation instructions (optional)
    pub instructions: Option<String>,
}

fn default_method() -> String {
    "RAW".to_string()
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetRecipeParams {
    /// Recipe ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Search query for recipe name (optional)
    pub query: Option<String>,
    /// Sort by: name, created_at, or preparation_method (default name)
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// Sort order: asc or desc (default asc)
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Offset for pagination (default 0)
    #[serde(default)]
    pub offset: i64,
}

fn default_sort_by() -> String {
    "name".to_string()
}

fn default_sort_order() -> String {
    "asc".to_string()
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeParams {
    /// Recipe ID to update
    pub id: i64,
    pub name: Option<String>,
    pub preparation_method: Option<String>,
    /// New total finished portion (must be > 0)
    pub total_portion: Option<f64>,
    pub portion_unit: Option<String>,
    pub servings: Option<i64>,
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteRecipeParams {
    /// Recipe ID to delete
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeIngredientParams {
    /// Recipe ID to add the ingredient to
    pub recipe_id: i64,
    /// Ingredient ID from the catalog
    pub ingredient_id: i64,
    /// Quantity used, in the ingredient's unit basis (g or ml)
    pub quantity: f64,
    /// Optional notes (e.g. the original household measure)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeIngredientParams {
    /// Recipe ingredient row ID
    pub id: i64,
    /// New quantity (must be > 0)
    pub quantity: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveRecipeIngredientParams {
    /// Recipe ingredient row ID to remove
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalculateNutritionTableParams {
    /// Recipe ID to calculate the nutrition-facts table for
    pub recipe_id: i64,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl NutriFactsService {
    #[tool(description = "Get the current status of the NutriFacts service including build info, database status, and process information")]
    async fn nutrifacts_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get step-by-step instructions for building nutrition-facts tables. Call this when starting a labeling session or when unsure how to use the tools.")]
    fn labeling_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::LABELING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(LABELING_INSTRUCTIONS)]))
    }

    // --- Ingredients ---

    #[tool(description = "Add an ingredient to the catalog with its nutrient profile per 100 g or 100 ml. Omit nutrient fields with no authoritative value.")]
    fn add_ingredient(&self, Parameters(p): Parameters<AddIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientCreate {
            name: p.name,
            portion_unit: p.portion_unit,
            energy_kcal: opt_decimal_param(p.energy_kcal, "energy_kcal")?,
            energy_kj: opt_decimal_param(p.energy_kj, "energy_kj")?,
            carbohydrates: opt_decimal_param(p.carbohydrates, "carbohydrates")?,
            total_sugars: opt_decimal_param(p.total_sugars, "total_sugars")?,
            added_sugars: opt_decimal_param(p.added_sugars, "added_sugars")?,
            proteins: opt_decimal_param(p.proteins, "proteins")?,
            total_fats: opt_decimal_param(p.total_fats, "total_fats")?,
            saturated_fats: opt_decimal_param(p.saturated_fats, "saturated_fats")?,
            trans_fats: opt_decimal_param(p.trans_fats, "trans_fats")?,
            dietary_fiber: opt_decimal_param(p.dietary_fiber, "dietary_fiber")?,
            sodium: opt_decimal_param(p.sodium, "sodium")?,
            tbca_code: p.tbca_code,
            category: p.category,
        };
        let result = ingredients::add_ingredient(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get full details for an ingredient including its nutrient profile")]
    fn get_ingredient(&self, Parameters(p): Parameters<GetIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::get_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(item) => serde_json::to_string_pretty(&item),
            None => Ok(format!(r#"{{"error": "Ingredient not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List ingredients with optional name and category filters, and pagination")]
    fn list_ingredients(&self, Parameters(p): Parameters<ListIngredientsParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::list_ingredients(&self.database, p.query.as_deref(), p.category.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Search ingredients by name, TBCA code, or category")]
    fn search_ingredients(&self, Parameters(p): Parameters<SearchIngredientsParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::search_ingredients(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List the distinct ingredient categories in use")]
    fn list_ingredient_categories(&self) -> Result<CallToolResult, McpError> {
        let result = ingredients::list_ingredient_categories(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update an ingredient's name, unit, category, or nutrient profile")]
    fn update_ingredient(&self, Parameters(p): Parameters<UpdateIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientUpdate {
            name: p.name,
            portion_unit: p.portion_unit,
            energy_kcal: opt_decimal_param(p.energy_kcal, "energy_kcal")?,
            energy_kj: opt_decimal_param(p.energy_kj, "energy_kj")?,
            carbohydrates: opt_decimal_param(p.carbohydrates, "carbohydrates")?,
            total_sugars: opt_decimal_param(p.total_sugars, "total_sugars")?,
            added_sugars: opt_decimal_param(p.added_sugars, "added_sugars")?,
            proteins: opt_decimal_param(p.proteins, "proteins")?,
            total_fats: opt_decimal_param(p.total_fats, "total_fats")?,
            saturated_fats: opt_decimal_param(p.saturated_fats, "saturated_fats")?,
            trans_fats: opt_decimal_param(p.trans_fats, "trans_fats")?,
            dietary_fiber: opt_decimal_param(p.dietary_fiber, "dietary_fiber")?,
            sodium: opt_decimal_param(p.sodium, "sodium")?,
            tbca_code: p.tbca_code,
            category: p.category,
        };
        let result = ingredients::update_ingredient(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete an ingredient (only allowed if not used in any recipes)")]
    fn delete_ingredient(&self, Parameters(p): Parameters<DeleteIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Ok(success) => serde_json::to_string_pretty(&success),
            Err(blocked) => serde_json::to_string_pretty(&blocked),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Recipes ---

    #[tool(description = "Create a new recipe with its preparation method and total finished portion")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            preparation_method: p.preparation_method,
            total_portion: decimal_param(p.total_portion, "total_portion")?,
            portion_unit: p.portion_unit,
            servings: p.servings,
            instructions: p.instructions,
        };
        let result = recipes::create_recipe(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get a recipe with its ingredient rows")]
    fn get_recipe(&self, Parameters(p): Parameters<GetRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(recipe) => serde_json::to_string_pretty(&recipe),
            None => Ok(format!(r#"{{"error": "Recipe not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List recipes with optional name search, sorting, and pagination")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(&self.database, p.query.as_deref(), &p.sort_by, &p.sort_order, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a recipe's name, preparation method, portion, servings, or instructions")]
    fn update_recipe(&self, Parameters(p): Parameters<UpdateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeUpdate {
            name: p.name,
            preparation_method: p.preparation_method,
            total_portion: opt_decimal_param(p.total_portion, "total_portion")?,
            portion_unit: p.portion_unit,
            servings: p.servings,
            instructions: p.instructions,
        };
        let result = recipes::update_recipe(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a recipe and its ingredient rows")]
    fn delete_recipe(&self, Parameters(p): Parameters<DeleteRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Recipe Ingredients ---

    #[tool(description = "Add an ingredient to a recipe with the quantity used (in the ingredient's g/ml basis)")]
    fn add_recipe_ingredient(&self, Parameters(p): Parameters<AddRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeIngredientCreate {
            recipe_id: p.recipe_id,
            ingredient_id: p.ingredient_id,
            quantity: decimal_param(p.quantity, "quantity")?,
            notes: p.notes,
        };
        let result = recipes::add_recipe_ingredient(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a recipe ingredient's quantity or notes")]
    fn update_recipe_ingredient(&self, Parameters(p): Parameters<UpdateRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeIngredientUpdate {
            quantity: opt_decimal_param(p.quantity, "quantity")?,
            notes: p.notes,
        };
        let result = recipes::update_recipe_ingredient(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove an ingredient from a recipe")]
    fn remove_recipe_ingredient(&self, Parameters(p): Parameters<RemoveRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::remove_recipe_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Nutrition Table ---

    #[tool(description = "Compute the ANVISA-style nutrition-facts table for a recipe: per-100g/ml nutrient values and percent daily values, corrected for the preparation method")]
    fn calculate_nutrition_table(&self, Parameters(p): Parameters<CalculateNutritionTableParams>) -> Result<CallToolResult, McpError> {
        let result = labels::calculate_nutrition_table(&self.database, p.recipe_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for NutriFactsService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutrifacts".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriFacts".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriFacts - Recipe nutrition labeling per ANVISA RDC 429/2020. \
                 IMPORTANT: Call labeling_instructions before building labels. \
                 Ingredients: add/get/list/search/update/delete_ingredient, list_ingredient_categories. \
                 Nutrient values are always per 100 g (solids) or 100 ml (liquids). \
                 Recipes: create/get/list/update/delete_recipe, add/update/remove_recipe_ingredient. \
                 A recipe's total_portion is the finished weight/volume after preparation. \
                 Labeling: calculate_nutrition_table returns per-100-unit values plus %DV, \
                 corrected for the preparation method (RAW/BOILED/FRIED/BAKED/GRILLED/STEAMED)."
                    .into(),
            ),
        }
    }
}
