//! NutriFacts Library
//!
//! Core functionality for recipe nutrition labeling.

pub mod build_info;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
