//! Tool configuration
//!
//! Optional JSON file; every field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::CliResult;

/// Shapeforge CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Range minimum used by `extend` when `--min` is omitted
    pub default_min: i32,
    /// Range maximum used by `extend` when `--max` is omitted
    pub default_max: i32,
    /// Pretty-print written documents
    pub pretty_json: bool,
    /// env_logger filter when `--verbose` is not given
    pub log_filter: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            default_min: -100,
            default_max: 200,
            pretty_json: true,
            log_filter: String::from("info"),
        }
    }
}

impl ToolConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> CliResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
