use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Column names the loader maps onto [`crate::data::model::Record`] fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSchema {
    #[serde(default = "DatasetSchema::default_identity")]
    pub identity_column: String,
    #[serde(default = "DatasetSchema::default_primary")]
    pub primary_column: String,
    #[serde(default = "DatasetSchema::default_secondary")]
    pub secondary_column: String,
    #[serde(default = "DatasetSchema::default_ordinal")]
    pub ordinal_column: String,
    /// Numeric dimensions, in display order. Empty means "every numeric column".
    #[serde(default = "DatasetSchema::default_dimensions")]
    pub dimensions: Vec<String>,
    #[serde(default = "DatasetSchema::default_none_sentinel")]
    pub none_sentinel: String,
}

impl DatasetSchema {
    fn default_identity() -> String {
        "name".to_string()
    }
    fn default_primary() -> String {
        "type1".to_string()
    }
    fn default_secondary() -> String {
        "type2".to_string()
    }
    fn default_ordinal() -> String {
        "generation".to_string()
    }
    fn default_dimensions() -> Vec<String> {
        ["hp", "attack", "defense", "sp_attack", "sp_defense", "speed"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }
    fn default_none_sentinel() -> String {
        "None".to_string()
    }
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            identity_column: Self::default_identity(),
            primary_column: Self::default_primary(),
            secondary_column: Self::default_secondary(),
            ordinal_column: Self::default_ordinal(),
            dimensions: Self::default_dimensions(),
            none_sentinel: Self::default_none_sentinel(),
        }
    }
}

/// Viewer settings, read from `rusty-strata.json` when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub schema: DatasetSchema,
    /// Epanechnikov kernel bandwidth, in units of the density dimension.
    #[serde(default = "ViewerConfig::default_bandwidth")]
    pub bandwidth: f64,
    /// Number of evaluation points across the dimension's global extent.
    #[serde(default = "ViewerConfig::default_grid_steps")]
    pub grid_steps: usize,
    #[serde(default = "ViewerConfig::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Dimension animated in the density view. Falls back to the first dimension.
    #[serde(default)]
    pub density_dimension: Option<String>,
    /// Directory holding `<sanitized-name>.png` images.
    #[serde(default)]
    pub media_dir: Option<PathBuf>,
    /// How long an image lookup may take before the placeholder is shown.
    #[serde(default = "ViewerConfig::default_media_timeout_ms")]
    pub media_timeout_ms: u64,
}

impl ViewerConfig {
    fn default_bandwidth() -> f64 {
        7.0
    }
    fn default_grid_steps() -> usize {
        40
    }
    fn default_tick_interval_ms() -> u64 {
        1000
    }
    fn default_media_timeout_ms() -> u64 {
        5000
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Like [`ViewerConfig::load`] but never fails: a missing file is silent,
    /// an unreadable one is logged, and defaults are used in both cases.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Falling back to default config: {e:#}");
                Self::default()
            }
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            schema: DatasetSchema::default(),
            bandwidth: Self::default_bandwidth(),
            grid_steps: Self::default_grid_steps(),
            tick_interval_ms: Self::default_tick_interval_ms(),
            density_dimension: None,
            media_dir: None,
            media_timeout_ms: Self::default_media_timeout_ms(),
        }
    }
}
