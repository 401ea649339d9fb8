//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.gtdlens.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::Args;
use crate::population;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Focus country and region.
    #[serde(default)]
    pub focus: FocusConfig,

    /// Ranking settings.
    #[serde(default)]
    pub rankings: RankingsConfig,

    /// Population lookup settings.
    #[serde(default)]
    pub population: PopulationConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory for generated charts.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of concurrent population lookups.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_out_dir() -> String {
    "attachments".to_string()
}

fn default_concurrency() -> usize {
    4
}

/// Which spreadsheet to load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path to the full GTD export.
    #[serde(default = "default_data_file")]
    pub file: String,

    /// Path to a trimmed export for quick runs.
    #[serde(default = "default_mini_file")]
    pub mini_file: String,

    /// Load the mini export instead of the full one.
    #[serde(default)]
    pub use_mini: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            file: default_data_file(),
            mini_file: default_mini_file(),
            use_mini: false,
        }
    }
}

fn default_data_file() -> String {
    "gtd.xlsx".to_string()
}

fn default_mini_file() -> String {
    "gtd-mini.xlsx".to_string()
}

/// The country and region the country-level analyses spotlight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusConfig {
    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            country: default_country(),
            region: default_region(),
        }
    }
}

fn default_country() -> String {
    "Kazakhstan".to_string()
}

fn default_region() -> String {
    "Central Asia".to_string()
}

/// Ranking table sizes and activity thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingsConfig {
    /// How many entries ranking tables show.
    #[serde(default = "default_top")]
    pub top: usize,

    /// Minimum attacks for a group to count in success-rate rankings.
    #[serde(default = "default_min_group_attacks")]
    pub min_group_attacks: u64,

    /// Minimum attacks for a group to count in geographic-spread rankings.
    #[serde(default = "default_min_spread_attacks")]
    pub min_spread_attacks: u64,
}

impl Default for RankingsConfig {
    fn default() -> Self {
        Self {
            top: default_top(),
            min_group_attacks: default_min_group_attacks(),
            min_spread_attacks: default_min_spread_attacks(),
        }
    }
}

fn default_top() -> usize {
    20
}

fn default_min_group_attacks() -> u64 {
    50
}

fn default_min_spread_attacks() -> u64 {
    100
}

/// Where country populations come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// REST endpoint queried per country.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Optional JSON table of populations that replaces the endpoint.
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout_seconds(),
            file: None,
        }
    }
}

fn default_endpoint() -> String {
    population::DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from the default location if it exists.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".gtdlens.toml");
        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge CLI arguments into this config. CLI args take precedence.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data) = args.data {
            self.dataset.file = data.display().to_string();
            self.dataset.use_mini = false;
        } else if args.mini {
            self.dataset.use_mini = true;
        } else if args.full {
            self.dataset.use_mini = false;
        }

        if let Some(ref out_dir) = args.out_dir {
            self.general.out_dir = out_dir.display().to_string();
        }

        if let Some(ref country) = args.country {
            self.focus.country = country.clone();
        }

        if let Some(ref region) = args.region {
            self.focus.region = region.clone();
        }

        if let Some(top) = args.top {
            self.rankings.top = top;
        }

        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }

        if let Some(ref file) = args.population_file {
            self.population.file = Some(file.display().to_string());
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// The spreadsheet the run should load.
    pub fn data_file(&self) -> &str {
        if self.dataset.use_mini {
            &self.dataset.mini_file
        } else {
            &self.dataset.file
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_args() -> Args {
        Args {
            data: None,
            mini: false,
            full: false,
            analyses: None,
            list_analyses: false,
            out_dir: None,
            country: None,
            region: None,
            top: None,
            concurrency: None,
            skip_charts: false,
            population_file: None,
            config: None,
            init_config: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.out_dir, "attachments");
        assert_eq!(config.general.concurrency, 4);
        assert_eq!(config.dataset.file, "gtd.xlsx");
        assert!(!config.dataset.use_mini);
        assert_eq!(config.focus.country, "Kazakhstan");
        assert_eq!(config.focus.region, "Central Asia");
        assert_eq!(config.rankings.top, 20);
        assert_eq!(config.rankings.min_group_attacks, 50);
        assert_eq!(config.population.timeout_seconds, 10);
        assert!(config.population.file.is_none());
    }

    #[test]
    fn test_parse_partial_toml_fills_defaults() {
        let toml_str = r#"
            [dataset]
            file = "exports/gtd-2021.xlsx"
            use_mini = false

            [focus]
            country = "France"

            [rankings]
            top = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.dataset.file, "exports/gtd-2021.xlsx");
        assert_eq!(config.dataset.mini_file, "gtd-mini.xlsx");
        assert_eq!(config.focus.country, "France");
        assert_eq!(config.focus.region, "Central Asia");
        assert_eq!(config.rankings.top, 10);
        assert_eq!(config.general.out_dir, "attachments");
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = Config::default();
        config.rankings.top = 10;

        let mut args = make_args();
        args.country = Some("Iraq".to_string());
        args.out_dir = Some(PathBuf::from("charts"));
        args.concurrency = Some(8);
        args.verbose = true;
        config.merge_with_args(&args);

        assert_eq!(config.focus.country, "Iraq");
        assert_eq!(config.general.out_dir, "charts");
        assert_eq!(config.general.concurrency, 8);
        assert!(config.general.verbose);
        // Args without a value leave the configured one alone.
        assert_eq!(config.rankings.top, 10);
    }

    #[test]
    fn test_data_file_selection() {
        let mut config = Config::default();
        assert_eq!(config.data_file(), "gtd.xlsx");

        let mut args = make_args();
        args.mini = true;
        config.merge_with_args(&args);
        assert_eq!(config.data_file(), "gtd-mini.xlsx");

        // An explicit data path beats the mini toggle.
        let mut args = make_args();
        args.data = Some(PathBuf::from("custom.xlsx"));
        config.merge_with_args(&args);
        assert_eq!(config.data_file(), "custom.xlsx");
    }

    #[test]
    fn test_full_flag_restores_full_dataset() {
        let mut config = Config::default();
        config.dataset.use_mini = true;

        let mut args = make_args();
        args.full = true;
        config.merge_with_args(&args);
        assert_eq!(config.data_file(), "gtd.xlsx");
    }

    #[test]
    fn test_default_toml_lists_every_section() {
        let content = Config::default_toml();
        assert!(content.contains("[general]"));
        assert!(content.contains("[dataset]"));
        assert!(content.contains("[focus]"));
        assert!(content.contains("[rankings]"));
        assert!(content.contains("[population]"));
        assert!(content.contains("Kazakhstan"));
    }
}
