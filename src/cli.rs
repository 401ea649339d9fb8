//! Command-line interface definitions.

use std::path::PathBuf;

use clap::Parser;

use crate::analysis::AnalysisKind;

/// GTDLens - Global Terrorism Database analyzer
///
/// Loads a GTD spreadsheet export and produces console statistics and
/// PNG charts: country rankings, attack success rates, seasonal
/// patterns, group profiles, decade comparisons and per-capita rates.
///
/// Examples:
///   gtdlens
///   gtdlens --data gtd.xlsx --out-dir attachments
///   gtdlens --analyses overview,rankings --skip-charts
///   gtdlens --country France --region "Western Europe"
///   gtdlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the GTD .xlsx export (overrides the configured dataset)
    #[arg(long, env = "GTDLENS_DATA", conflicts_with_all = ["mini", "full"])]
    pub data: Option<PathBuf>,

    /// Use the configured mini dataset (faster, for smoke runs)
    #[arg(long, conflicts_with = "full")]
    pub mini: bool,

    /// Use the configured full dataset
    #[arg(long)]
    pub full: bool,

    /// Comma-separated analyses to run (default: all)
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    pub analyses: Option<Vec<AnalysisKind>>,

    /// List the available analyses and exit
    #[arg(long)]
    pub list_analyses: bool,

    /// Directory for generated charts
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Country to spotlight in country-level analyses
    #[arg(long)]
    pub country: Option<String>,

    /// Region to spotlight in region-level analyses
    #[arg(long)]
    pub region: Option<String>,

    /// How many entries to show in ranking tables
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Concurrent population lookups
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Skip chart rendering, console output only
    #[arg(long)]
    pub skip_charts: bool,

    /// JSON table of country populations (skips the HTTP lookups)
    #[arg(long, value_name = "FILE")]
    pub population_file: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Generate a default .gtdlens.toml in the current directory
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all logging except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        // These exit before any analysis runs, nothing else matters.
        if self.init_config || self.list_analyses {
            return Ok(());
        }

        if let Some(ref data) = self.data {
            if !data.exists() {
                return Err(format!("Data file does not exist: {}", data.display()));
            }
        }

        if let Some(ref file) = self.population_file {
            if !file.exists() {
                return Err(format!(
                    "Population file does not exist: {}",
                    file.display()
                ));
            }
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("--concurrency must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Get the effective log level based on flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_default_args_are_valid() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_missing_data_file_is_rejected() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("/nonexistent/gtd.xlsx"));
        let err = args.validate().unwrap_err();
        assert!(err.contains("does not exist"));
    }

    #[test]
    fn test_init_config_short_circuits_validation() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("/nonexistent/gtd.xlsx"));
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_zero_top_is_rejected() {
        let mut args = make_args();
        args.top = Some(0);
        assert!(args.validate().unwrap_err().contains("--top"));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().unwrap_err().contains("--concurrency"));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_levels() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_analyses_parse_from_kebab_names() {
        let args = Args::parse_from([
            "gtdlens",
            "--analyses",
            "overview,per-capita",
            "--skip-charts",
        ]);
        assert_eq!(
            args.analyses,
            Some(vec![AnalysisKind::Overview, AnalysisKind::PerCapita])
        );
        assert!(args.skip_charts);
    }
}
