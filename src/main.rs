//! GTDLens - Global Terrorism Database analyzer
//!
//! A CLI tool that loads a GTD spreadsheet export and produces console
//! statistics and PNG charts: rankings, success rates, seasonal
//! patterns, group profiles, decade comparisons and per-capita rates.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing data file, bad config, render failure)

mod analysis;
mod charts;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod population;
mod report;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use analysis::{AnalysisContext, AnalysisKind};
use cli::Args;
use config::Config;
use dataset::Dataset;
use population::PopulationClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config and --list-analyses early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }
    if args.list_analyses {
        return handle_list_analyses();
    }

    // Initialize logging
    init_logging(&args);

    info!("GTDLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the analyses
    match run_analyses(args).await {
        Ok(()) => {
            std::process::exit(0);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Create a default config file in the current directory.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".gtdlens.toml");

    if path.exists() {
        eprintln!("⚠️  .gtdlens.toml already exists. Remove it first to regenerate.");
        std::process::exit(1);
    }

    std::fs::write(path, Config::default_toml()).context("Failed to write .gtdlens.toml")?;

    println!("✅ Created .gtdlens.toml with default settings.");
    println!("   Edit it to set dataset paths, the focus country and ranking sizes.");
    Ok(())
}

/// Print the analysis registry.
fn handle_list_analyses() -> Result<()> {
    println!("Available analyses:");
    for kind in AnalysisKind::ALL {
        println!("  {:<14} {}", kind.name(), kind.summary());
    }
    Ok(())
}

/// Initialize the tracing subscriber based on CLI flags.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration, trying CLI-specified path first, then default locations.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded config from .gtdlens.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config file: {}. Using defaults.", e);
            Ok(Config::default())
        }
    }
}

/// Main analysis workflow.
async fn run_analyses(args: Args) -> Result<()> {
    let start_time = Instant::now();
    println!(
        "GTDLens v{} - run started {}",
        env!("CARGO_PKG_VERSION"),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    // Load and merge configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    debug!("Effective config: {:?}", config);

    // Step 1: Load the dataset
    let data_file = PathBuf::from(config.data_file());
    println!("📥 Loading dataset: {}", data_file.display());
    let dataset = Dataset::load(&data_file)
        .with_context(|| format!("Failed to load dataset: {}", data_file.display()))?;
    let (rows, columns) = dataset.shape();
    println!("Successfully loaded {}", data_file.display());
    println!("   Incidents: {}, columns: {}", rows, columns);

    // Step 2: Prepare the output directory and population source
    if !args.skip_charts {
        std::fs::create_dir_all(&config.general.out_dir).with_context(|| {
            format!("Failed to create output directory: {}", config.general.out_dir)
        })?;
    }
    let populations = build_population_client(&config)?;

    let ctx = AnalysisContext {
        dataset: &dataset,
        out_dir: PathBuf::from(&config.general.out_dir),
        focus_country: config.focus.country.clone(),
        focus_region: config.focus.region.clone(),
        top: config.rankings.top,
        min_group_attacks: config.rankings.min_group_attacks,
        min_spread_attacks: config.rankings.min_spread_attacks,
        concurrency: config.general.concurrency,
        skip_charts: args.skip_charts,
    };

    // Step 3: Run the selected analyses in order
    let selected = AnalysisKind::selection(args.analyses.as_deref());
    println!("\n🔬 Running {} analyses...", selected.len());

    for kind in &selected {
        info!("Running {} analysis", kind.name());
        analysis::run(*kind, &ctx, &populations)
            .await
            .with_context(|| format!("{} analysis failed", kind.name()))?;
    }

    // Step 4: Summarize the run
    let duration = start_time.elapsed();
    println!("\n📊 Run Summary:");
    println!("   Analyses completed: {}", selected.len());
    println!("   Incidents analyzed: {}", rows);
    println!("   Duration: {:.1}s", duration.as_secs_f64());

    if args.skip_charts {
        println!("\n✅ Analysis complete! Chart rendering was skipped.");
    } else {
        println!(
            "\n✅ Analysis complete! Charts saved to: {}",
            config.general.out_dir
        );
    }

    Ok(())
}

fn build_population_client(config: &Config) -> Result<PopulationClient> {
    let table_file = config.population.file.as_deref().map(Path::new);
    PopulationClient::new(
        &config.population.endpoint,
        Duration::from_secs(config.population.timeout_seconds),
        table_file,
    )
}
