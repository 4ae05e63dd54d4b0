//! MarketScope CLI — market intelligence collection pipeline.
//!
//! Commands:
//! - `collect` — fetch market data, derive rolling metrics, replace the
//!   SQLite snapshot, and write CSV exports
//! - `report` — generate the executive/competitive/risk/time-series report CSVs
//! - `status` — row counts and date range of the persisted store

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use marketscope_core::collect::collect_universe;
use marketscope_core::config::{AnalysisConfig, Universe};
use marketscope_core::data::{StdoutProgress, YahooProvider};
use marketscope_core::export::{write_price_snapshots, write_profile_snapshots};
use marketscope_core::report::{render_collection_report, write_report_csvs};
use marketscope_core::store::MarketStore;

#[derive(Parser)]
#[command(
    name = "marketscope",
    about = "MarketScope CLI — market intelligence collection pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect market data for the universe and persist it.
    Collect {
        /// Universe TOML file. Defaults to the built-in tech universe.
        #[arg(long)]
        universe: Option<PathBuf>,

        /// Historical data period per symbol, in days.
        #[arg(long, default_value_t = 90)]
        lookback_days: u32,

        /// SQLite database path.
        #[arg(long, default_value = "data/market_intelligence.db")]
        db: PathBuf,

        /// Directory for CSV snapshots and the collection report.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Generate report CSVs from the persisted store.
    Report {
        /// SQLite database path.
        #[arg(long, default_value = "data/market_intelligence.db")]
        db: PathBuf,

        /// Trailing window for report views, in days.
        #[arg(long, default_value_t = 90)]
        window_days: i64,

        /// Output directory for report CSVs.
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,
    },
    /// Show row counts and date range of the persisted store.
    Status {
        /// SQLite database path.
        #[arg(long, default_value = "data/market_intelligence.db")]
        db: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Collect {
            universe,
            lookback_days,
            db,
            data_dir,
        } => run_collect(universe, lookback_days, db, data_dir),
        Commands::Report {
            db,
            window_days,
            out_dir,
        } => run_report(&db, window_days, &out_dir),
        Commands::Status { db } => run_status(&db),
    }
}

fn run_collect(
    universe_path: Option<PathBuf>,
    lookback_days: u32,
    db_path: PathBuf,
    data_dir: PathBuf,
) -> Result<()> {
    let universe = match universe_path {
        Some(path) => Universe::from_file(&path).map_err(|e| anyhow::anyhow!(e))?,
        None => Universe::default_tech(),
    };

    let config = AnalysisConfig {
        universe,
        lookback_days,
        ..AnalysisConfig::default()
    };

    println!(
        "Starting data collection for {} companies...",
        config.universe.len()
    );

    let provider = YahooProvider::new();
    let outcome = collect_universe(&provider, &config, &StdoutProgress);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Each table write is independently failable; report which one failed.
    let mut store = MarketStore::open(&db_path)?;
    let price_rows = store
        .replace_observations(&outcome.rows)
        .context("persisting observations")?;
    let profile_rows = store
        .replace_profiles(&outcome.profiles)
        .context("persisting profiles")?;
    store.create_indexes()?;
    println!("\nLoaded {price_rows} price records and {profile_rows} company records");

    let run_at = chrono::Local::now().naive_local();
    let prices = write_price_snapshots(&data_dir, &outcome.rows, run_at)?;
    write_profile_snapshots(&data_dir, &outcome.profiles, run_at)?;
    println!("Saved snapshots: {}", prices.timestamped.display());

    let report = render_collection_report(
        &config,
        &outcome.summary,
        outcome.profiles.len(),
        run_at,
    );
    let report_path = data_dir.join(format!(
        "collection_report_{}.txt",
        run_at.format("%Y%m%d_%H%M%S")
    ));
    std::fs::write(&report_path, &report)?;
    println!("\n{report}");
    println!("Report saved: {}", report_path.display());

    if outcome.summary.succeeded == 0 {
        bail!("collection failed for every symbol");
    }

    Ok(())
}

fn run_report(db_path: &Path, window_days: i64, out_dir: &Path) -> Result<()> {
    if !db_path.exists() {
        bail!(
            "database not found: {} — run `marketscope collect` first",
            db_path.display()
        );
    }

    let store = MarketStore::open(db_path)?;
    let config = AnalysisConfig {
        report_window_days: window_days,
        ..AnalysisConfig::default()
    };

    let as_of = chrono::Local::now().date_naive();
    let paths = write_report_csvs(&store, &config, as_of, out_dir)?;

    println!("Report views written:");
    println!("  {}", paths.executive.display());
    println!("  {}", paths.competitive.display());
    println!("  {}", paths.risk.display());
    println!("  {}", paths.timeseries.display());

    Ok(())
}

fn run_status(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        println!("Database does not exist: {}", db_path.display());
        return Ok(());
    }

    let store = MarketStore::open(db_path)?;

    println!("Store: {}", db_path.display());
    println!("Observations:  {}", store.observation_count()?);
    println!("Profiles:      {}", store.profile_count()?);
    println!("Symbols:       {}", store.symbol_count()?);
    match store.date_range()? {
        Some((min, max)) => println!("Date range:    {min} to {max}"),
        None => println!("Date range:    (empty)"),
    }

    Ok(())
}
