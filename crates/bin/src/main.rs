//! lisbon CLI binary.
//!
//! Computes point-in-time factors from a directory of raw parquet tables,
//! lists the registry, and inspects the factor cache.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use lisbon_core::types::CompanyId;
use lisbon_data::local::LocalSource;
use lisbon_data::source::EntityScope;
use lisbon_data::store::{FactorStore, NoopStore, ParquetStore};
use lisbon_factors::registry::{FactorCategory, factor_names, factors_by_category};
use lisbon_factors::{EngineConfig, FactorEngine, all_factors};
use serde_json::json;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "lisbon")]
#[command(about = "Point-in-time equity factor library", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the factor registry
    List {
        /// Filter by category (value, profitability, investment, accruals, liquidity)
        #[arg(long)]
        category: Option<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compute factors from a raw data directory
    Compute {
        /// Directory with the raw parquet tables
        #[arg(long)]
        data_dir: PathBuf,

        /// Comma-separated factor names; all factors when omitted
        #[arg(long)]
        factors: Option<String>,

        /// Comma-separated company keys to restrict the run to.
        /// Scoped runs never read or write the cache.
        #[arg(long)]
        companies: Option<String>,

        /// Factor cache directory (defaults to the user cache dir)
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Disable the factor cache entirely
        #[arg(long)]
        no_cache: bool,

        /// Earliest fiscal year to fetch
        #[arg(long, default_value = "2000")]
        start_year: i32,
    },

    /// List cached factor artifacts
    Cache {
        /// Factor cache directory (defaults to the user cache dir)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List { category, json } => list_factors(category.as_deref(), json),
        Commands::Compute {
            data_dir,
            factors,
            companies,
            cache_dir,
            no_cache,
            start_year,
        } => compute(data_dir, factors, companies, cache_dir, no_cache, start_year),
        Commands::Cache { cache_dir } => list_cache(cache_dir),
    }
}

/// Default cache directory, under the platform cache location.
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lisbon")
}

fn parse_category(name: &str) -> Option<FactorCategory> {
    match name.to_lowercase().as_str() {
        "value" => Some(FactorCategory::Value),
        "profitability" => Some(FactorCategory::Profitability),
        "investment" => Some(FactorCategory::Investment),
        "accruals" => Some(FactorCategory::Accruals),
        "liquidity" => Some(FactorCategory::Liquidity),
        _ => None,
    }
}

fn list_factors(category: Option<&str>, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let defs = match category {
        Some(name) => {
            let category =
                parse_category(name).ok_or_else(|| format!("unknown category: {name}"))?;
            factors_by_category(category)
        }
        None => all_factors(),
    };

    if as_json {
        let entries: Vec<_> = defs
            .iter()
            .map(|def| {
                json!({
                    "name": def.name,
                    "category": def.category,
                    "description": def.description,
                    "needs_market_caps": def.needs_market_caps,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("{} factors", defs.len());
        for def in defs {
            let category = format!("{:?}", def.category);
            println!("  {:<8} {:<14} {}", def.name, category, def.description);
        }
    }
    Ok(())
}

fn compute(
    data_dir: PathBuf,
    factors: Option<String>,
    companies: Option<String>,
    cache_dir: Option<PathBuf>,
    no_cache: bool,
    start_year: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = LocalSource::new(&data_dir);

    let store: Box<dyn FactorStore> = if no_cache {
        Box::new(NoopStore::new())
    } else {
        Box::new(ParquetStore::new(
            cache_dir.unwrap_or_else(default_cache_dir),
        )?)
    };

    let scope = match companies {
        Some(list) => EntityScope::Companies(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(CompanyId::new)
                .collect(),
        ),
        None => EntityScope::All,
    };

    let names: Vec<String> = match factors {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => factor_names().iter().map(|s| (*s).to_string()).collect(),
    };

    let config = EngineConfig {
        scope,
        start_year,
        market_start: NaiveDate::from_ymd_opt(start_year, 1, 1)
            .ok_or("invalid start year")?,
    };

    println!("Building market-cap and link context...");
    let engine = FactorEngine::new(&source, &source, &*store, config)?;
    println!(
        "  {} market-cap rows in scope",
        engine.market_caps().height()
    );

    let progress = ProgressBar::new(names.len() as u64);
    progress.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);

    let mut failures = Vec::new();
    for name in &names {
        progress.set_message(name.clone());
        match engine.compute(name) {
            Ok(outcome) => {
                let origin = if outcome.is_cached() { "cached" } else { "fresh" };
                progress.println(format!(
                    "  {name}: {} rows ({origin})",
                    outcome.table().height()
                ));
            }
            Err(e) => {
                progress.println(format!("  {name}: FAILED: {e}"));
                failures.push(name.clone());
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("done");

    if failures.is_empty() {
        println!("All {} factors computed.", names.len());
    } else {
        println!(
            "{} of {} factors failed: {}",
            failures.len(),
            names.len(),
            failures.join(", ")
        );
    }
    Ok(())
}

fn list_cache(cache_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let dir = cache_dir.unwrap_or_else(default_cache_dir);
    let store = ParquetStore::new(&dir)?;
    let names = store.list()?;
    if names.is_empty() {
        println!("No cached factors under {}", dir.display());
    } else {
        println!("{} cached factors under {}", names.len(), dir.display());
        for name in names {
            println!("  {name}");
        }
    }
    Ok(())
}
