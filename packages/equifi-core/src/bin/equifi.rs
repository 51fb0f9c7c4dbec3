//! EquiFi CLI - Command line interface for portfolio analysis.
//!
//! Every command prints a JSON `ApiResponse`.

use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use equifi_core::analysis::series_returns;
use equifi_core::{
    best_outcome, AnalysisSettings, ApiResponse, DateRange, Error, Interval, PortfolioAnalysis,
    PortfolioBook, PriceBar, Result, SavedAsset,
};

#[derive(Parser)]
#[command(name = "equifi")]
#[command(about = "EquiFi CLI - portfolio optimization and saved portfolios")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute statistics, efficient frontier and Monte Carlo portfolios
    Analyze {
        /// JSON file mapping symbol -> [{date, close}]; assets keep file order
        #[arg(short, long)]
        prices: PathBuf,
        /// Interval of the price bars (Daily averages intraday bars per day)
        #[arg(short, long, default_value = "Daily")]
        interval: String,
        /// Risk-free rate in percent
        #[arg(short, long, default_value = "0")]
        risk_free: f64,
        /// Seed for the Monte Carlo sampler
        #[arg(long)]
        seed: Option<u64>,
        /// Include every frontier and Monte Carlo point in the output
        #[arg(long)]
        full: bool,
    },
    /// Value at a percentile of a list of returns
    Outcome {
        /// Percentile in (0, 1]
        #[arg(short, long, default_value = "0.99")]
        percentile: f64,
        /// Return values
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<f64>,
    },
    /// Saved portfolio commands
    Portfolios {
        #[command(subcommand)]
        action: PortfolioAction,
    },
    /// Watchlist commands
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
}

#[derive(Subcommand)]
enum PortfolioAction {
    /// List saved portfolios
    List,
    /// Remove a saved portfolio
    Remove {
        /// Position in the list
        #[arg(short, long)]
        index: usize,
    },
}

#[derive(Subcommand)]
enum WatchlistAction {
    /// List watched assets
    List,
    /// Watch an asset
    Add {
        /// Asset symbol
        #[arg(short, long)]
        symbol: String,
        /// Interval
        #[arg(short, long, default_value = "Daily")]
        interval: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
    },
    /// Stop watching an asset
    Remove {
        /// Asset symbol
        #[arg(short, long)]
        symbol: String,
    },
}

/// Price bar as written in the input file.
#[derive(Debug, Deserialize)]
struct InputBar {
    date: String,
    close: f64,
}

/// Compact summary of an analysis.
#[derive(Serialize)]
struct AnalysisSummary<'a> {
    symbols: &'a [String],
    statistics: &'a [equifi_core::AssetStatistics],
    correlation: &'a equifi_core::CorrelationMatrix,
    missing_assets: &'a [String],
    degenerate_pairs: &'a [[String; 2]],
    best_outcome: Option<f64>,
    max_sharpe: Option<&'a equifi_core::PortfolioPoint>,
    min_volatility: Option<&'a equifi_core::PortfolioPoint>,
    frontier_points: usize,
    monte_carlo_points: usize,
}

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            prices,
            interval,
            risk_free,
            seed,
            full,
        } => handle_analyze(prices, &interval, risk_free, seed, full),
        Commands::Outcome { percentile, values } => handle_outcome(percentile, &values),
        Commands::Portfolios { action } => handle_portfolios(action),
        Commands::Watchlist { action } => handle_watchlist(action),
    };

    let failed = result.is_err();
    let output = match result {
        Ok(data) => render(&ApiResponse::ok(data)),
        Err(e) => render(&ApiResponse::<()>::err(e.to_string())),
    };
    println!("{}", output);

    if failed {
        std::process::exit(1);
    }
}

fn render<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response).unwrap_or_else(|e| {
        format!("{{\"ok\":false,\"error\":\"serialization failed: {}\"}}", e)
    })
}

fn handle_analyze(
    path: PathBuf,
    interval: &str,
    risk_free_rate: f64,
    seed: Option<u64>,
    full: bool,
) -> Result<Value> {
    let interval: Interval = interval.parse()?;
    let content = fs::read_to_string(&path)?;
    let input = read_price_file(&content)?;

    let mut symbols = Vec::with_capacity(input.len());
    let mut series = Vec::with_capacity(input.len());
    for (symbol, bars) in input {
        series.push(series_returns(&bars, interval));
        symbols.push(symbol);
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let analysis = PortfolioAnalysis::build(
        &symbols,
        &series,
        risk_free_rate,
        &AnalysisSettings::default(),
        &mut rng,
    )?;

    if full {
        return Ok(serde_json::to_value(&analysis)?);
    }

    let summary = AnalysisSummary {
        symbols: &analysis.symbols,
        statistics: &analysis.statistics,
        correlation: &analysis.correlation,
        missing_assets: &analysis.missing_assets,
        degenerate_pairs: &analysis.degenerate_pairs,
        best_outcome: analysis.best_outcome,
        max_sharpe: analysis.max_sharpe(),
        min_volatility: analysis.min_volatility(),
        frontier_points: analysis.frontier.len(),
        monte_carlo_points: analysis.monte_carlo.len(),
    };
    Ok(serde_json::to_value(&summary)?)
}

/// Symbols and bars of a price file, in file order.
fn read_price_file(content: &str) -> Result<Vec<(String, Vec<PriceBar>)>> {
    let input: Map<String, Value> = serde_json::from_str(content)?;

    input
        .into_iter()
        .map(|(symbol, raw)| -> Result<(String, Vec<PriceBar>)> {
            let symbol = symbol.trim().to_uppercase();
            let raw_bars: Vec<InputBar> = serde_json::from_value(raw)?;
            let bars = parse_bars(&symbol, &raw_bars);
            Ok((symbol, bars))
        })
        .collect()
}

/// Bars with a readable date; the rest are dropped with a warning.
fn parse_bars(symbol: &str, raw_bars: &[InputBar]) -> Vec<PriceBar> {
    let bars: Vec<PriceBar> = raw_bars
        .iter()
        .filter_map(|bar| PriceBar::parse_date(&bar.date).map(|d| PriceBar::new(d, bar.close)))
        .collect();

    let dropped = raw_bars.len() - bars.len();
    if dropped > 0 {
        tracing::warn!(symbol, dropped, "unparseable bar dates");
    }
    bars
}

fn handle_outcome(percentile: f64, values: &[f64]) -> Result<Value> {
    let value = best_outcome(percentile, values).ok_or_else(|| {
        Error::InsufficientData(format!(
            "No value at percentile {} of {} returns",
            percentile,
            values.len()
        ))
    })?;

    Ok(json!({
        "percentile": percentile,
        "value": value,
    }))
}

fn handle_portfolios(action: PortfolioAction) -> Result<Value> {
    let mut book = PortfolioBook::open_default()?;

    match action {
        PortfolioAction::List => Ok(json!({
            "portfolios": book.portfolios(),
        })),
        PortfolioAction::Remove { index } => {
            let removed = book.remove_portfolio(index)?;
            book.save()?;
            Ok(json!({
                "removed": removed,
                "remaining": book.portfolios().len(),
            }))
        }
    }
}

fn handle_watchlist(action: WatchlistAction) -> Result<Value> {
    let mut book = PortfolioBook::open_default()?;

    match action {
        WatchlistAction::List => Ok(json!({
            "savedAssets": book.saved_assets(),
        })),
        WatchlistAction::Add {
            symbol,
            interval,
            start,
            end,
        } => {
            let asset = SavedAsset::new(&symbol, interval.parse()?, DateRange::new(start, end)?);
            let added = book.add_asset(asset)?.clone();
            book.save()?;
            Ok(json!({
                "added": added,
                "savedAt": Utc::now(),
            }))
        }
        WatchlistAction::Remove { symbol } => {
            let removed = book.remove_asset(&symbol)?;
            book.save()?;
            Ok(json!({
                "removed": removed,
            }))
        }
    }
}
