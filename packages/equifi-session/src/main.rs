//! equifi-session - analyze asset selections and re-check saved portfolios
//! with live market data.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use equifi_core::{DateRange, Error, Interval, PortfolioBook};
use equifi_session::{
    AnalysisOutcome, AnalysisQuery, MarketData, MarketDataClient, Session, SessionConfig,
};

#[derive(Parser)]
#[command(name = "equifi-session")]
#[command(about = "Fetch prices and compute the efficient frontier for 2-4 assets")]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config dir>/equifi/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Risk-free rate in percent instead of the treasury yield
    #[arg(long, global = true)]
    risk_free: Option<f64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an asset selection
    Analyze(AnalyzeArgs),
    /// Re-run saved portfolios against current prices
    Portfolios {
        #[command(subcommand)]
        action: PortfolioAction,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Comma-separated asset symbols
    #[arg(short, long, value_delimiter = ',', required = true)]
    symbols: Vec<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,
    /// Bar interval
    #[arg(short, long, default_value = "Daily")]
    interval: String,
    /// Seed for the Monte Carlo sampler
    #[arg(long)]
    seed: Option<u64>,
    /// Save the max-Sharpe portfolio to the portfolio book
    #[arg(long)]
    save: bool,
}

#[derive(Subcommand)]
enum PortfolioAction {
    /// Show how expected return and best outcome moved over a window of the
    /// same length ending today
    Check {
        /// Position in the portfolio book
        #[arg(short, long)]
        index: usize,
    },
    /// Store the current expected return and best outcome
    Update {
        /// Position in the portfolio book
        #[arg(short, long)]
        index: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SessionConfig::load_from(path)?,
        None => SessionConfig::load()?,
    };

    let client = MarketDataClient::new(&config)?;
    tracing::debug!(url = client.base_url(), "market data client ready");
    let mut session = Session::new(Arc::new(client), config.analysis_settings());
    if let Some(rate) = cli.risk_free {
        session = session.with_risk_free_rate(rate);
    }

    let summary = match cli.command {
        Commands::Analyze(args) => {
            if let Some(seed) = args.seed {
                session = session.with_seed(seed);
            }
            run_analyze(&session, args).await?
        }
        Commands::Portfolios { action } => run_portfolios(&session, action).await?,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

async fn run_analyze<P: MarketData>(session: &Session<P>, args: AnalyzeArgs) -> Result<Value> {
    let interval: Interval = args.interval.parse()?;
    let range = DateRange::new(args.start, args.end)?;
    let offered = Interval::options_for_range(range.days());
    if !offered.contains(&interval) {
        let names: Vec<&str> = offered.iter().map(Interval::as_str).collect();
        bail!(
            "{} bars are not offered for a {}-day range (choose {})",
            interval,
            range.days(),
            names.join(", ")
        );
    }
    let query = AnalysisQuery::new(&args.symbols, range, interval)?;
    tracing::info!(symbols = ?query.symbols(), %interval, "starting analysis");

    let analysis = match session.analyze(query).await? {
        AnalysisOutcome::Ready(analysis) => analysis,
        AnalysisOutcome::Superseded => bail!("Analysis was superseded"),
    };
    if !analysis.is_complete() {
        tracing::warn!(
            missing = ?analysis.missing_assets,
            degenerate = ?analysis.degenerate_pairs,
            "analysis is incomplete"
        );
    }

    let best = analysis.max_sharpe().ok_or_else(|| {
        if analysis.is_complete() {
            anyhow!("No portfolio with a finite Sharpe ratio")
        } else {
            anyhow!(
                "Insufficient data: no usable data for {:?}, no overlapping data for {:?}",
                analysis.missing_assets,
                analysis.degenerate_pairs
            )
        }
    })?;

    let saved = if args.save {
        let record = analysis.record_for(best, range, interval, Utc::now())?;
        let mut book = PortfolioBook::open_default()?;
        let index = book.add_portfolio(record);
        book.save()?;
        tracing::info!(index, path = %book.path().display(), "portfolio saved");
        Some(index)
    } else {
        None
    };

    Ok(json!({
        "symbols": analysis.symbols,
        "riskFreeRate": analysis.risk_free_rate,
        "statistics": analysis.statistics,
        "correlation": analysis.correlation,
        "missingAssets": analysis.missing_assets,
        "degeneratePairs": analysis.degenerate_pairs,
        "bestOutcome": analysis.best_outcome,
        "maxSharpe": best,
        "minVolatility": analysis.min_volatility(),
        "frontierPoints": analysis.frontier.len(),
        "monteCarloPoints": analysis.monte_carlo.len(),
        "savedIndex": saved,
    }))
}

async fn run_portfolios<P: MarketData>(
    session: &Session<P>,
    action: PortfolioAction,
) -> Result<Value> {
    let mut book = PortfolioBook::open_default()?;
    let today = Utc::now().date_naive();

    match action {
        PortfolioAction::Check { index } => {
            let saved = book
                .portfolios()
                .get(index)
                .ok_or(Error::PortfolioNotFound(index))?;
            let reevaluation = session.reevaluate(saved, today).await?;
            Ok(json!({
                "index": index,
                "portfolio": saved,
                "current": reevaluation,
            }))
        }
        PortfolioAction::Update { index } => {
            let saved = book
                .portfolios()
                .get(index)
                .ok_or(Error::PortfolioNotFound(index))?;
            let reevaluation = session.reevaluate(saved, today).await?;
            let updated = book.update_portfolio(index, &reevaluation, Utc::now())?.clone();
            book.save()?;
            tracing::info!(index, path = %book.path().display(), "portfolio updated");
            Ok(json!({
                "index": index,
                "portfolio": updated,
                "current": reevaluation,
            }))
        }
    }
}
