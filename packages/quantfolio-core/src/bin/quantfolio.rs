//! Quantfolio CLI - Load allocations, quantify them and rebalance.
//!
//! Every command prints a JSON envelope on stdout; logs go to stderr.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use quantfolio_core::{
    holdings_from_files, parse_date, to_quantified_portfolio, ApiResponse, Config, Holding,
    Portfolio,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "quantfolio")]
#[command(about = "Quantfolio CLI - target weights to positions, with buy/sell rebalancing")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.quantfolio/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Weights table, overrides the config
    #[arg(long, global = true)]
    weights: Option<PathBuf>,
    /// Prices table, overrides the config
    #[arg(long, global = true)]
    prices: Option<PathBuf>,
    /// Weights column to allocate by, overrides the config
    #[arg(long, global = true)]
    column: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the holding records read from the tables
    Holdings,
    /// Print the quantified holdings for an initial amount
    Quantify {
        /// Amount to invest
        #[arg(short, long)]
        amount: Option<f64>,
    },
    /// Print daily positions over a date range
    Positions {
        /// First day (defaults to the earliest day held)
        #[arg(short, long, value_parser = date_arg)]
        start: Option<NaiveDate>,
        /// Last day, inclusive (defaults to the latest day held)
        #[arg(short, long, value_parser = date_arg)]
        end: Option<NaiveDate>,
        /// Amount to invest
        #[arg(short, long)]
        amount: Option<f64>,
    },
    /// Apply one buy or sell order and print the resulting day
    Trade {
        /// Order side
        #[arg(long, value_enum)]
        side: Side,
        /// Asset id
        #[arg(long)]
        id: String,
        /// Day of the holding to trade
        #[arg(short, long, value_parser = date_arg)]
        date: NaiveDate,
        /// Monetary amount to buy or sell
        #[arg(short, long)]
        amount: f64,
        /// Amount invested before the order
        #[arg(long)]
        initial: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Buy,
    Sell,
}

fn date_arg(value: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = run(cli).inspect_err(|e| tracing::error!("Command failed: {}", e));
    let output = serde_json::to_string_pretty(&ApiResponse::from(result))
        .context("Failed to encode output")?;

    println!("{}", output);
    Ok(())
}

fn run(cli: Cli) -> quantfolio_core::Result<Value> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Holdings => {
            let holdings = load(&config)?;
            Ok(json!({ "holdings": holdings }))
        }
        Commands::Quantify { amount } => {
            let initial = amount.unwrap_or(config.initial_amount);
            let portfolio = to_quantified_portfolio(load(&config)?, initial)?;
            Ok(json!({
                "initial_amount": initial,
                "holdings": portfolio.holdings(),
            }))
        }
        Commands::Positions { start, end, amount } => {
            let portfolio =
                to_quantified_portfolio(load(&config)?, amount.unwrap_or(config.initial_amount))?;
            handle_positions(&portfolio, start, end)
        }
        Commands::Trade {
            side,
            id,
            date,
            amount,
            initial,
        } => {
            let mut portfolio =
                to_quantified_portfolio(load(&config)?, initial.unwrap_or(config.initial_amount))?;
            handle_trade(&mut portfolio, side, &id, date, amount)
        }
    }
}

fn resolve_config(cli: &Cli) -> quantfolio_core::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    if let Some(path) = &cli.weights {
        config.weights_path = path.clone();
    }
    if let Some(path) = &cli.prices {
        config.prices_path = path.clone();
    }
    if let Some(column) = &cli.column {
        config.weight_column = column.clone();
    }
    Ok(config)
}

fn load(config: &Config) -> quantfolio_core::Result<Vec<Holding>> {
    holdings_from_files(
        &config.weights_path,
        &config.prices_path,
        &config.weight_column,
    )
}

fn handle_positions(
    portfolio: &Portfolio,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> quantfolio_core::Result<Value> {
    let (Some(first), Some(last)) = (portfolio.dates().next(), portfolio.dates().last()) else {
        return Ok(json!({ "positions": {} }));
    };

    let positions = portfolio.daily_positions(start.unwrap_or(first), end.unwrap_or(last));
    Ok(json!({ "positions": positions }))
}

fn handle_trade(
    portfolio: &mut Portfolio,
    side: Side,
    id: &str,
    date: NaiveDate,
    amount: f64,
) -> quantfolio_core::Result<Value> {
    match side {
        Side::Buy => portfolio.buy(id, date, amount)?,
        Side::Sell => portfolio.sell(id, date, amount)?,
    }

    let weights: serde_json::Map<String, Value> = portfolio
        .weights(date)?
        .into_iter()
        .map(|(asset, weight)| (asset.to_string(), json!(weight)))
        .collect();

    Ok(json!({
        "action": match side {
            Side::Buy => "bought",
            Side::Sell => "sold",
        },
        "id": id,
        "date": date,
        "amount": amount,
        "total": portfolio.total(date),
        "holdings": portfolio.assets_on(date),
        "weights": weights,
    }))
}
