//! Forex Risk Calculator
//!
//! Position sizing, margin, drawdown and pip math for retail forex and
//! gold trades, priced with cached live exchange rates.

mod api;
mod calculator;
mod db;
mod error;
mod models;
mod provider;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::api::RatesClient;
use crate::calculator::{
    parse_price, AssetType, CalculatorConfig, Direction, PipCalculator, RiskCalculator,
};
use crate::db::{Database, RATES_CACHE_KEY};
use crate::error::InvalidInputError;
use crate::models::{
    CalculationInputs, CalculationMode, CalculationResult, Currency, GoldPipUnit, Leverage,
    PairCatalog, RiskSpec,
};
use crate::provider::{RateProvider, RatesState};

/// Forex risk and pip calculator CLI.
#[derive(Parser)]
#[command(name = "fxrisk")]
#[command(about = "Position-size, margin and pip calculator for forex and gold", long_about = None)]
struct Cli {
    /// Rate cache database path
    #[arg(short, long, env = "FXRISK_DATABASE", default_value = "sqlite:./fxrisk.db?mode=rwc")]
    database: String,

    /// Exchange-rate API endpoint (USD base)
    #[arg(long, env = "FXRISK_RATES_URL")]
    rates_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Size a position from account risk, or a stop-loss from a lot size
    Risk {
        /// Account balance
        #[arg(short, long)]
        balance: Decimal,

        /// Currency pair (e.g., EUR/USD, XAUUSD)
        #[arg(short, long, default_value = "EUR/USD")]
        pair: String,

        /// Stop-loss distance in pips (solve for lots)
        #[arg(short, long)]
        stop_loss: Option<Decimal>,

        /// Lot size (solve for stop-loss)
        #[arg(long, conflicts_with = "stop_loss")]
        lots: Option<Decimal>,

        /// Spread in pips, added to the stop when solving for lots
        #[arg(long, default_value = "0")]
        spread: Decimal,

        /// Risk per trade as a percentage of balance (default 1)
        #[arg(short, long)]
        risk: Option<Decimal>,

        /// Risk per trade as an absolute amount in account currency
        #[arg(long, conflicts_with = "risk")]
        risk_amount: Option<Decimal>,

        /// Leverage (e.g., 1:500)
        #[arg(long)]
        leverage: Option<Leverage>,

        /// Account currency (USD, EUR, GBP, JPY, INR)
        #[arg(short, long, default_value = "USD")]
        currency: Currency,

        /// Gold pip definition (0.01, 0.10, 1.00)
        #[arg(long)]
        gold_pip: Option<GoldPipUnit>,

        /// Profit target in pips, for risk/reward
        #[arg(short, long)]
        target: Option<Decimal>,

        /// Do not fetch live rates
        #[arg(long)]
        offline: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pips and profit/loss between two prices
    Pip {
        /// Entry price
        #[arg(long)]
        open: Option<String>,

        /// Exit price
        #[arg(long)]
        close: Option<String>,

        /// Asset type (standard, jpy, gold)
        #[arg(short, long, conflicts_with = "pair")]
        asset: Option<AssetType>,

        /// Derive the asset type from a catalog pair
        #[arg(short, long)]
        pair: Option<String>,

        /// Trade direction (buy, sell)
        #[arg(short, long, default_value = "buy")]
        direction: Direction,

        /// Lot size
        #[arg(short, long, default_value = "1.0")]
        lots: Decimal,

        /// Spread in pips
        #[arg(short, long, default_value = "0")]
        spread: Decimal,
    },

    /// Value of one pip for a position
    PipValue {
        /// Currency pair
        #[arg(short, long, default_value = "EUR/USD")]
        pair: String,

        /// Lot size
        #[arg(short, long, default_value = "1.0")]
        lots: Decimal,

        /// Pip move to value
        #[arg(long, default_value = "10")]
        pips: Decimal,

        /// Current price (defaults to the catalog reference price)
        #[arg(long)]
        price: Option<String>,

        /// Gold pip definition (0.01, 0.10, 1.00)
        #[arg(long)]
        gold_pip: Option<GoldPipUnit>,
    },

    /// List supported pairs
    Pairs,

    /// Show the exchange rates the calculator will use
    Rates {
        /// Fetch live rates even if the cache is fresh
        #[arg(long)]
        refresh: bool,

        /// Delete the cached snapshot
        #[arg(long, conflicts_with = "refresh")]
        clear: bool,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = CalculatorConfig::default();
    if let Some(url) = &cli.rates_url {
        config.rates_url = url.clone();
    }

    match cli.command {
        Commands::Risk {
            balance,
            pair,
            stop_loss,
            lots,
            spread,
            risk,
            risk_amount,
            leverage,
            currency,
            gold_pip,
            target,
            offline,
            json,
        } => {
            let mode = if lots.is_some() && stop_loss.is_none() {
                CalculationMode::SolveForStopLoss
            } else {
                CalculationMode::SolveForLots
            };

            let risk = match risk_amount {
                Some(amount) => RiskSpec::amount(amount),
                None => RiskSpec::percentage(risk.unwrap_or(dec!(1))),
            };

            let inputs = CalculationInputs {
                mode,
                account_balance: balance,
                account_currency: currency,
                pair_symbol: pair,
                stop_loss_pips: stop_loss,
                spread_pips: spread,
                lot_size: lots,
                risk,
                leverage: leverage.unwrap_or(config.default_leverage),
                gold_pip_unit: gold_pip,
                target_profit_pips: target,
            };

            let provider = build_provider(&cli.database, &config, offline).await?;
            let state = provider.get_rates().await;

            info!(pair = %inputs.pair_symbol, mode = ?inputs.mode, "Running risk calculation");
            let result = RiskCalculator::new(config.clone()).compute_risk(&inputs, &state.rates)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_risk_result(&inputs, &result, &state);
            }
        }

        Commands::Pip {
            open,
            close,
            asset,
            pair,
            direction,
            lots,
            spread,
        } => {
            let asset = match (asset, pair) {
                (Some(asset), _) => asset,
                (None, Some(symbol)) => AssetType::for_pair(PairCatalog::lookup(&symbol)?),
                (None, None) => AssetType::Standard,
            };

            let result = PipCalculator::compute_pip_distance(
                parse_price(open.as_deref()),
                parse_price(close.as_deref()),
                asset,
                direction,
                lots,
                spread,
            );

            match result {
                Some(r) => {
                    println!("\n=== Pip Distance ({} {:?}) ===", direction, asset);
                    println!("Pips:          {}", r.pips);
                    println!("Profit/Loss:   ${:.2}", r.profit_loss);
                }
                None => println!(
                    "Enter numeric open and close prices within range to calculate pips."
                ),
            }
        }

        Commands::PipValue {
            pair,
            lots,
            pips,
            price,
            gold_pip,
        } => {
            let definition = PairCatalog::lookup(&pair)?;
            let quote = PipCalculator::quote_pip_value(
                definition,
                lots,
                pips,
                parse_price(price.as_deref()),
                gold_pip.unwrap_or(config.quote_gold_pip_unit),
            )
            .ok_or(InvalidInputError::OutOfRange)?;

            println!("\n=== {} @ {} lots ===", definition.symbol, lots);
            println!("Value per pip:   ${:.2}", quote.pip_value);
            println!("Value of {} pips: ${:.2}", pips, quote.total);
        }

        Commands::Pairs => {
            println!(
                "\n{:<10} {:<6} {:>8} {:>10} {:>12}",
                "PAIR", "CLASS", "MIN SL", "PIP SIZE", "REF PRICE"
            );
            println!("{}", "-".repeat(50));

            for pair in PairCatalog::all() {
                println!(
                    "{:<10} {:<6} {:>8} {:>10} {:>12}",
                    pair.symbol,
                    pair.class.as_str(),
                    pair.min_stop_loss_pips,
                    pair.class.pip_size(),
                    pair.reference_price
                );
            }
        }

        Commands::Rates { refresh, clear } => {
            if clear {
                let db = Database::new(&cli.database).await?;
                db.clear(RATES_CACHE_KEY).await?;
                println!("Rate cache cleared.");
                return Ok(());
            }

            let provider = build_provider(&cli.database, &config, false).await?;
            let state = if refresh {
                provider.refresh().await
            } else {
                provider.get_rates().await
            };

            print_rates(&state);
        }

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Wire the cache and the live client together. An unusable cache only
/// costs caching, never the calculation.
async fn build_provider(
    database_url: &str,
    config: &CalculatorConfig,
    offline: bool,
) -> Result<RateProvider> {
    let db = match Database::new(database_url).await {
        Ok(db) => Some(db),
        Err(e) => {
            warn!(error = %e, "Rate cache unavailable");
            None
        }
    };

    if offline {
        return Ok(RateProvider::offline(db, config));
    }

    let client = RatesClient::new(config.rates_url.clone(), config.http_timeout())
        .context("Failed to create rates client")?;

    Ok(match db {
        Some(db) => RateProvider::new(db, client, config),
        None => RateProvider::uncached(client, config),
    })
}

fn print_risk_result(inputs: &CalculationInputs, r: &CalculationResult, state: &RatesState) {
    let ccy = inputs.account_currency;

    println!("\n=== {} | {} {} ===", inputs.pair_symbol, inputs.account_balance, ccy);

    if let Some(stop) = r.recommended_stop_loss_pips {
        println!("\n--- Recommended Stop-Loss ---");
        println!("Stop-Loss:      {} pips", stop);
    }

    println!("\n--- Position Size ---");
    println!("Lots:           {}", r.position_size.lots);
    println!("Units:          {}", r.position_size.units);
    println!("Mini Lots:      {}", r.position_size.mini_lots);
    println!("Micro Lots:     {}", r.position_size.micro_lots);

    println!("\n--- Risk ---");
    println!("Risk Amount:    {:.2} {}", r.risk_amount.account, ccy);
    println!("Risk (USD):     ${:.2}", r.risk_amount.usd);
    println!("Risk (INR):     ₹{:.2}", r.risk_amount.inr);
    println!("Risk %:         {}%", r.risk_percent);
    println!("Risk Tier:      {}", r.risk_tier.as_str());
    println!("Pip Value:      {:.2} {} per lot", r.pip_value, ccy);

    println!("\n--- Margin ({}) ---", inputs.leverage);
    println!("Required:       {:.2} {}", r.margin.required, ccy);
    println!("Of Balance:     {}% ({:?})", r.margin.percent, r.margin.status);

    if let Some(rr) = &r.risk_reward {
        println!("\n--- Risk/Reward ---");
        println!("Ratio:          1:{}", rr.ratio);
        println!("Potential:      {:.2} {}", rr.potential_profit, ccy);
        println!("Min Win Rate:   {}%", rr.min_win_rate);
        println!("Quality:        {:?}", rr.quality);
    }

    println!("\n--- Drawdown Scenarios ---");
    println!(
        "{:>8} {:>14} {:>14} {:>8} {:>8}",
        "LOSSES", "LOSS", "REMAINING", "DD%", "STATUS"
    );
    for s in &r.drawdown_scenarios {
        println!(
            "{:>8} {:>14.2} {:>14.2} {:>7}% {:>8}",
            s.consecutive_losses,
            s.loss_amount,
            s.remaining_balance,
            s.drawdown_percent,
            format!("{:?}", s.status)
        );
    }

    if !r.warnings.is_empty() {
        println!("\n--- Warnings ---");
        for w in &r.warnings {
            println!("[{:?}] {}: {}", w.severity, w.title, w.message);
        }
    }

    let age = state.rates.age(Utc::now()).num_minutes();
    println!(
        "\nRates: {}{} (captured {} min ago)",
        state.source.describe(),
        if state.is_offline { ", offline/approximate" } else { "" },
        age
    );
    for used in &r.meta.rates_used {
        println!("  {}", used);
    }
}

fn print_rates(state: &RatesState) {
    let rates = &state.rates;

    println!("\n=== Exchange Rates (per 1 USD) ===");
    for currency in [Currency::Usd, Currency::Eur, Currency::Gbp, Currency::Jpy, Currency::Inr] {
        println!("{:<6} {:>12}", currency, rates.rate(currency));
    }
    println!("\nSource:    {}", state.source.describe());
    println!("Captured:  {}", rates.captured_at.to_rfc3339());
    println!("Offline:   {}", if state.is_offline { "Yes" } else { "No" });
}
