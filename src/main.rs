// ===============================
// src/main.rs
// ===============================
/*
 # contoh
 contract_calc profit --leverage 10 --open 100 --close 110 --qty 2
 contract_calc --direction short liquidation --leverage 20 --open 100 --qty 1
 contract_calc position --loss 100 --stop-pct 10
 contract_calc --maker-fee 0.02 --json average --fill 1@100 --fill 1@200

 ENV (.env): DIRECTION, MAKER_FEE_PCT, TAKER_FEE_PCT, RUST_LOG
*/
/*
=============================================================================
Project : contract_calc — leveraged contract trading calculator in Rust
Module  : main.rs
Version : 0.5.0
License : MIT (see LICENSE)

Summary : Profit/loss, liquidation price, position sizing and weighted
          average entry price for leveraged contracts, parameterised by a
          shared direction + maker/taker fee configuration that notifies
          observers on change.
=============================================================================
*/
use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use contract_calc::validator::{format_number, format_percentage};
use contract_calc::{
    calculate_liquidation, calculate_position, calculate_profit, config, AveragePriceTracker, CalcError,
    Input, LiquidationInput, PositionSize, ProfitInput, SizingInput, TradingConfig,
};

/// Leveraged contract calculator: P/L, liquidation, sizing, average entry.
#[derive(Parser)]
#[command(name = "contract_calc")]
struct Cli {
    /// long | short (overrides DIRECTION)
    #[arg(long)]
    direction: Option<String>,

    /// Maker fee in percent, e.g. 0.02 (overrides MAKER_FEE_PCT)
    #[arg(long)]
    maker_fee: Option<String>,

    /// Taker fee in percent, e.g. 0.05 (overrides TAKER_FEE_PCT)
    #[arg(long)]
    taker_fee: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Net profit of a closed trade
    Profit {
        #[arg(long)]
        leverage: Option<String>,
        #[arg(long)]
        open: Option<String>,
        #[arg(long)]
        close: Option<String>,
        #[arg(long)]
        qty: Option<String>,
    },
    /// Liquidation price of an open position
    Liquidation {
        #[arg(long)]
        leverage: Option<String>,
        #[arg(long)]
        open: Option<String>,
        #[arg(long)]
        qty: Option<String>,
        #[arg(long)]
        add_margin: Option<String>,
        /// Replaces the leverage-derived initial margin when > 0
        #[arg(long)]
        initial_margin: Option<String>,
    },
    /// Position size from a loss budget
    Position {
        #[arg(long)]
        loss: Option<String>,
        #[arg(long)]
        stop_amount: Option<String>,
        #[arg(long)]
        stop_pct: Option<String>,
    },
    /// Fee-adjusted weighted average entry
    Average {
        /// QTY@PRICE, repeatable
        #[arg(long = "fill", required = true)]
        fills: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ---- Logging ----
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    // ---- Config: .env/ENV dulu, lalu override dari flag ----
    let mut cfg = config::load();
    cfg.add_listener(|change| {
        debug!(key = change.key(), ?change, "config changed");
        Ok(())
    });
    apply_overrides(&mut cfg, &cli);
    info!(
        direction = %cfg.direction(),
        maker_fee_rate = cfg.maker_fee_rate(),
        taker_fee_rate = cfg.taker_fee_rate(),
        "startup config"
    );

    match run(&mut cfg, &cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn apply_overrides(cfg: &mut TradingConfig, cli: &Cli) {
    if let Some(d) = &cli.direction {
        cfg.set_direction_str(d);
    }
    if let Some(m) = &cli.maker_fee {
        cfg.set_maker_fee_rate(m.as_str());
    }
    if let Some(t) = &cli.taker_fee {
        cfg.set_taker_fee_rate(t.as_str());
    }
}

fn run(cfg: &mut TradingConfig, cli: &Cli) -> Result<(), CalcError> {
    match &cli.command {
        Commands::Profit { leverage, open, close, qty } => {
            let r = calculate_profit(
                cfg,
                &ProfitInput::new(leverage.clone(), open.clone(), close.clone(), qty.clone()),
            )?;
            emit(cli.json, &r, || {
                vec![
                    ("direction", cfg.direction().to_string()),
                    ("profit", num(r.profit)),
                    ("profit rate", pct(r.profit_rate)),
                    ("open fee", num(r.open_fee)),
                    ("close fee", num(r.close_fee)),
                    ("total fee", num(r.total_fee)),
                ]
            });
        }
        Commands::Liquidation { leverage, open, qty, add_margin, initial_margin } => {
            let input = LiquidationInput::new(leverage.clone(), open.clone(), qty.clone(), add_margin.clone())
                .with_initial_margin(initial_margin.clone());
            let r = calculate_liquidation(cfg, &input)?;
            emit(cli.json, &r, || {
                let mut lines = vec![
                    ("direction", cfg.direction().to_string()),
                    ("liquidation price", num(r.liquidation_price)),
                    ("initial margin", num(r.initial_margin)),
                    ("total margin", num(r.total_margin)),
                ];
                if r.is_warning {
                    lines.push(("warning", "leverage outside 1-125".to_string()));
                }
                lines
            });
        }
        Commands::Position { loss, stop_amount, stop_pct } => {
            let r = calculate_position(&SizingInput::new(loss.clone(), stop_amount.clone(), stop_pct.clone()))?;
            emit(cli.json, &r, || match r {
                PositionSize::Amount { quantity } => vec![("mode", "amount".into()), ("quantity", num(quantity))],
                PositionSize::Percent { position_value } => {
                    vec![("mode", "percent".into()), ("position value", num(position_value))]
                }
            });
        }
        Commands::Average { fills } => {
            let tracker = Rc::new(RefCell::new(AveragePriceTracker::new()));
            AveragePriceTracker::attach(&tracker, cfg);
            for f in fills {
                let (qty, px) = split_fill(f);
                tracker.borrow_mut().add_position(cfg, qty, px)?;
            }
            let r = tracker.borrow().calculate_average_price()?;
            emit(cli.json, &r, || {
                vec![
                    ("fills", tracker.borrow().len().to_string()),
                    ("average price", num(r.average_price)),
                    ("total quantity", num(r.total_quantity)),
                    ("total cost", num(r.total_cost)),
                ]
            });
        }
    }
    Ok(())
}

// "2@101.5" -> ("2", "101.5"); tanpa '@' -> harga kosong (ditolak validator)
fn split_fill(s: &str) -> (Input, Input) {
    match s.split_once('@') {
        Some((q, p)) => (q.into(), p.into()),
        None => (s.into(), Input::Empty),
    }
}

fn num(v: f64) -> String {
    format_number(&Input::Number(v), 4)
}

fn pct(v: f64) -> String {
    format_percentage(&Input::Number(v), 2)
}

fn emit<T, F>(json: bool, value: &T, lines: F)
where
    T: Serialize,
    F: FnOnce() -> Vec<(&'static str, String)>,
{
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("error: serialize failed: {e}"),
        }
        return;
    }
    for (label, v) in lines() {
        println!("{label:>18}: {v}");
    }
}
