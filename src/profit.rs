// ===============================
// src/profit.rs
// ===============================
use tracing::debug;

use crate::config::TradingConfig;
use crate::domain::ProfitResult;
use crate::error::Result;
use crate::validator::{check_positive, validate_required_fields, Input};

/// Raw form values for one round-trip trade.
#[derive(Debug, Clone, Default)]
pub struct ProfitInput {
    pub leverage: Input,
    pub open_price: Input,
    pub close_price: Input,
    pub quantity: Input,
}

impl ProfitInput {
    pub fn new(
        leverage: impl Into<Input>,
        open_price: impl Into<Input>,
        close_price: impl Into<Input>,
        quantity: impl Into<Input>,
    ) -> Self {
        Self {
            leverage: leverage.into(),
            open_price: open_price.into(),
            close_price: close_price.into(),
            quantity: quantity.into(),
        }
    }
}

/// Net P/L of opening at `open_price` and closing at `close_price`.
///
/// The open leg pays the maker rate and the close leg the taker rate, both read
/// from `cfg` at call time. Leverage is validated but does not enter the formula:
/// P/L is price delta times quantity, not return on margin.
pub fn calculate_profit(cfg: &TradingConfig, input: &ProfitInput) -> Result<ProfitResult> {
    let fields = [
        ("leverage", &input.leverage),
        ("open price", &input.open_price),
        ("close price", &input.close_price),
        ("quantity", &input.quantity),
    ];
    validate_required_fields(&fields)?;

    let _leverage = check_positive("leverage", &input.leverage)?;
    let open_price = check_positive("open price", &input.open_price)?;
    let close_price = check_positive("close price", &input.close_price)?;
    let quantity = check_positive("quantity", &input.quantity)?;

    let gross_profit = if cfg.is_long() {
        quantity * (close_price - open_price)
    } else {
        quantity * (open_price - close_price)
    };

    let open_fee = quantity * open_price * cfg.maker_fee_rate();
    let close_fee = quantity * close_price * cfg.taker_fee_rate();
    let profit = gross_profit - open_fee - close_fee;

    let cost = quantity * open_price;
    let profit_rate = if cost > 0.0 { profit / cost } else { 0.0 };

    debug!(direction = %cfg.direction(), profit, profit_rate, "profit calculated");
    Ok(ProfitResult {
        profit,
        profit_rate,
        gross_profit,
        total_fee: open_fee + close_fee,
        open_fee,
        close_fee,
    })
}
