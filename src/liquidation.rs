// ===============================
// src/liquidation.rs
// ===============================
use tracing::{debug, warn};

use crate::config::TradingConfig;
use crate::domain::LiquidationResult;
use crate::error::{CalcError, Result};
use crate::validator::{optional_non_negative, require_positive, Input};

/// Leverage outside this band is allowed but flagged.
pub const MIN_LEVERAGE: f64 = 1.0;
pub const MAX_LEVERAGE: f64 = 125.0;

#[derive(Debug, Clone, Default)]
pub struct LiquidationInput {
    pub leverage: Input,
    pub open_price: Input,
    pub quantity: Input,
    pub add_margin: Input,
    /// When > 0 this replaces the leverage-derived initial margin.
    pub custom_initial_margin: Input,
}

impl LiquidationInput {
    pub fn new(
        leverage: impl Into<Input>,
        open_price: impl Into<Input>,
        quantity: impl Into<Input>,
        add_margin: impl Into<Input>,
    ) -> Self {
        Self {
            leverage: leverage.into(),
            open_price: open_price.into(),
            quantity: quantity.into(),
            add_margin: add_margin.into(),
            custom_initial_margin: Input::Empty,
        }
    }

    pub fn with_initial_margin(mut self, margin: impl Into<Input>) -> Self {
        self.custom_initial_margin = margin.into();
        self
    }
}

/// Price at which the margin is fully consumed by an adverse move.
pub fn calculate_liquidation(cfg: &TradingConfig, input: &LiquidationInput) -> Result<LiquidationResult> {
    let open_price = require_positive("open price", &input.open_price)?;
    let quantity = require_positive("quantity", &input.quantity)?;

    let custom_margin = optional_non_negative("initial margin", &input.custom_initial_margin)?
        .filter(|m| *m > 0.0);

    let mut is_warning = false;
    let initial_margin = match custom_margin {
        Some(m) => m,
        None => {
            let leverage = require_positive("leverage", &input.leverage)?;
            if !(MIN_LEVERAGE..=MAX_LEVERAGE).contains(&leverage) {
                warn!(leverage, "leverage outside 1-125");
                is_warning = true;
            }
            (quantity * open_price) / leverage
        }
    };

    // add margin kosong dianggap 0
    let add_margin = optional_non_negative("additional margin", &input.add_margin)?.unwrap_or(0.0);
    let total_margin = initial_margin + add_margin;

    let liquidation_price = open_price - cfg.direction().sign() * total_margin / quantity;
    if !liquidation_price.is_finite() || liquidation_price <= 0.0 {
        return Err(CalcError::DegenerateResult);
    }

    debug!(direction = %cfg.direction(), liquidation_price, total_margin, "liquidation calculated");
    Ok(LiquidationResult { liquidation_price, initial_margin, total_margin, is_warning })
}
