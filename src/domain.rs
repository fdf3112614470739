// ===============================
// src/domain.rs
// ===============================
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction { #[default] Long, Short }
impl Direction {
    /// +1 when the position gains on a price rise.
    pub fn sign(&self) -> f64 { match self { Direction::Long => 1.0, Direction::Short => -1.0 } }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "buy" | "l" => Some(Direction::Long),
            "short" | "sell" | "s" => Some(Direction::Short),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self { Direction::Long => "long", Direction::Short => "short" }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot { pub direction: Direction, pub maker_fee_rate: f64, pub taker_fee_rate: f64 }

// Hasil kalkulasi (transient, tidak disimpan)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfitResult {
    pub profit: f64,
    pub profit_rate: f64,
    pub gross_profit: f64,
    pub total_fee: f64,
    pub open_fee: f64,
    pub close_fee: f64,
}
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiquidationResult { pub liquidation_price: f64, pub initial_margin: f64, pub total_margin: f64, pub is_warning: bool }
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "calculation_type", rename_all = "snake_case")]
pub enum PositionSize {
    Amount { quantity: f64 },
    Percent { position_value: f64 },
}
impl PositionSize {
    pub fn calculation_type(&self) -> &'static str {
        match self { PositionSize::Amount { .. } => "amount", PositionSize::Percent { .. } => "percent" }
    }
}
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageResult { pub average_price: f64, pub total_quantity: f64, pub total_cost: f64 }

/// One entry into the position. Fee fields are a snapshot of the maker rate
/// at creation and are only ever replaced all together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillRecord {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub quantity: f64,
    pub price: f64,
    pub fee: f64,
    pub actual_cost: f64,
    pub total_cost: f64,
}
