// ===============================
// src/lib.rs
// ===============================
pub mod average;
pub mod config;
pub mod domain;
pub mod error;
pub mod liquidation;
pub mod profit;
pub mod sizing;
pub mod validator;

pub use average::AveragePriceTracker;
pub use config::{ConfigChange, ListenerId, TradingConfig};
pub use domain::{
    AverageResult, ConfigSnapshot, Direction, FillRecord, LiquidationResult, PositionSize, ProfitResult,
};
pub use error::{CalcError, ErrorKind, ListenerError};
pub use liquidation::{calculate_liquidation, LiquidationInput};
pub use profit::{calculate_profit, ProfitInput};
pub use sizing::{calculate_position, SizingInput};
pub use validator::Input;
