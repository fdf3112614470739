// ===============================
// src/sizing.rs
// ===============================
//
// Ukuran posisi dari budget rugi + jarak stop-loss.
// Dua mode, saling eksklusif (prioritas: amount dulu, lalu percent):
//   amount  -> quantity       = planned_loss / stop_loss_amount
//   percent -> position_value = planned_loss / (stop_loss_percent / 100)
//
use tracing::debug;

use crate::domain::PositionSize;
use crate::error::{CalcError, Result};
use crate::validator::{check_positive, is_valid_number, require_positive, Input};

#[derive(Debug, Clone, Default)]
pub struct SizingInput {
    pub planned_loss: Input,
    pub stop_loss_amount: Input,
    pub stop_loss_percent: Input,
}

impl SizingInput {
    pub fn new(
        planned_loss: impl Into<Input>,
        stop_loss_amount: impl Into<Input>,
        stop_loss_percent: impl Into<Input>,
    ) -> Self {
        Self {
            planned_loss: planned_loss.into(),
            stop_loss_amount: stop_loss_amount.into(),
            stop_loss_percent: stop_loss_percent.into(),
        }
    }
}

pub fn calculate_position(input: &SizingInput) -> Result<PositionSize> {
    let planned_loss = require_positive("planned loss", &input.planned_loss)?;

    let size = if is_valid_number(&input.stop_loss_amount) {
        let amount = check_positive("stop-loss amount", &input.stop_loss_amount)?;
        PositionSize::Amount { quantity: planned_loss / amount }
    } else if is_valid_number(&input.stop_loss_percent) {
        let percent = check_positive("stop-loss percentage", &input.stop_loss_percent)?;
        if percent > 100.0 {
            return Err(CalcError::OutOfRange { field: "stop-loss percentage".into(), min: 0.0, max: 100.0 });
        }
        PositionSize::Percent { position_value: planned_loss / (percent / 100.0) }
    } else {
        return Err(CalcError::MissingStopLoss);
    };

    debug!(mode = size.calculation_type(), ?size, "position sized");
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none() -> Option<f64> { None }

    #[test]
    fn percent_mode() {
        let r = calculate_position(&SizingInput::new(100, none(), 10)).unwrap();
        assert_eq!(r.calculation_type(), "percent");
        match r {
            PositionSize::Percent { position_value } => assert!((position_value - 1000.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn amount_mode_wins_when_both_given() {
        let r = calculate_position(&SizingInput::new("100", "4", "10")).unwrap();
        assert_eq!(r, PositionSize::Amount { quantity: 25.0 });
    }

    #[test]
    fn junk_amount_falls_through_to_percent() {
        let r = calculate_position(&SizingInput::new(100, "n/a", 50)).unwrap();
        assert_eq!(r, PositionSize::Percent { position_value: 200.0 });
    }

    #[test]
    fn zero_amount_is_rejected() {
        let err = calculate_position(&SizingInput::new(100, 0, none())).unwrap_err();
        assert_eq!(err.to_string(), "stop-loss amount must be greater than 0");
    }

    #[test]
    fn needs_one_stop_loss() {
        let err = calculate_position(&SizingInput::new(100, none(), "")).unwrap_err();
        assert_eq!(err, CalcError::MissingStopLoss);
        assert_eq!(err.to_string(), "enter stop-loss amount or percentage");
    }

    #[test]
    fn percent_capped_at_hundred() {
        assert!(calculate_position(&SizingInput::new(100, none(), 100)).is_ok());
        let err = calculate_position(&SizingInput::new(100, none(), 100.5)).unwrap_err();
        assert!(matches!(err, CalcError::OutOfRange { .. }));
    }

    #[test]
    fn planned_loss_required() {
        let err = calculate_position(&SizingInput::new(none(), 1, none())).unwrap_err();
        assert_eq!(err.to_string(), "enter planned loss");
        let err = calculate_position(&SizingInput::new(1e16, 1, none())).unwrap_err();
        assert!(matches!(err, CalcError::ExtremeValue { .. }));
    }
}
