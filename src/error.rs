// ===============================
// src/error.rs
// ===============================
use thiserror::Error;

/// Broad classes of failure, used by callers that only care about the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    ExtremeValue,
    DegenerateResult,
    EmptyState,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("enter {field}")]
    Missing { field: String },
    #[error("{field} must be a valid number")]
    NotANumber { field: String },
    #[error("{field} must be greater than 0")]
    NotPositive { field: String },
    #[error("{field} cannot be negative")]
    Negative { field: String },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },
    #[error("{field} is too large")]
    ExtremeValue { field: String },
    #[error("enter stop-loss amount or percentage")]
    MissingStopLoss,
    #[error("invalid result, check inputs")]
    DegenerateResult,
    #[error("no records")]
    EmptyState,
}

impl CalcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::Missing { .. }
            | CalcError::NotANumber { .. }
            | CalcError::NotPositive { .. }
            | CalcError::Negative { .. }
            | CalcError::OutOfRange { .. }
            | CalcError::MissingStopLoss => ErrorKind::Validation,
            CalcError::ExtremeValue { .. } => ErrorKind::ExtremeValue,
            CalcError::DegenerateResult => ErrorKind::DegenerateResult,
            CalcError::EmptyState => ErrorKind::EmptyState,
        }
    }

    /// Name of the offending field, when the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            CalcError::Missing { field }
            | CalcError::NotANumber { field }
            | CalcError::NotPositive { field }
            | CalcError::Negative { field }
            | CalcError::OutOfRange { field, .. }
            | CalcError::ExtremeValue { field } => Some(field),
            _ => None,
        }
    }
}

/// Failure reported by a config listener. Logged by the notifier, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

pub type Result<T> = std::result::Result<T, CalcError>;
