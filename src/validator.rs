// ===============================
// src/validator.rs
// ===============================
//
// Normalisasi input longgar (teks form / angka / kosong) menjadi f64 yang ketat.
// Semua predikat di sini total: tidak pernah panic, hanya mengembalikan bool/Result.
//
use crate::error::{CalcError, Result};

/// Magnitude above which a value is treated as garbage input.
pub const EXTREME_LIMIT: f64 = 1e15;

/// Formatters clamp the requested precision to this.
pub const MAX_DECIMALS: usize = 100;

/// Shown by the formatters when the value cannot be rendered.
pub const PLACEHOLDER: &str = "--";

/// A loosely-typed scalar as it arrives from a form field or the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Input {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl Input {
    /// Strict parse: `None` for empty, non-numeric, NaN or infinite input.
    pub fn parse(&self) -> Option<f64> {
        let v = match self {
            Input::Empty => return None,
            Input::Number(n) => *n,
            Input::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                s.parse::<f64>().ok()?
            }
        };
        v.is_finite().then_some(v)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Input::Empty => true,
            Input::Text(s) => s.trim().is_empty(),
            Input::Number(_) => false,
        }
    }
}

impl From<&str> for Input {
    fn from(s: &str) -> Self { Input::Text(s.to_string()) }
}
impl From<String> for Input {
    fn from(s: String) -> Self { Input::Text(s) }
}
impl From<f64> for Input {
    fn from(v: f64) -> Self { Input::Number(v) }
}
impl From<i32> for Input {
    fn from(v: i32) -> Self { Input::Number(v as f64) }
}
impl From<u32> for Input {
    fn from(v: u32) -> Self { Input::Number(v as f64) }
}
impl<T: Into<Input>> From<Option<T>> for Input {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Input::Empty)
    }
}

pub fn is_valid_number(v: &Input) -> bool {
    v.parse().is_some()
}

pub fn is_positive(v: &Input) -> bool {
    matches!(v.parse(), Some(x) if x > 0.0)
}

pub fn is_non_negative(v: &Input) -> bool {
    matches!(v.parse(), Some(x) if x >= 0.0)
}

pub fn is_extreme_value(v: &Input) -> bool {
    matches!(v.parse(), Some(x) if x.abs() > EXTREME_LIMIT)
}

/// Inclusive on both ends.
pub fn is_in_range(v: &Input, min: f64, max: f64) -> bool {
    matches!(v.parse(), Some(x) if x >= min && x <= max)
}

/// Walks the fields in order; the first empty or non-numeric one decides the error.
pub fn validate_required_fields(fields: &[(&str, &Input)]) -> Result<()> {
    for (name, value) in fields {
        if value.is_empty() {
            return Err(CalcError::Missing { field: name.to_string() });
        }
        if !is_valid_number(value) {
            return Err(CalcError::NotANumber { field: name.to_string() });
        }
    }
    Ok(())
}

pub fn format_number(v: &Input, decimals: usize) -> String {
    match v.parse() {
        Some(x) => format!("{:.*}", decimals.min(MAX_DECIMALS), x),
        None => PLACEHOLDER.to_string(),
    }
}

/// `v` is a fraction: 0.5 renders as "50.00%" with two decimals.
pub fn format_percentage(v: &Input, decimals: usize) -> String {
    match v.parse() {
        Some(x) => format!("{:.*}%", decimals.min(MAX_DECIMALS), x * 100.0),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn safe_parse_float(v: &Input, default: f64) -> f64 {
    v.parse().unwrap_or(default)
}

// ---- helpers shared by the engines ----

/// Present, numeric, > 0 and within the sanity bound.
pub(crate) fn require_positive(field: &str, v: &Input) -> Result<f64> {
    validate_required_fields(&[(field, v)])?;
    check_positive(field, v)
}

/// For an input already known to be numeric.
pub(crate) fn check_positive(field: &str, v: &Input) -> Result<f64> {
    if !is_positive(v) {
        return Err(CalcError::NotPositive { field: field.to_string() });
    }
    check_extreme(field, v)
}

/// Empty counts as `None`; anything else must be numeric, >= 0 and within bounds.
pub(crate) fn optional_non_negative(field: &str, v: &Input) -> Result<Option<f64>> {
    if v.is_empty() {
        return Ok(None);
    }
    if !is_valid_number(v) {
        return Err(CalcError::NotANumber { field: field.to_string() });
    }
    if !is_non_negative(v) {
        return Err(CalcError::Negative { field: field.to_string() });
    }
    check_extreme(field, v).map(Some)
}

fn check_extreme(field: &str, v: &Input) -> Result<f64> {
    if is_extreme_value(v) {
        return Err(CalcError::ExtremeValue { field: field.to_string() });
    }
    v.parse().ok_or_else(|| CalcError::NotANumber { field: field.to_string() })
}
