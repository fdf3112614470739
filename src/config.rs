// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : contract_calc — leveraged contract trading calculator in Rust
Module  : config.rs
Version : 0.5.0
License : MIT (see LICENSE)

Summary : Profit/loss, liquidation price, position sizing and weighted
          average entry price for leveraged contracts, parameterised by a
          shared direction + maker/taker fee configuration that notifies
          observers on change.
=============================================================================
*/
use std::env;
use std::panic::{catch_unwind, AssertUnwindSafe};

use dotenvy::dotenv;
use tracing::{debug, error, warn};

use crate::domain::{ConfigSnapshot, Direction};
use crate::error::ListenerError;
use crate::validator::Input;

pub const DEFAULT_MAKER_FEE_RATE: f64 = 0.0002;
pub const DEFAULT_TAKER_FEE_RATE: f64 = 0.0005;
/// Above 1% a fee rate is almost certainly a typo.
pub const FEE_RATE_WARN_THRESHOLD: f64 = 0.01;

impl Direction {
    pub fn from_env(key: &str, default_dir: Direction) -> Direction {
        match env::var(key) {
            Ok(v) => Direction::parse(&v).unwrap_or_else(|| {
                warn!(key, value = %v, "unknown direction, using default");
                default_dir
            }),
            Err(_) => default_dir,
        }
    }
}

/// What changed, delivered to every listener after a successful set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigChange {
    Direction(Direction),
    MakerFeeRate(f64),
    TakerFeeRate(f64),
    Reset(ConfigSnapshot),
}

impl ConfigChange {
    pub fn key(&self) -> &'static str {
        match self {
            ConfigChange::Direction(_) => "direction",
            ConfigChange::MakerFeeRate(_) => "maker_fee_rate",
            ConfigChange::TakerFeeRate(_) => "taker_fee_rate",
            ConfigChange::Reset(_) => "reset",
        }
    }
}

pub type ListenerFn = Box<dyn FnMut(&ConfigChange) -> Result<(), ListenerError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    callback: ListenerFn,
}

/// Direction and fee rates shared by every engine. Rates are stored as
/// fractions (0.0002 = 0.02%) and are never negative.
pub struct TradingConfig {
    direction: Direction,
    maker_fee_rate: f64,
    taker_fee_rate: f64,
    listeners: Vec<Listener>,
    next_listener_id: u64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Long,
            maker_fee_rate: DEFAULT_MAKER_FEE_RATE,
            taker_fee_rate: DEFAULT_TAKER_FEE_RATE,
            listeners: Vec::new(),
            next_listener_id: 1,
        }
    }
}

impl std::fmt::Debug for TradingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradingConfig")
            .field("direction", &self.direction)
            .field("maker_fee_rate", &self.maker_fee_rate)
            .field("taker_fee_rate", &self.taker_fee_rate)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TradingConfig {
    pub fn new() -> Self { Self::default() }

    pub fn direction(&self) -> Direction { self.direction }
    pub fn is_long(&self) -> bool { self.direction == Direction::Long }
    pub fn is_short(&self) -> bool { self.direction == Direction::Short }

    /// Typed input is always accepted; only `set_direction_str` can reject.
    pub fn set_direction(&mut self, d: Direction) {
        self.direction = d;
        debug!(direction = %d, "config: direction set");
        self.notify(ConfigChange::Direction(d));
    }

    /// Loosely-typed variant for text input. Unknown values are logged and ignored.
    pub fn set_direction_str(&mut self, s: &str) -> bool {
        match Direction::parse(s) {
            Some(d) => {
                self.set_direction(d);
                true
            }
            None => {
                warn!(value = %s, "config: invalid direction rejected");
                false
            }
        }
    }

    pub fn maker_fee_rate(&self) -> f64 { self.maker_fee_rate }
    pub fn taker_fee_rate(&self) -> f64 { self.taker_fee_rate }
    pub fn total_fee_rate(&self) -> f64 { self.maker_fee_rate + self.taker_fee_rate }

    /// `percent` is a percentage (0.02 means 0.02%), stored as a fraction.
    pub fn set_maker_fee_rate(&mut self, percent: impl Into<Input>) -> bool {
        match parse_fee_percent(&percent.into(), "maker") {
            Some(rate) => {
                self.maker_fee_rate = rate;
                debug!(rate, "config: maker fee rate set");
                self.notify(ConfigChange::MakerFeeRate(rate));
                true
            }
            None => false,
        }
    }

    pub fn set_taker_fee_rate(&mut self, percent: impl Into<Input>) -> bool {
        match parse_fee_percent(&percent.into(), "taker") {
            Some(rate) => {
                self.taker_fee_rate = rate;
                debug!(rate, "config: taker fee rate set");
                self.notify(ConfigChange::TakerFeeRate(rate));
                true
            }
            None => false,
        }
    }

    /// Takes a fraction, not a percentage.
    pub fn is_fee_rate_too_high(rate: f64) -> bool {
        rate > FEE_RATE_WARN_THRESHOLD
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            direction: self.direction,
            maker_fee_rate: self.maker_fee_rate,
            taker_fee_rate: self.taker_fee_rate,
        }
    }

    /// Restores the defaults; listeners are kept and receive one `Reset`.
    pub fn reset(&mut self) {
        self.direction = Direction::Long;
        self.maker_fee_rate = DEFAULT_MAKER_FEE_RATE;
        self.taker_fee_rate = DEFAULT_TAKER_FEE_RATE;
        debug!("config: reset to defaults");
        self.notify(ConfigChange::Reset(self.snapshot()));
    }

    pub fn add_listener<F>(&mut self, f: F) -> ListenerId
    where
        F: FnMut(&ConfigChange) -> Result<(), ListenerError> + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push(Listener { id, callback: Box::new(f) });
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize { self.listeners.len() }

    // Registration order; a failing listener never stops the rest.
    fn notify(&mut self, change: ConfigChange) {
        for l in self.listeners.iter_mut() {
            let outcome = catch_unwind(AssertUnwindSafe(|| (l.callback)(&change)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(listener = l.id.0, key = change.key(), %e, "config listener failed"),
                Err(_) => error!(listener = l.id.0, key = change.key(), "config listener panicked"),
            }
        }
    }
}

fn parse_fee_percent(v: &Input, which: &str) -> Option<f64> {
    match v.parse() {
        Some(p) if p >= 0.0 => {
            let rate = p / 100.0;
            if TradingConfig::is_fee_rate_too_high(rate) {
                warn!(which, rate, "config: fee rate above 1%");
            }
            Some(rate)
        }
        _ => {
            warn!(which, value = ?v, "config: invalid fee rate rejected");
            None
        }
    }
}

/// Builds the startup config from `.env` + environment.
///
/// ENV:
///   DIRECTION=long|short
///   MAKER_FEE_PCT=0.02   (percent)
///   TAKER_FEE_PCT=0.05   (percent)
pub fn load() -> TradingConfig {
    // Pastikan .env dibaca
    let _ = dotenv();

    let mut cfg = TradingConfig::default();
    cfg.direction = Direction::from_env("DIRECTION", Direction::Long);

    // Nilai invalid di-log dan diabaikan oleh setter (default tetap berlaku)
    if let Ok(v) = env::var("MAKER_FEE_PCT") {
        cfg.set_maker_fee_rate(v);
    }
    if let Ok(v) = env::var("TAKER_FEE_PCT") {
        cfg.set_taker_fee_rate(v);
    }
    cfg
}
