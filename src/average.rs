// ===============================
// src/average.rs (weighted average entry tracker)
// ===============================
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::config::{ConfigChange, ListenerId, TradingConfig};
use crate::domain::{AverageResult, FillRecord};
use crate::error::{CalcError, Result};
use crate::validator::{require_positive, Input};

/// Ordered fills making up one position. Each fill is priced with the maker
/// rate in force when it was added, until the rate changes and all are re-priced.
#[derive(Debug)]
pub struct AveragePriceTracker {
    records: Vec<FillRecord>,
    next_id: u64,
    // rate change that arrived while the tracker was borrowed elsewhere
    pending_rate: Rc<Cell<Option<f64>>>,
}

impl AveragePriceTracker {
    pub fn new() -> Self {
        Self { records: Vec::new(), next_id: 1, pending_rate: Rc::new(Cell::new(None)) }
    }

    pub fn add_position(
        &mut self,
        cfg: &TradingConfig,
        quantity: impl Into<Input>,
        price: impl Into<Input>,
    ) -> Result<FillRecord> {
        self.apply_pending();
        let quantity = require_positive("quantity", &quantity.into())?;
        let price = require_positive("price", &price.into())?;

        let id = self.next_id;
        self.next_id += 1;
        let record = price_fill(id, quantity, price, cfg.maker_fee_rate())?;
        debug!(id, quantity, price, fee = record.fee, "fill added");
        self.records.push(record.clone());
        Ok(record)
    }

    /// Unknown ids are ignored.
    pub fn remove_position(&mut self, id: u64) {
        self.apply_pending();
        self.records.retain(|r| r.id != id);
    }

    pub fn clear_positions(&mut self) {
        self.pending_rate.set(None);
        self.records.clear();
    }

    pub fn get_all_positions(&self) -> Vec<FillRecord> {
        self.settled().into_owned()
    }

    pub fn len(&self) -> usize { self.settled().len() }
    pub fn is_empty(&self) -> bool { self.settled().is_empty() }

    pub fn calculate_average_price(&self) -> Result<AverageResult> {
        let records = self.settled();
        if records.is_empty() {
            return Err(CalcError::EmptyState);
        }
        let total_quantity: f64 = records.iter().map(|r| r.quantity).sum();
        let total_cost: f64 = records.iter().map(|r| r.total_cost).sum();
        let average_price = if total_quantity > 0.0 { total_cost / total_quantity } else { 0.0 };
        Ok(AverageResult { average_price, total_quantity, total_cost })
    }

    /// Rebuilds every fill from its (quantity, price) under `maker_fee_rate`.
    /// Ids and creation times are kept; a fill that no longer prices cleanly is dropped.
    pub fn reprice(&mut self, maker_fee_rate: f64) {
        self.pending_rate.set(None);
        self.records = repriced(&self.records, maker_fee_rate);
        debug!(maker_fee_rate, fills = self.records.len(), "fills repriced");
    }

    pub fn on_config_change(&mut self, change: &ConfigChange) {
        if let Some(rate) = maker_rate_of(change) {
            self.reprice(rate);
        }
    }

    /// Subscribes a shared tracker to maker fee changes. The config only holds a
    /// weak handle, so dropping the tracker turns the listener into a no-op.
    /// A change that arrives while the tracker is borrowed is parked and applied
    /// on the next access.
    pub fn attach(tracker: &Rc<RefCell<Self>>, cfg: &mut TradingConfig) -> ListenerId {
        let weak = Rc::downgrade(tracker);
        let pending = tracker.borrow().pending_rate.clone();
        cfg.add_listener(move |change| {
            let Some(rate) = maker_rate_of(change) else { return Ok(()) };
            let Some(tracker) = weak.upgrade() else { return Ok(()) };
            match tracker.try_borrow_mut() {
                Ok(mut t) => t.reprice(rate),
                Err(_) => {
                    warn!(rate, "average tracker busy, reprice deferred");
                    pending.set(Some(rate));
                }
            }
            Ok(())
        })
    }

    fn apply_pending(&mut self) {
        if let Some(rate) = self.pending_rate.get() {
            self.reprice(rate);
        }
    }

    // Read path: shows fills as if a deferred reprice had already run.
    fn settled(&self) -> Cow<'_, [FillRecord]> {
        match self.pending_rate.get() {
            Some(rate) => Cow::Owned(repriced(&self.records, rate)),
            None => Cow::Borrowed(self.records.as_slice()),
        }
    }
}

impl Default for AveragePriceTracker {
    fn default() -> Self { Self::new() }
}

fn maker_rate_of(change: &ConfigChange) -> Option<f64> {
    match change {
        ConfigChange::MakerFeeRate(rate) => Some(*rate),
        ConfigChange::Reset(snap) => Some(snap.maker_fee_rate),
        _ => None,
    }
}

fn repriced(records: &[FillRecord], maker_fee_rate: f64) -> Vec<FillRecord> {
    let mut out = Vec::with_capacity(records.len());
    for r in records {
        let fresh = require_positive("quantity", &Input::Number(r.quantity))
            .and_then(|_| require_positive("price", &Input::Number(r.price)))
            .and_then(|_| price_fill(r.id, r.quantity, r.price, maker_fee_rate));
        match fresh {
            Ok(mut fresh) => {
                fresh.created_at = r.created_at;
                out.push(fresh);
            }
            Err(e) => error!(id = r.id, %e, "fill dropped during fee recompute"),
        }
    }
    out
}

fn price_fill(id: u64, quantity: f64, price: f64, maker_fee_rate: f64) -> Result<FillRecord> {
    let fee = price * maker_fee_rate;
    let actual_cost = price + fee;
    let total_cost = quantity * actual_cost;
    if !total_cost.is_finite() {
        return Err(CalcError::DegenerateResult);
    }
    Ok(FillRecord { id, created_at: Utc::now(), quantity, price, fee, actual_cost, total_cost })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_fee() -> TradingConfig {
        let mut cfg = TradingConfig::new();
        cfg.set_maker_fee_rate(0);
        cfg
    }

    #[test]
    fn simple_average() {
        let cfg = zero_fee();
        let mut t = AveragePriceTracker::new();
        t.add_position(&cfg, 1, 100).unwrap();
        t.add_position(&cfg, "1", "200").unwrap();
        let r = t.calculate_average_price().unwrap();
        assert_eq!(r.average_price, 150.0);
        assert_eq!(r.total_quantity, 2.0);
        assert_eq!(r.total_cost, 300.0);
    }

    #[test]
    fn fee_snapshot_at_creation() {
        let cfg = TradingConfig::new();
        let mut t = AveragePriceTracker::new();
        let rec = t.add_position(&cfg, 2, 100).unwrap();
        assert!((rec.fee - 0.02).abs() < 1e-12);
        assert!((rec.actual_cost - 100.02).abs() < 1e-12);
        assert!((rec.total_cost - 200.04).abs() < 1e-12);
    }

    #[test]
    fn ids_are_unique_and_remove_is_lenient() {
        let cfg = zero_fee();
        let mut t = AveragePriceTracker::new();
        let a = t.add_position(&cfg, 1, 10).unwrap();
        let b = t.add_position(&cfg, 1, 20).unwrap();
        assert_ne!(a.id, b.id);
        t.remove_position(a.id);
        t.remove_position(999);
        let left = t.get_all_positions();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, b.id);
    }

    #[test]
    fn empty_tracker_has_no_average() {
        let cfg = zero_fee();
        let mut t = AveragePriceTracker::new();
        assert_eq!(t.calculate_average_price(), Err(CalcError::EmptyState));
        t.add_position(&cfg, 1, 10).unwrap();
        t.clear_positions();
        assert!(t.is_empty());
        assert_eq!(t.calculate_average_price().unwrap_err().to_string(), "no records");
    }

    #[test]
    fn rejects_invalid_fill() {
        let cfg = zero_fee();
        let mut t = AveragePriceTracker::new();
        assert!(t.add_position(&cfg, 0, 10).is_err());
        assert!(t.add_position(&cfg, 1, "abc").is_err());
        assert!(t.add_position(&cfg, 1, 1e16).is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn attached_tracker_reprices_on_maker_change() {
        let mut cfg = zero_fee();
        let tracker = Rc::new(RefCell::new(AveragePriceTracker::new()));
        AveragePriceTracker::attach(&tracker, &mut cfg);

        let first = tracker.borrow_mut().add_position(&cfg, 2, 100).unwrap();
        tracker.borrow_mut().add_position(&cfg, 1, 50).unwrap();
        assert_eq!(tracker.borrow().calculate_average_price().unwrap().total_cost, 250.0);

        cfg.set_maker_fee_rate(1); // 1% -> 0.01
        let fills = tracker.borrow().get_all_positions();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].id, first.id);
        assert_eq!(fills[0].created_at, first.created_at);
        assert_eq!((fills[0].quantity, fills[0].price), (2.0, 100.0));
        assert!((fills[0].fee - 1.0).abs() < 1e-12);
        assert!((fills[0].total_cost - 202.0).abs() < 1e-12);
        assert!((fills[1].total_cost - 50.5).abs() < 1e-12);

        // taker changes leave fills alone
        cfg.set_taker_fee_rate(5);
        assert!((tracker.borrow().get_all_positions()[0].fee - 1.0).abs() < 1e-12);

        cfg.reset();
        assert!((tracker.borrow().get_all_positions()[0].fee - 0.02).abs() < 1e-12);
    }

    #[test]
    fn dropped_tracker_listener_is_harmless() {
        let mut cfg = TradingConfig::new();
        let tracker = Rc::new(RefCell::new(AveragePriceTracker::new()));
        AveragePriceTracker::attach(&tracker, &mut cfg);
        drop(tracker);
        assert!(cfg.set_maker_fee_rate(0.05));
    }

    #[test]
    fn change_while_borrowed_is_applied_later() {
        let mut cfg = zero_fee();
        let tracker = Rc::new(RefCell::new(AveragePriceTracker::new()));
        AveragePriceTracker::attach(&tracker, &mut cfg);
        let rec = tracker.borrow_mut().add_position(&cfg, 1, 100).unwrap();

        {
            let _reader = tracker.borrow();
            cfg.set_maker_fee_rate(1);
        }

        let t = tracker.borrow();
        let fills = t.get_all_positions();
        assert_eq!(fills[0].id, rec.id);
        assert!((fills[0].fee - 1.0).abs() < 1e-12);
        assert!((t.calculate_average_price().unwrap().total_cost - 101.0).abs() < 1e-12);
        drop(t);

        // next mutation commits the parked rate
        tracker.borrow_mut().add_position(&cfg, 1, 200).unwrap();
        let fills = tracker.borrow().get_all_positions();
        assert!((fills[0].fee - 1.0).abs() < 1e-12);
        assert!((fills[1].fee - 2.0).abs() < 1e-12);
    }

    #[test]
    fn unpriceable_fill_is_dropped_others_kept() {
        let mut cfg = zero_fee();
        let tracker = Rc::new(RefCell::new(AveragePriceTracker::new()));
        AveragePriceTracker::attach(&tracker, &mut cfg);
        tracker.borrow_mut().add_position(&cfg, 1e15, 1e15).unwrap();
        let healthy = tracker.borrow_mut().add_position(&cfg, 1, 100).unwrap();

        // 1e300 percent -> 1e298 fraction; the big fill overflows to infinity
        assert!(cfg.set_maker_fee_rate(1e300));

        let fills = tracker.borrow().get_all_positions();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].id, healthy.id);
        assert_eq!((fills[0].quantity, fills[0].price), (1.0, 100.0));
        assert!((fills[0].fee / 1e300 - 1.0).abs() < 1e-9);
    }
}
