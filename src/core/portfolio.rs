use super::transaction::ValidationError;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// The unsold remainder of a single purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lot {
    pub asset: String,
    pub acquired_at: NaiveDateTime,
    pub quantity: Decimal,
    /// Cost basis of the remaining `quantity` only
    pub basis: Decimal,
}

impl Lot {
    pub fn new(
        asset: impl Into<String>,
        acquired_at: NaiveDateTime,
        quantity: Decimal,
        basis: Decimal,
    ) -> Self {
        Lot {
            asset: asset.into(),
            acquired_at,
            quantity,
            basis,
        }
    }

    /// Basis per unit, `None` for an empty lot or when the ratio overflows
    pub fn unit_cost(&self) -> Option<Decimal> {
        self.basis.checked_div(self.quantity)
    }
}

/// Open lots per asset, each queue in acquisition order (oldest first)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Portfolio {
    lots: BTreeMap<String, VecDeque<Lot>>,
    /// Latest transaction datetime matched per asset, across batches
    last_seen: BTreeMap<String, NaiveDateTime>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transaction for `asset` at `datetime`, rejecting one older
    /// than the latest already matched for that asset
    pub fn observe(
        &mut self,
        asset: &str,
        datetime: NaiveDateTime,
    ) -> Result<(), ValidationError> {
        match self.last_seen.get_mut(asset) {
            Some(previous) if datetime < *previous => Err(ValidationError::OutOfOrder {
                asset: asset.to_string(),
                datetime,
                previous: *previous,
            }),
            Some(previous) => {
                *previous = datetime;
                Ok(())
            }
            None => {
                self.last_seen.insert(asset.to_string(), datetime);
                Ok(())
            }
        }
    }

    /// Append a newly acquired lot to the end of its asset's queue
    pub fn add(&mut self, lot: Lot) {
        log::debug!(
            "Lot {} OPEN: qty={}, basis={}, acquired={}",
            lot.asset,
            lot.quantity,
            lot.basis,
            lot.acquired_at
        );
        self.lots_mut(&lot.asset).push_back(lot);
    }

    /// Lookup-or-insert the queue for `asset`
    pub fn lots_mut(&mut self, asset: &str) -> &mut VecDeque<Lot> {
        self.lots.entry(asset.to_string()).or_default()
    }

    /// Open lots for `asset`, oldest first
    pub fn lots(&self, asset: &str) -> impl Iterator<Item = &Lot> {
        self.lots.get(asset).into_iter().flatten()
    }

    /// All open lots, grouped by asset symbol in symbol order
    pub fn iter(&self) -> impl Iterator<Item = &Lot> {
        self.lots.values().flatten()
    }

    pub fn quantity(&self, asset: &str) -> Decimal {
        self.lots(asset).map(|lot| lot.quantity).sum()
    }

    pub fn basis(&self, asset: &str) -> Decimal {
        self.lots(asset).map(|lot| lot.basis).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.values().all(VecDeque::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::parse_datetime;
    use rust_decimal_macros::dec;

    fn lot(date: &str, asset: &str, qty: Decimal, basis: Decimal) -> Lot {
        Lot::new(asset, parse_datetime(date).unwrap(), qty, basis)
    }

    #[test]
    fn lots_kept_in_acquisition_order() {
        let mut portfolio = Portfolio::new();
        portfolio.add(lot("2020-01-01", "BTC", dec!(1), dec!(100)));
        portfolio.add(lot("2020-02-01", "BTC", dec!(2), dec!(500)));

        let dates: Vec<_> = portfolio
            .lots("BTC")
            .map(|l| l.acquired_at.date().to_string())
            .collect();
        assert_eq!(dates, vec!["2020-01-01", "2020-02-01"]);
        assert_eq!(portfolio.quantity("BTC"), dec!(3));
        assert_eq!(portfolio.basis("BTC"), dec!(600));
    }

    #[test]
    fn assets_are_isolated() {
        let mut portfolio = Portfolio::new();
        portfolio.add(lot("2020-01-01", "ETH", dec!(10), dec!(1000)));
        portfolio.add(lot("2020-01-01", "BTC", dec!(1), dec!(100)));

        assert_eq!(portfolio.quantity("ETH"), dec!(10));
        assert_eq!(portfolio.quantity("BTC"), dec!(1));
        assert_eq!(portfolio.quantity("DOT"), Decimal::ZERO);
        let assets: Vec<_> = portfolio.iter().map(|l| l.asset.as_str()).collect();
        assert_eq!(assets, vec!["BTC", "ETH"]);
    }

    #[test]
    fn lots_mut_inserts_empty_queue() {
        let mut portfolio = Portfolio::new();
        assert!(portfolio.lots_mut("BTC").is_empty());
        assert!(portfolio.is_empty());
        assert_eq!(portfolio.iter().count(), 0);
    }

    #[test]
    fn observe_rejects_older_transaction_per_asset() {
        let mut portfolio = Portfolio::new();
        let at = |s: &str| parse_datetime(s).unwrap();
        portfolio.observe("BTC", at("2020-02-01")).unwrap();
        portfolio.observe("BTC", at("2020-02-01")).unwrap();
        portfolio.observe("ETH", at("2020-01-01")).unwrap();
        assert_eq!(
            portfolio.observe("BTC", at("2020-01-15")),
            Err(ValidationError::OutOfOrder {
                asset: "BTC".to_string(),
                datetime: at("2020-01-15"),
                previous: at("2020-02-01"),
            })
        );
    }

    #[test]
    fn unit_cost() {
        assert_eq!(
            lot("2020-01-01", "BTC", dec!(4), dec!(100)).unit_cost(),
            Some(dec!(25))
        );
        assert_eq!(lot("2020-01-01", "BTC", dec!(0), dec!(0)).unit_cost(), None);
    }

    #[test]
    fn unit_cost_overflow_is_none() {
        let dust = lot(
            "2020-01-01",
            "BTC",
            dec!(0.0000000000000000000000000001),
            dec!(10000000000),
        );
        assert_eq!(dust.unit_cost(), None);
    }
}
