use super::events::TaxableEvent;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;

/// Holding periods of at least this many calendar days are long-term
pub const LONG_TERM_DAYS: i64 = 365;

/// Holding-period classification of a gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Term {
    ShortTerm,
    LongTerm,
}

impl Term {
    pub fn from_holding_days(days: i64) -> Term {
        if days >= LONG_TERM_DAYS {
            Term::LongTerm
        } else {
            Term::ShortTerm
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Term::ShortTerm => "Short-term",
            Term::LongTerm => "Long-term",
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Flat tax rates applied to net gains per holding term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rates {
    pub long_term: Decimal,
    pub short_term: Decimal,
}

impl Rates {
    pub fn new(long_term: Decimal, short_term: Decimal) -> Self {
        Rates {
            long_term,
            short_term,
        }
    }

    pub fn rate(&self, term: Term) -> Decimal {
        match term {
            Term::LongTerm => self.long_term,
            Term::ShortTerm => self.short_term,
        }
    }
}

impl Default for Rates {
    fn default() -> Self {
        Rates {
            long_term: dec!(0.15),
            short_term: dec!(0.37),
        }
    }
}

/// Running totals for one holding term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TermTotals {
    pub events: usize,
    pub proceeds: Decimal,
    pub basis: Decimal,
}

impl TermTotals {
    fn add(&mut self, event: &TaxableEvent) {
        self.events += 1;
        self.proceeds += event.proceeds;
        self.basis += event.basis;
    }

    /// Net gain, negative for a net loss
    pub fn gain(&self) -> Decimal {
        self.proceeds - self.basis
    }
}

/// Flat-rate tax approximation over a set of taxable events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxEstimate {
    pub rates: Rates,
    pub long_term: TermTotals,
    pub short_term: TermTotals,
}

impl TaxEstimate {
    pub fn long_term_gain(&self) -> Decimal {
        self.long_term.gain()
    }

    pub fn short_term_gain(&self) -> Decimal {
        self.short_term.gain()
    }

    /// Net gains are not floored at zero, so a net loss in one term offsets
    /// tax on the other.
    pub fn tax_owed(&self) -> Decimal {
        self.long_term_gain() * self.rates.long_term
            + self.short_term_gain() * self.rates.short_term
    }

    pub fn total_gain(&self) -> Decimal {
        self.long_term_gain() + self.short_term_gain()
    }

    pub fn event_count(&self) -> usize {
        self.long_term.events + self.short_term.events
    }
}

/// Bucket events by holding term and apply the flat rates
pub fn estimate<'a, I>(events: I, rates: Rates) -> TaxEstimate
where
    I: IntoIterator<Item = &'a TaxableEvent>,
{
    let mut long_term = TermTotals::default();
    let mut short_term = TermTotals::default();
    for event in events {
        match event.term() {
            Term::LongTerm => long_term.add(event),
            Term::ShortTerm => short_term.add(event),
        }
    }
    TaxEstimate {
        rates,
        long_term,
        short_term,
    }
}

/// Estimate for the events of a single asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetEstimate {
    pub asset: String,
    pub estimate: TaxEstimate,
}

/// Per-asset estimates, in asset symbol order
pub fn estimate_by_asset<'a, I>(events: I, rates: Rates) -> Vec<AssetEstimate>
where
    I: IntoIterator<Item = &'a TaxableEvent>,
{
    let mut by_asset: BTreeMap<&str, Vec<&TaxableEvent>> = BTreeMap::new();
    for event in events {
        by_asset.entry(event.asset.as_str()).or_default().push(event);
    }
    by_asset
        .into_iter()
        .map(|(asset, events)| AssetEstimate {
            asset: asset.to_string(),
            estimate: estimate(events, rates),
        })
        .collect()
}
