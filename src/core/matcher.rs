//! Lot matching: pairs each sale with the open lots it disposes of.
//!
//! Buys open a lot at the back of their asset's queue. A sale consumes lots
//! from the front of the queue (FIFO) or from the back (LIFO), emitting one
//! [`TaxableEvent`] per lot it touches:
//!
//! 1. A lot no larger than the unmatched quantity is consumed whole. It keeps
//!    its full remaining basis and is allocated the unmatched proceeds in
//!    proportion to its share of the unmatched quantity. A lot that exactly
//!    covers the unmatched quantity takes all of the unmatched proceeds.
//! 2. A larger lot is split. The disposed part takes a proportional share of
//!    the lot's basis and all of the unmatched proceeds; the remainder stays
//!    in the queue with the rest of the basis.
//!
//! Proceeds of a sale's events always sum exactly to the sale's value, and
//! the basis handed out by a lot plus its remaining basis always equals its
//! original cost.

use super::events::TaxableEvent;
use super::portfolio::{Lot, Portfolio};
use super::transaction::{Side, Transaction, ValidationError};
use super::warnings::Warning;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Order in which open lots are matched against a sale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    /// Oldest lot first
    #[default]
    Fifo,
    /// Most recently acquired lot first
    Lifo,
}

impl Method {
    pub fn display(&self) -> &'static str {
        match self {
            Method::Fifo => "FIFO",
            Method::Lifo => "LIFO",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// What to do with a sale larger than the open lots for its asset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OversellPolicy {
    /// Fail the run with [`MatchError::InsufficientLots`]
    #[default]
    Reject,
    /// Match what is available, drop the rest and record a [`Warning::Oversold`]
    Truncate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub method: Method,
    pub oversell: OversellPolicy,
}

impl MatchOptions {
    pub fn new(method: Method) -> Self {
        MatchOptions {
            method,
            ..Default::default()
        }
    }

    pub fn oversell(mut self, policy: OversellPolicy) -> Self {
        self.oversell = policy;
        self
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("insufficient {asset} lots for sale at {datetime}: {unmatched} unmatched of {quantity}")]
    InsufficientLots {
        asset: String,
        datetime: NaiveDateTime,
        quantity: Decimal,
        unmatched: Decimal,
    },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

/// Result of matching a transaction list against a fresh portfolio
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub events: Vec<TaxableEvent>,
    /// Lots still open after the last transaction
    pub portfolio: Portfolio,
    pub warnings: Vec<Warning>,
}

/// Match `transactions` against an initially empty portfolio
pub fn match_transactions(
    transactions: &[Transaction],
    options: &MatchOptions,
) -> Result<MatchOutcome, MatchError> {
    let mut portfolio = Portfolio::new();
    let (events, warnings) = match_into(&mut portfolio, transactions, options)?;
    Ok(MatchOutcome {
        events,
        portfolio,
        warnings,
    })
}

/// Match `transactions` against an existing portfolio, mutating it in place.
///
/// Transactions must be in non-decreasing datetime order per asset, including
/// relative to earlier batches matched into the same portfolio; they are
/// processed strictly in the order given. A rejected oversell fails before
/// the offending sale touches any lot.
pub fn match_into(
    portfolio: &mut Portfolio,
    transactions: &[Transaction],
    options: &MatchOptions,
) -> Result<(Vec<TaxableEvent>, Vec<Warning>), MatchError> {
    let mut events = Vec::new();
    let mut warnings = Vec::new();
    let mut sales = 0usize;

    for tx in transactions {
        tx.validate()?;
        portfolio.observe(&tx.asset, tx.datetime)?;

        if tx.quantity.is_zero() {
            log::warn!("Skipping zero quantity {} {} at {}", tx.side, tx.asset, tx.datetime);
            warnings.push(Warning::ZeroQuantity {
                asset: tx.asset.clone(),
                datetime: tx.datetime,
            });
            continue;
        }

        match tx.side {
            Side::Buy => portfolio.add(Lot::new(
                tx.asset.clone(),
                tx.datetime,
                tx.quantity,
                tx.value,
            )),
            Side::Sell => {
                sales += 1;
                let lots = portfolio.lots_mut(&tx.asset);
                let available: Decimal = lots.iter().map(|lot| lot.quantity).sum();
                if available < tx.quantity && options.oversell == OversellPolicy::Reject {
                    return Err(MatchError::InsufficientLots {
                        asset: tx.asset.clone(),
                        datetime: tx.datetime,
                        quantity: tx.quantity,
                        unmatched: tx.quantity - available,
                    });
                }

                let (unmatched_quantity, unmatched_value) =
                    dispose(lots, tx, options.method, &mut events)?;
                if unmatched_quantity > Decimal::ZERO {
                    let warning = Warning::Oversold {
                        asset: tx.asset.clone(),
                        datetime: tx.datetime,
                        unmatched_quantity,
                        unmatched_value,
                    };
                    log::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
    }

    log::info!(
        "Matched {} sales into {} taxable events ({})",
        sales,
        events.len(),
        options.method
    );
    Ok((events, warnings))
}

/// Consume lots for a single sale, returning the unmatched (quantity, value)
fn dispose(
    lots: &mut VecDeque<Lot>,
    tx: &Transaction,
    method: Method,
    events: &mut Vec<TaxableEvent>,
) -> Result<(Decimal, Decimal), MatchError> {
    let mut remaining_qty = tx.quantity;
    let mut remaining_value = tx.value;

    while remaining_qty > Decimal::ZERO {
        let Some(lot) = next_lot(lots, method) else {
            break;
        };
        if lot.quantity <= Decimal::ZERO {
            return Err(MatchError::InvariantViolation(format!(
                "{} lot acquired {} has non-positive quantity {}",
                lot.asset, lot.acquired_at, lot.quantity
            )));
        }

        if lot.quantity <= remaining_qty {
            // whole lot disposed, the last one takes whatever proceeds are left
            let proceeds = if lot.quantity == remaining_qty {
                remaining_value
            } else {
                mul_div(remaining_value, lot.quantity, remaining_qty)?
            };
            log::debug!(
                "Lot {} CLOSE: acquired={}, qty={}, basis={}, proceeds={}",
                lot.asset,
                lot.acquired_at,
                lot.quantity,
                lot.basis,
                proceeds
            );
            events.push(TaxableEvent {
                asset: tx.asset.clone(),
                acquired_at: lot.acquired_at,
                disposed_at: tx.datetime,
                quantity: lot.quantity,
                basis: lot.basis,
                proceeds,
            });
            remaining_qty -= lot.quantity;
            remaining_value -= proceeds;
            take_lot(lots, method);
        } else {
            // split lot, the remainder stays open
            let basis = mul_div(lot.basis, remaining_qty, lot.quantity)?;
            events.push(TaxableEvent {
                asset: tx.asset.clone(),
                acquired_at: lot.acquired_at,
                disposed_at: tx.datetime,
                quantity: remaining_qty,
                basis,
                proceeds: remaining_value,
            });
            lot.quantity -= remaining_qty;
            lot.basis -= basis;
            log::debug!(
                "Lot {} SPLIT: acquired={}, disposed qty={}, basis={}, proceeds={}. Remaining: qty={}, basis={}",
                lot.asset,
                lot.acquired_at,
                remaining_qty,
                basis,
                remaining_value,
                lot.quantity,
                lot.basis
            );
            remaining_qty = Decimal::ZERO;
            remaining_value = Decimal::ZERO;
        }
    }

    Ok((remaining_qty, remaining_value))
}

fn next_lot(lots: &mut VecDeque<Lot>, method: Method) -> Option<&mut Lot> {
    match method {
        Method::Fifo => lots.front_mut(),
        Method::Lifo => lots.back_mut(),
    }
}

fn take_lot(lots: &mut VecDeque<Lot>, method: Method) -> Option<Lot> {
    match method {
        Method::Fifo => lots.pop_front(),
        Method::Lifo => lots.pop_back(),
    }
}

/// `a * b / c`, multiplying first to keep exact ratios exact
fn mul_div(a: Decimal, b: Decimal, c: Decimal) -> Result<Decimal, MatchError> {
    a.checked_mul(b)
        .and_then(|product| product.checked_div(c))
        .ok_or_else(|| {
            MatchError::InvariantViolation(format!("cannot compute {} * {} / {}", a, b, c))
        })
}
