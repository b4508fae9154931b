use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

/// Domain warnings emitted during matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Warning {
    /// A sale exceeded the open lots for its asset and the unmatched tail was
    /// dropped. When the sale touched no lots at all, `unmatched_quantity`
    /// equals the sale quantity.
    Oversold {
        asset: String,
        datetime: NaiveDateTime,
        unmatched_quantity: Decimal,
        unmatched_value: Decimal,
    },
    /// A transaction with zero quantity was skipped.
    ZeroQuantity {
        asset: String,
        datetime: NaiveDateTime,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::Oversold {
                asset,
                datetime,
                unmatched_quantity,
                unmatched_value,
            } => write!(
                f,
                "{} sale at {} exceeded open lots: {} unmatched (value {:.2}) dropped",
                asset, datetime, unmatched_quantity, unmatched_value
            ),
            Warning::ZeroQuantity { asset, datetime } => {
                write!(f, "{} transaction at {} has zero quantity", asset, datetime)
            }
        }
    }
}
