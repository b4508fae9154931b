use super::{ExchangeError, ExchangeRecord};
use crate::core::{Side, Transaction};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

const DATE_FORMAT: &str = "%m/%d/%y %I:%M %p";
const SPOT_TRADING: &str = "Spot Trading";

/// Row of a Binance transaction history export
#[derive(Debug, Deserialize, Clone)]
pub struct Record {
    // Time,Category,Operation,Base_Asset,Quote_Asset,Realized_Amount_For_Base_Asset,...
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Operation")]
    operation: String,
    #[serde(rename = "Base_Asset")]
    base_asset: String,
    #[serde(rename = "Quote_Asset")]
    quote_asset: String,
    #[serde(rename = "Realized_Amount_For_Base_Asset")]
    base_amount: String,
    #[serde(rename = "Realized_Amount_For_Quote_Asset")]
    quote_amount: String,
    #[serde(rename = "Realized_Amount_For_Quote_Asset_In_USD_Value")]
    usd_value: String,
}

impl ExchangeRecord for Record {
    fn into_transaction(self) -> Result<Option<Transaction>, ExchangeError> {
        let side = match self.operation.as_str() {
            "Buy" => Side::Buy,
            "Sell" => Side::Sell,
            other => {
                log::debug!("Skipping Binance {} operation at {}", other, self.time);
                return Ok(None);
            }
        };

        let datetime = NaiveDateTime::parse_from_str(&self.time, DATE_FORMAT).map_err(|source| {
            ExchangeError::DateParse {
                value: self.time.clone(),
                source,
            }
        })?;

        // Spot trades move the base asset, everything else (e.g. convert) the quote asset
        let (asset, quantity) = if self.category == SPOT_TRADING {
            (
                self.base_asset,
                parse_amount("Realized_Amount_For_Base_Asset", &self.base_amount)?,
            )
        } else {
            (
                self.quote_asset,
                parse_amount("Realized_Amount_For_Quote_Asset", &self.quote_amount)?,
            )
        };
        let value = parse_amount(
            "Realized_Amount_For_Quote_Asset_In_USD_Value",
            &self.usd_value,
        )?;

        let tx = Transaction {
            side,
            asset,
            quantity,
            value,
            datetime,
            description: Some(format!("Binance {}", self.category)),
        };
        tx.validate()?;
        Ok(Some(tx))
    }
}

/// Parse an amount that may contain thousands separators
fn parse_amount(column: &'static str, value: &str) -> Result<Decimal, ExchangeError> {
    let cleaned: String = value.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(cleaned.trim()).map_err(|source| ExchangeError::AmountParse {
        column,
        value: value.to_string(),
        source,
    })
}

pub fn import_transactions<R: Read>(reader: R) -> Result<Vec<Transaction>, ExchangeError> {
    super::csv_to_transactions::<R, Record>(reader)
}
