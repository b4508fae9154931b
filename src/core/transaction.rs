use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use taxlots_derive::CsvSchema;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("negative quantity {quantity} for {asset} at {datetime}")]
    NegativeQuantity {
        asset: String,
        datetime: NaiveDateTime,
        quantity: Decimal,
    },
    #[error("negative value {value} for {asset} at {datetime}")]
    NegativeValue {
        asset: String,
        datetime: NaiveDateTime,
        value: Decimal,
    },
    #[error("empty asset symbol at {0}")]
    EmptyAsset(NaiveDateTime),
    #[error("{asset} transaction at {datetime} precedes previous transaction at {previous}")]
    OutOfOrder {
        asset: String,
        datetime: NaiveDateTime,
        previous: NaiveDateTime,
    },
    #[error("invalid datetime: {0}")]
    InvalidDatetime(String),
    #[error("invalid side '{0}', expected Buy or Sell")]
    InvalidSide(String),
}

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn parse(s: &str) -> Result<Side, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(ValidationError::InvalidSide(s.to_string())),
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// A normalized buy or sell of some quantity of an asset for a total value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub side: Side,
    pub asset: String,
    pub quantity: Decimal,
    /// Total value of the transaction: cost for a buy, proceeds for a sell
    pub value: Decimal,
    pub datetime: NaiveDateTime,
    pub description: Option<String>,
}

impl Transaction {
    pub fn buy(
        asset: impl Into<String>,
        quantity: Decimal,
        value: Decimal,
        datetime: NaiveDateTime,
    ) -> Self {
        Self::new(Side::Buy, asset, quantity, value, datetime)
    }

    pub fn sell(
        asset: impl Into<String>,
        quantity: Decimal,
        value: Decimal,
        datetime: NaiveDateTime,
    ) -> Self {
        Self::new(Side::Sell, asset, quantity, value, datetime)
    }

    fn new(
        side: Side,
        asset: impl Into<String>,
        quantity: Decimal,
        value: Decimal,
        datetime: NaiveDateTime,
    ) -> Self {
        Transaction {
            side,
            asset: asset.into(),
            quantity,
            value,
            datetime,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the field-level invariants. Zero quantity is allowed and treated
    /// as a no-op by the matcher.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.asset.trim().is_empty() {
            return Err(ValidationError::EmptyAsset(self.datetime));
        }
        if self.quantity.is_sign_negative() && !self.quantity.is_zero() {
            return Err(ValidationError::NegativeQuantity {
                asset: self.asset.clone(),
                datetime: self.datetime,
                quantity: self.quantity,
            });
        }
        if self.value.is_sign_negative() && !self.value.is_zero() {
            return Err(ValidationError::NegativeValue {
                asset: self.asset.clone(),
                datetime: self.datetime,
                value: self.value,
            });
        }
        Ok(())
    }
}

/// Column description generated by `#[derive(CsvSchema)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// CSV row of the normalized transaction format
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, CsvSchema)]
pub struct TransactionRecord {
    /// Transaction date (YYYY-MM-DD, YYYY-MM-DD hh:mm:ss or YYYY-MM-DDThh:mm:ss)
    pub date: String,
    /// Buy or Sell
    pub side: String,
    /// Asset symbol (e.g. BTC, ETH)
    pub asset: String,
    /// Quantity of the asset bought or sold
    #[schemars(with = "f64")]
    pub quantity: Decimal,
    /// Total cost of a buy or total proceeds of a sell
    #[schemars(with = "f64")]
    pub value: Decimal,
    /// Optional free-text description
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = ValidationError;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let tx = Transaction {
            side: Side::parse(&record.side)?,
            datetime: parse_datetime(&record.date)?,
            asset: record.asset.trim().to_string(),
            quantity: record.quantity,
            value: record.value,
            description: record.description.filter(|d| !d.is_empty()),
        };
        tx.validate()?;
        Ok(tx)
    }
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        TransactionRecord {
            date: tx.datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            side: tx.side.display().to_string(),
            asset: tx.asset.clone(),
            quantity: tx.quantity.normalize(),
            value: tx.value.normalize(),
            description: tx.description.clone(),
        }
    }
}

/// Parse a date string that may be date-only or datetime format
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, ValidationError> {
    let s = s.trim();
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    // Date-only defaults to midnight
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ValidationError::InvalidDatetime(s.to_string()))
}

/// Read normalized transactions from CSV, stably sorted by datetime
pub fn read_transactions_csv<R: Read>(reader: R) -> anyhow::Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut transactions = Vec::new();
    for (index, result) in rdr.deserialize::<TransactionRecord>().enumerate() {
        let record = result?;
        // header is line 1
        let line = index + 2;
        let tx = Transaction::try_from(record)
            .map_err(|e| anyhow::anyhow!("line {}: {}", line, e))?;
        transactions.push(tx);
    }
    log::info!("Read {} transactions", transactions.len());
    transactions.sort_by_key(|tx| tx.datetime);
    Ok(transactions)
}

pub fn write_transactions_csv<W: Write>(
    transactions: &[Transaction],
    writer: W,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for tx in transactions {
        wtr.serialize(TransactionRecord::from(tx))?;
    }
    wtr.flush()?;
    Ok(())
}
