pub mod binance;

use crate::core::Transaction;
use serde::de::DeserializeOwned;
use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("invalid date '{value}': {source}")]
    DateParse {
        value: String,
        source: chrono::format::ParseError,
    },
    #[error("invalid amount '{value}' in column {column}: {source}")]
    AmountParse {
        column: &'static str,
        value: String,
        source: rust_decimal::Error,
    },
    #[error(transparent)]
    Validation(#[from] crate::core::ValidationError),
    #[error("record {line}: {source}")]
    Record {
        line: usize,
        source: Box<ExchangeError>,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// A row of an exchange CSV export
pub trait ExchangeRecord: DeserializeOwned {
    /// Convert into a normalized transaction, `None` for rows that are not
    /// buys or sells
    fn into_transaction(self) -> Result<Option<Transaction>, ExchangeError>;
}

/// Read an exchange export into transactions sorted by datetime
pub fn csv_to_transactions<R, Rec>(reader: R) -> Result<Vec<Transaction>, ExchangeError>
where
    R: Read,
    Rec: ExchangeRecord,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut transactions = Vec::new();
    let mut skipped = 0usize;
    for (index, result) in rdr.deserialize::<Rec>().enumerate() {
        let record = result?;
        match record.into_transaction() {
            Ok(Some(tx)) => transactions.push(tx),
            Ok(None) => skipped += 1,
            Err(e) => {
                return Err(ExchangeError::Record {
                    line: index + 2,
                    source: Box::new(e),
                })
            }
        }
    }
    log::info!(
        "Read {} transactions, skipped {} records",
        transactions.len(),
        skipped
    );
    transactions.sort_by_key(|tx| tx.datetime);
    Ok(transactions)
}
