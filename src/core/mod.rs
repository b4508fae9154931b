pub mod estimate;
pub mod events;
pub mod matcher;
pub mod portfolio;
pub mod transaction;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use estimate::{
    estimate, estimate_by_asset, AssetEstimate, Rates, TaxEstimate, Term, TermTotals,
};
pub use events::TaxableEvent;
pub use matcher::{
    match_into, match_transactions, MatchError, MatchOptions, MatchOutcome, Method,
    OversellPolicy,
};
pub use portfolio::{Lot, Portfolio};
pub use transaction::{
    parse_datetime, read_transactions_csv, write_transactions_csv, CsvColumn, Side, Transaction,
    TransactionRecord, ValidationError,
};
pub use warnings::Warning;
