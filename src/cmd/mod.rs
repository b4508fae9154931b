pub mod disposals;
pub mod estimate;
pub mod import;
pub mod lots;
pub mod schema;

use anyhow::Context;
use chrono::Datelike;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use taxlots::core::{
    self, match_transactions, MatchOptions, MatchOutcome, Method, OversellPolicy, TaxableEvent,
    Transaction,
};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum MethodArg {
    /// First in, first out: oldest lots are sold first
    #[default]
    Fifo,
    /// Last in, first out: newest lots are sold first
    Lifo,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Fifo => Method::Fifo,
            MethodArg::Lifo => Method::Lifo,
        }
    }
}

/// Arguments shared by every command that runs the lot matcher
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Transactions CSV file. Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Lot matching method
    #[arg(short, long, value_enum, default_value_t = MethodArg::Fifo)]
    method: MethodArg,

    /// Drop the unmatched part of sales exceeding the open lots instead of failing
    #[arg(long)]
    allow_oversell: bool,
}

impl MatchArgs {
    pub fn options(&self) -> MatchOptions {
        let oversell = if self.allow_oversell {
            OversellPolicy::Truncate
        } else {
            OversellPolicy::Reject
        };
        MatchOptions::new(self.method.into()).oversell(oversell)
    }

    /// Read the transactions and run the matcher over them
    pub fn run(&self) -> anyhow::Result<MatchOutcome> {
        let transactions = read_transactions(&self.file)?;
        let options = self.options();
        let outcome = match_transactions(&transactions, &options).with_context(|| {
            format!(
                "{} matching failed for {}",
                options.method,
                display_path(&self.file)
            )
        })?;
        for warning in &outcome.warnings {
            eprintln!("warning: {}", warning);
        }
        Ok(outcome)
    }
}

/// Read normalized transactions from a CSV file (or stdin with "-")
pub fn read_transactions(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        core::read_transactions_csv(BufReader::new(file))
            .with_context(|| format!("reading {}", path.display()))
    }
}

fn read_from_stdin() -> anyhow::Result<Vec<Transaction>> {
    let mut buffer = Vec::new();
    io::stdin().lock().read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    core::read_transactions_csv(buffer.as_slice()).context("reading stdin")
}

fn display_path(path: &Path) -> String {
    if path.as_os_str() == "-" {
        "stdin".to_string()
    } else {
        path.display().to_string()
    }
}

/// Events disposed of in `year` (calendar year) for `asset`, when given
pub fn filter_events<'a>(
    events: &'a [TaxableEvent],
    year: Option<i32>,
    asset: Option<&'a str>,
) -> impl Iterator<Item = &'a TaxableEvent> {
    events.iter().filter(move |e| {
        year.is_none_or(|y| e.disposal_date().year() == y)
            && asset.is_none_or(|a| e.asset.eq_ignore_ascii_case(a))
    })
}

pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

pub fn format_quantity(qty: Decimal) -> String {
    let s = format!("{:.8}", qty);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}

pub fn year_label(year: Option<i32>) -> String {
    year.map_or("All Years".to_string(), |y| y.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format_quantity_trims_zeros() {
        assert_eq!(format_quantity(dec!(1.50000000)), "1.5");
        assert_eq!(format_quantity(dec!(2)), "2");
        assert_eq!(format_quantity(dec!(0.123456789)), "0.12345679");
    }

    #[test]
    fn format_amount_two_places() {
        assert_eq!(format_amount(dec!(3)), "3.00");
        assert_eq!(format_amount(dec!(-12.346)), "-12.35");
    }
}
