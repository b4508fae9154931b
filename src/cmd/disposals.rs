//! Disposals command - one row per lot (or part of a lot) disposed of by a sale

use super::{filter_events, format_amount, format_quantity, year_label, MatchArgs};
use clap::Args;
use rust_decimal::Decimal;
use std::io;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use taxlots::core::{events, TaxableEvent};

#[derive(Args, Debug)]
pub struct DisposalsCommand {
    #[command(flatten)]
    matching: MatchArgs,

    /// Calendar year of disposal to report (e.g. 2021)
    #[arg(short, long)]
    year: Option<i32>,

    /// Filter by asset (e.g., BTC, ETH)
    #[arg(short, long)]
    asset: Option<String>,

    /// Output as CSV instead of formatted table
    #[arg(long)]
    csv: bool,

    /// Include quantity, gain and holding term columns in CSV output
    #[arg(long, requires = "csv")]
    detailed: bool,
}

#[derive(Debug, Clone, Tabled)]
struct DisposalRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Acquired")]
    acquired: String,
    #[tabled(rename = "Disposed")]
    disposed: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Basis")]
    basis: String,
    #[tabled(rename = "Proceeds")]
    proceeds: String,
    #[tabled(rename = "Gain")]
    gain: String,
    #[tabled(rename = "Term")]
    term: String,
}

impl From<&TaxableEvent> for DisposalRow {
    fn from(e: &TaxableEvent) -> Self {
        DisposalRow {
            asset: e.asset.clone(),
            acquired: e.acquired_at.format("%Y-%m-%d").to_string(),
            disposed: e.disposed_at.format("%Y-%m-%d").to_string(),
            quantity: format_quantity(e.quantity),
            basis: format_amount(e.basis),
            proceeds: format_amount(e.proceeds),
            gain: format_amount(e.gain()),
            term: e.term().display().to_string(),
        }
    }
}

impl DisposalsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let outcome = self.matching.run()?;
        let selected: Vec<&TaxableEvent> =
            filter_events(&outcome.events, self.year, self.asset.as_deref()).collect();

        if self.csv {
            if self.detailed {
                events::write_detailed_csv(selected, io::stdout())
            } else {
                events::write_csv(selected, io::stdout())
            }
        } else {
            self.print_table(&selected);
            Ok(())
        }
    }

    fn print_table(&self, selected: &[&TaxableEvent]) {
        let year_str = year_label(self.year);
        if selected.is_empty() {
            println!("No disposals found ({})", year_str);
            return;
        }

        println!();
        println!(
            "DISPOSALS ({}, {})",
            self.matching.options().method,
            year_str
        );
        println!();

        let rows: Vec<DisposalRow> = selected.iter().map(|e| DisposalRow::from(*e)).collect();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        let proceeds: Decimal = selected.iter().map(|e| e.proceeds).sum();
        let basis: Decimal = selected.iter().map(|e| e.basis).sum();
        println!();
        println!("Disposals: {}", selected.len());
        println!("Proceeds:  {}", format_amount(proceeds));
        println!("Basis:     {}", format_amount(basis));
        println!("Gain:      {}", format_amount(proceeds - basis));
    }
}
