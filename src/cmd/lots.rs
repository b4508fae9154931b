//! Lots command - lots still open after matching every transaction

use super::{format_amount, format_quantity, MatchArgs};
use clap::Args;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use taxlots::core::{Lot, Portfolio};

#[derive(Args, Debug)]
pub struct LotsCommand {
    #[command(flatten)]
    matching: MatchArgs,

    /// Filter by asset (e.g., BTC, ETH)
    #[arg(short, long)]
    asset: Option<String>,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Tabled)]
struct LotRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Acquired")]
    acquired: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Basis")]
    basis: String,
    #[tabled(rename = "Unit Cost")]
    unit_cost: String,
}

#[derive(Debug, Serialize)]
struct LotsOutput<'a> {
    method: String,
    lots: Vec<&'a Lot>,
}

impl LotsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let outcome = self.matching.run()?;
        let lots = self.select(&outcome.portfolio);

        if self.json {
            let output = LotsOutput {
                method: self.matching.options().method.to_string(),
                lots,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            self.print_table(&lots);
        }
        Ok(())
    }

    fn select<'a>(&self, portfolio: &'a Portfolio) -> Vec<&'a Lot> {
        portfolio
            .iter()
            .filter(|lot| {
                self.asset
                    .as_deref()
                    .is_none_or(|a| lot.asset.eq_ignore_ascii_case(a))
            })
            .collect()
    }

    fn print_table(&self, lots: &[&Lot]) {
        if lots.is_empty() {
            println!("No open lots");
            return;
        }

        println!();
        println!("OPEN LOTS ({})", self.matching.options().method);
        println!();

        let rows: Vec<LotRow> = lots
            .iter()
            .map(|lot| LotRow {
                asset: lot.asset.clone(),
                acquired: lot.acquired_at.format("%Y-%m-%d").to_string(),
                quantity: format_quantity(lot.quantity),
                basis: format_amount(lot.basis),
                unit_cost: lot.unit_cost().map_or("-".to_string(), format_amount),
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }
}
