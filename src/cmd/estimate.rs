//! Estimate command - flat-rate tax on long and short term gains

use super::{filter_events, format_amount, year_label, MatchArgs};
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::str::FromStr;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use taxlots::core::{estimate, estimate_by_asset, Rates, TaxEstimate, Term, TermTotals};

#[derive(Args, Debug)]
pub struct EstimateCommand {
    #[command(flatten)]
    matching: MatchArgs,

    /// Calendar year of disposal to estimate (e.g. 2021)
    #[arg(short, long)]
    year: Option<i32>,

    /// Filter by asset (e.g., BTC, ETH)
    #[arg(short, long)]
    asset: Option<String>,

    /// Rate applied to net long-term gains (held 365 days or more)
    #[arg(long, value_parser = parse_rate, default_value = "0.15")]
    long_term_rate: Decimal,

    /// Rate applied to net short-term gains
    #[arg(long, value_parser = parse_rate, default_value = "0.37")]
    short_term_rate: Decimal,

    /// Break the estimate down per asset
    #[arg(long)]
    by_asset: bool,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

fn parse_rate(s: &str) -> Result<Decimal, String> {
    let rate = Decimal::from_str(s.trim()).map_err(|e| format!("invalid rate '{}': {}", s, e))?;
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(format!("rate {} must be between 0 and 1", rate));
    }
    Ok(rate)
}

#[derive(Debug, Clone, Tabled)]
struct TermRow {
    #[tabled(rename = "Term")]
    term: String,
    #[tabled(rename = "Disposals")]
    disposals: usize,
    #[tabled(rename = "Proceeds")]
    proceeds: String,
    #[tabled(rename = "Basis")]
    basis: String,
    #[tabled(rename = "Net Gain")]
    gain: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

impl TermRow {
    fn new(term: Term, totals: &TermTotals, rates: &Rates) -> Self {
        let rate = rates.rate(term);
        TermRow {
            term: term.display().to_string(),
            disposals: totals.events,
            proceeds: format_amount(totals.proceeds),
            basis: format_amount(totals.basis),
            gain: format_amount(totals.gain()),
            rate: format!("{:.1}%", rate * dec!(100)),
            tax: format_amount(totals.gain() * rate),
        }
    }
}

#[derive(Debug, Serialize)]
struct EstimateSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    asset: Option<String>,
    disposals: usize,
    long_term_gain: String,
    short_term_gain: String,
    long_term_rate: String,
    short_term_rate: String,
    tax_owed: String,
}

impl EstimateSummary {
    fn new(asset: Option<String>, est: &TaxEstimate) -> Self {
        EstimateSummary {
            asset,
            disposals: est.event_count(),
            long_term_gain: format_amount(est.long_term_gain()),
            short_term_gain: format_amount(est.short_term_gain()),
            long_term_rate: est.rates.long_term.to_string(),
            short_term_rate: est.rates.short_term.to_string(),
            tax_owed: format_amount(est.tax_owed()),
        }
    }
}

#[derive(Debug, Serialize)]
struct EstimateOutput {
    method: String,
    year: String,
    total: EstimateSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assets: Vec<EstimateSummary>,
}

impl EstimateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let outcome = self.matching.run()?;
        let rates = Rates::new(self.long_term_rate, self.short_term_rate);
        let selected: Vec<_> =
            filter_events(&outcome.events, self.year, self.asset.as_deref()).collect();

        let total = estimate(selected.iter().copied(), rates);
        let per_asset = if self.by_asset {
            estimate_by_asset(selected.iter().copied(), rates)
        } else {
            Vec::new()
        };

        if self.json {
            let output = EstimateOutput {
                method: self.matching.options().method.to_string(),
                year: year_label(self.year),
                total: EstimateSummary::new(self.asset.clone(), &total),
                assets: per_asset
                    .iter()
                    .map(|a| EstimateSummary::new(Some(a.asset.clone()), &a.estimate))
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!();
        println!(
            "TAX ESTIMATE ({}, {})",
            self.matching.options().method,
            year_label(self.year)
        );
        println!();
        print_estimate(&total);

        for asset in &per_asset {
            println!();
            println!("{}", asset.asset);
            print_estimate(&asset.estimate);
        }
        Ok(())
    }
}

fn print_estimate(est: &TaxEstimate) {
    let rows = vec![
        TermRow::new(Term::LongTerm, &est.long_term, &est.rates),
        TermRow::new(Term::ShortTerm, &est.short_term, &est.rates),
    ];
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
    println!("Total gain: {}", format_amount(est.total_gain()));
    println!("Tax owed:   {}", format_amount(est.tax_owed()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_must_be_fraction() {
        assert_eq!(parse_rate("0.2"), Ok(dec!(0.2)));
        assert_eq!(parse_rate("1"), Ok(Decimal::ONE));
        assert!(parse_rate("1.5").is_err());
        assert!(parse_rate("-0.1").is_err());
        assert!(parse_rate("twenty").is_err());
    }
}
