//! Import command - convert exchange exports into the normalized transaction CSV

use anyhow::Context;
use clap::{Args, Subcommand};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use taxlots::core::write_transactions_csv;
use taxlots::exchanges::binance;

#[derive(Subcommand, Debug)]
pub enum ImportCommand {
    /// Import a Binance transaction history CSV export
    Binance(ImportCsvArgs),
}

#[derive(Args, Debug)]
pub struct ImportCsvArgs {
    /// The exchange CSV export to import
    file: PathBuf,

    /// Write the normalized CSV to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ImportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self {
            ImportCommand::Binance(args) => {
                let file = File::open(&args.file)
                    .with_context(|| format!("opening {}", args.file.display()))?;
                let transactions = binance::import_transactions(BufReader::new(file))
                    .with_context(|| format!("importing {}", args.file.display()))?;
                args.write(&transactions)
            }
        }
    }
}

impl ImportCsvArgs {
    fn write(&self, transactions: &[taxlots::core::Transaction]) -> anyhow::Result<()> {
        match &self.output {
            Some(path) => {
                let file =
                    File::create(path).with_context(|| format!("creating {}", path.display()))?;
                write_transactions_csv(transactions, file)?;
                log::info!(
                    "Wrote {} transactions to {}",
                    transactions.len(),
                    path.display()
                );
                Ok(())
            }
            None => write_transactions_csv(transactions, io::stdout()),
        }
    }
}
