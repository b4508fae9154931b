mod cmd;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "taxlots", version, about = "FIFO/LIFO tax lot matching and gain estimates")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match sales to lots and list the taxable disposals
    Disposals(cmd::disposals::DisposalsCommand),
    /// List the lots still open after matching
    Lots(cmd::lots::LotsCommand),
    /// Estimate flat-rate tax on long and short term gains
    Estimate(cmd::estimate::EstimateCommand),
    /// Convert an exchange export into the transaction CSV format
    #[command(subcommand)]
    Import(cmd::import::ImportCommand),
    /// Print the transaction CSV format
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match &cli.command {
        Command::Disposals(disposals) => disposals.exec(),
        Command::Lots(lots) => lots.exec(),
        Command::Estimate(estimate) => estimate.exec(),
        Command::Import(import) => import.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}

fn init_logger(verbose: u8) {
    let mut builder = pretty_env_logger::formatted_builder();
    match std::env::var("RUST_LOG") {
        Ok(filters) => {
            builder.parse_filters(&filters);
        }
        Err(_) => {
            let level = match verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                _ => LevelFilter::Debug,
            };
            builder.filter_level(level);
        }
    }
    builder.init();
}
