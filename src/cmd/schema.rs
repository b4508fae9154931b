//! Schema command - print the expected transaction input format

use clap::Args;
use schemars::schema_for;
use taxlots::core::TransactionRecord;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "csv-fields")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
    /// JSON Schema of a single transaction record
    JsonSchema,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::CsvHeader => self.print_csv_header(),
            SchemaFormat::CsvFields => self.print_csv_fields(),
            SchemaFormat::JsonSchema => self.print_json_schema(),
        }
    }

    fn print_csv_header(&self) -> anyhow::Result<()> {
        let names: Vec<_> = TransactionRecord::csv_columns()
            .iter()
            .map(|c| c.name)
            .collect();
        println!("{}", names.join(","));
        Ok(())
    }

    fn print_csv_fields(&self) -> anyhow::Result<()> {
        println!("Transaction CSV Format");
        println!("======================");
        println!();
        for column in TransactionRecord::csv_columns() {
            let req = if column.required { "required" } else { "optional" };
            println!("{:12} ({:8})  {}", column.name, req, column.description);
        }
        println!();
        println!("Rows are sorted by date on read; sales are matched against earlier buys.");
        Ok(())
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(TransactionRecord);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
