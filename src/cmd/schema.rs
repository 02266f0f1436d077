//! Schema command - print expected input formats

use clap::Args;
use ihtc::core::{EstateInput, GiftBookInput, GiftRecord};
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the gift book input
    JsonSchema,
    /// JSON Schema for the estate input
    EstateSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(GiftBookInput);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::EstateSchema => {
                let schema = schema_for!(EstateInput);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvHeader => println!("{}", GiftRecord::csv_header()),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
        Ok(())
    }

    fn print_csv_fields(&self) {
        println!("CSV Input Format");
        println!("================");
        println!();
        for field in GiftRecord::csv_schema() {
            let req = if field.required { "required" } else { "optional" };
            println!("{:20} ({:8})  {}", field.name, req, field.description);
        }
        println!();
        println!("Values are in GBP. Dates are YYYY-MM-DD or DD/MM/YYYY.");
    }
}
