//! Gifts command - per-gift exemption allocation and taper position

use super::{as_of_or_today, format_gbp, process_book, read_gifts};
use chrono::NaiveDate;
use clap::Args;
use ihtc::core::{ProcessedGift, TaxYear};
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct GiftsCommand {
    /// CSV or JSON file containing gifts ("-" for stdin)
    #[arg(short, long)]
    gifts: PathBuf,

    /// Date to measure the 7-year window from (default today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Annual exemption used in the tax year before the first gift
    #[arg(long)]
    prior_year_used: Option<Decimal>,

    /// Only show gifts from this tax year (e.g., 2025 for 2024/25)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Row for the gifts table output
#[derive(Debug, Clone, Tabled, serde::Serialize)]
pub struct GiftRow {
    #[tabled(rename = "Date")]
    pub date: String,

    #[tabled(rename = "Tax Year")]
    pub tax_year: String,

    #[tabled(rename = "Recipient")]
    pub recipient: String,

    #[tabled(rename = "Relationship")]
    pub relationship: String,

    #[tabled(rename = "Value")]
    pub value: String,

    #[tabled(rename = "Exemptions")]
    pub exemptions: String,

    #[tabled(rename = "Taxable")]
    pub taxable: String,

    #[tabled(rename = "Years")]
    pub years_elapsed: String,

    #[tabled(rename = "Relief")]
    pub relief: String,

    #[tabled(rename = "Potential IHT")]
    pub potential_iht: String,

    #[tabled(rename = "Exempt From")]
    pub exempt_from: String,
}

impl From<&ProcessedGift> for GiftRow {
    fn from(p: &ProcessedGift) -> Self {
        let exemptions = p
            .allocation
            .allocations
            .iter()
            .map(|a| format!("{} {}", a.exemption, format_gbp(a.amount)))
            .collect::<Vec<_>>()
            .join("; ");
        let relief = if p.taxable_amount().is_zero() {
            "-".to_string()
        } else {
            p.taper.band.to_string()
        };

        GiftRow {
            date: p.gift.date.format("%Y-%m-%d").to_string(),
            tax_year: p.gift.tax_year().display(),
            recipient: p.gift.recipient.clone(),
            relationship: p.gift.relationship.display().to_string(),
            value: format_gbp(p.gift.value),
            exemptions: if exemptions.is_empty() {
                "-".to_string()
            } else {
                exemptions
            },
            taxable: format_gbp(p.taxable_amount()),
            years_elapsed: format!("{:.1}", p.taper.years_elapsed),
            relief,
            potential_iht: format_gbp(p.potential_iht()),
            exempt_from: p
                .taper
                .exempt_from
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

impl GiftsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let as_of = as_of_or_today(self.as_of);
        let book = read_gifts(&self.gifts)?;
        let processed = process_book(&book, self.prior_year_used, as_of)?;
        let tax_year = self.year.map(TaxYear);

        let selected: Vec<&ProcessedGift> = processed
            .iter()
            .filter(|p| tax_year.is_none_or(|y| p.gift.tax_year() == y))
            .collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&selected)?);
            return Ok(());
        }

        let rows: Vec<GiftRow> = selected.iter().map(|p| GiftRow::from(*p)).collect();
        if self.csv {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
            return Ok(());
        }

        self.print_table(&rows, &selected, as_of);
        Ok(())
    }

    fn print_table(&self, rows: &[GiftRow], selected: &[&ProcessedGift], as_of: NaiveDate) {
        if rows.is_empty() {
            println!("No gifts found matching filters");
            return;
        }

        println!();
        println!("GIFTS (as at {})", as_of.format("%Y-%m-%d"));
        println!();
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(4..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        let warnings: Vec<_> = selected
            .iter()
            .flat_map(|p| p.allocation.warnings.iter().map(move |w| (p, w)))
            .collect();
        if !warnings.is_empty() {
            println!();
            for (p, w) in warnings {
                println!("  [{}] {}: {}", w.name(), p.gift.id, w.message());
            }
        }
        println!();
    }
}
