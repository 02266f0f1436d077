//! Summary command - 7-year exposure, per-year totals and optional estate liability

use super::estate::print_estate_liability;
use super::{as_of_or_today, format_gbp, process_book, read_estate, read_gifts, PetTreatmentArg};
use chrono::NaiveDate;
use clap::Args;
use ihtc::core::{
    compute, summarize, EstateLiability, GiftBookSummary, TaxYear, TaxYearTotals,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// CSV or JSON file containing gifts ("-" for stdin)
    #[arg(short, long)]
    gifts: PathBuf,

    /// JSON file describing the estate, to add the estate liability
    #[arg(short, long)]
    estate: Option<PathBuf>,

    /// How failed PETs interact with the nil-rate band
    #[arg(long, value_enum, default_value_t = PetTreatmentArg::Separate)]
    pets: PetTreatmentArg,

    /// Date to measure the 7-year window from (default today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Annual exemption used in the tax year before the first gift
    #[arg(long)]
    prior_year_used: Option<Decimal>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// Summary data for JSON output
#[derive(Debug, Serialize)]
struct SummaryData {
    #[serde(flatten)]
    gifts: GiftBookSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    estate: Option<EstateLiability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_iht: Option<Decimal>,
}

#[derive(Debug, Tabled)]
struct YearRow {
    #[tabled(rename = "Tax Year")]
    tax_year: String,
    #[tabled(rename = "Period")]
    period: String,
    #[tabled(rename = "Gifts")]
    gift_count: usize,
    #[tabled(rename = "Value")]
    total_value: String,
    #[tabled(rename = "Exempt")]
    total_exempt: String,
    #[tabled(rename = "Annual Exemption")]
    annual_exemption_used: String,
    #[tabled(rename = "Taxable")]
    total_taxable: String,
}

impl From<&TaxYearTotals> for YearRow {
    fn from(t: &TaxYearTotals) -> Self {
        YearRow {
            tax_year: t.tax_year.display(),
            period: tax_year_period(t.tax_year),
            gift_count: t.gift_count,
            total_value: format_gbp(t.total_value),
            total_exempt: format_gbp(t.total_exempt),
            annual_exemption_used: format_gbp(t.annual_exemption_used),
            total_taxable: format_gbp(t.total_taxable),
        }
    }
}

/// "06/04/2023 - 05/04/2024"
fn tax_year_period(year: TaxYear) -> String {
    match (year.start_date(), year.end_date()) {
        (Some(start), Some(end)) => {
            format!("{} - {}", start.format("%d/%m/%Y"), end.format("%d/%m/%Y"))
        }
        _ => String::new(),
    }
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let as_of = as_of_or_today(self.as_of);
        let book = read_gifts(&self.gifts)?;
        let processed = process_book(&book, self.prior_year_used, as_of)?;
        let summary = summarize(&processed, as_of);

        let estate = match &self.estate {
            Some(path) => {
                let snapshot = read_estate(path)?;
                Some(compute(&snapshot, &summary.exposure(self.pets.into())))
            }
            None => None,
        };
        let total_iht = estate.as_ref().map(|e| e.total_tax_liability);

        if self.json {
            let data = SummaryData {
                gifts: summary,
                estate,
                total_iht,
            };
            println!("{}", serde_json::to_string_pretty(&data)?);
            return Ok(());
        }

        self.print_summary(&summary, estate.as_ref(), total_iht);
        Ok(())
    }

    fn print_summary(
        &self,
        summary: &GiftBookSummary,
        estate: Option<&EstateLiability>,
        total_iht: Option<Decimal>,
    ) {
        println!();
        println!("IHT SUMMARY (as at {})", summary.as_of.format("%Y-%m-%d"));
        println!();

        println!("GIFTS");
        println!("  Gifts recorded: {}", summary.gift_count);
        println!(
            "  Given in last 7 years: {}",
            format_gbp(summary.total_gifts_last_7_years)
        );
        println!(
            "  Active PETs: {} | Chargeable: {}",
            summary.active_pet_count,
            format_gbp(summary.chargeable_pets_last_7_years)
        );
        println!("  Exempt: {}", format_gbp(summary.total_exempt));
        println!(
            "  Potential IHT if death today: {}",
            format_gbp(summary.potential_iht_if_death_today)
        );
        println!();

        if !summary.years.is_empty() {
            let rows: Vec<YearRow> = summary.years.iter().map(YearRow::from).collect();
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
            println!();
        }

        if let Some(liability) = estate {
            print_estate_liability(liability, true);
        }
        if let Some(total) = total_iht {
            println!("TOTAL IHT: {}", format_gbp(total));
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_spans_sixth_to_fifth_april() {
        assert_eq!(tax_year_period(TaxYear(2025)), "06/04/2024 - 05/04/2025");
    }
}
