//! Validate command - surface data quality issues without generating full reports

use super::{as_of_or_today, format_gbp, process_book, read_gifts};
use chrono::NaiveDate;
use clap::Args;
use ihtc::core::{GiftBook, TaxYear};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// CSV or JSON file containing gifts ("-" for stdin)
    #[arg(short, long)]
    gifts: PathBuf,

    /// Date gifts must not be later than (default today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Annual exemption used in the tax year before the first gift
    #[arg(long)]
    prior_year_used: Option<Decimal>,

    /// Tax year to filter (e.g., 2025 for 2024/25)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A validation issue for output
#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: String,
    id: String,
    date: String,
    recipient: String,
    value: String,
    message: String,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput {
    tax_year: String,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let as_of = as_of_or_today(self.as_of);
        let book = read_gifts(&self.gifts)?;
        let tax_year = self.year.map(TaxYear);

        let mut issues = Vec::new();
        let mut valid = Vec::new();
        for gift in book.gifts {
            match gift.validate(as_of) {
                Ok(()) => valid.push(gift),
                Err(e) => {
                    if tax_year.is_none_or(|y| gift.tax_year() == y) {
                        issues.push(ValidationIssue {
                            issue_type: "InvalidGift".to_string(),
                            id: gift.id.clone(),
                            date: gift.date.format("%Y-%m-%d").to_string(),
                            recipient: gift.recipient.clone(),
                            value: format_gbp(gift.value),
                            message: e.to_string(),
                        });
                    }
                }
            }
        }

        let valid_book = GiftBook {
            gifts: valid,
            prior_year_annual_used: book.prior_year_annual_used,
        };
        let processed = process_book(&valid_book, self.prior_year_used, as_of)?;
        issues.extend(
            processed
                .iter()
                .filter(|p| tax_year.is_none_or(|y| p.gift.tax_year() == y))
                .flat_map(|p| {
                    p.allocation
                        .warnings
                        .iter()
                        .filter(|w| !w.is_advisory())
                        .map(|w| ValidationIssue {
                            issue_type: w.name().to_string(),
                            id: p.gift.id.clone(),
                            date: p.gift.date.format("%Y-%m-%d").to_string(),
                            recipient: p.gift.recipient.clone(),
                            value: format_gbp(p.gift.value),
                            message: w.message(),
                        })
                }),
        );
        issues.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        if self.json {
            self.print_json(&issues, tax_year)?;
        } else {
            self.print_text(&issues, tax_year);
        }

        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn print_text(&self, issues: &[ValidationIssue], year: Option<TaxYear>) {
        let year_str = year.map_or("All Years".to_string(), |y| y.display());

        println!();
        println!("VALIDATION RESULTS ({})", year_str);
        println!();

        if issues.is_empty() {
            println!("\u{2713} No issues found.");
            return;
        }

        println!("\u{26A0} {} issue(s) found:", issues.len());
        println!();
        for (i, issue) in issues.iter().enumerate() {
            println!(
                "  {}. [{}] {} Gift {} of {} to {}",
                i + 1,
                issue.issue_type,
                issue.date,
                issue.id,
                issue.value,
                issue.recipient
            );
            println!("     {}", issue.message);
            println!();
        }
    }

    fn print_json(&self, issues: &[ValidationIssue], year: Option<TaxYear>) -> anyhow::Result<()> {
        let output = ValidationOutput {
            tax_year: year.map_or("All Years".to_string(), |y| y.display()),
            issue_count: issues.len(),
            issues: issues.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
