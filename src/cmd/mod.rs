pub mod estate;
pub mod gifts;
pub mod schema;
pub mod summary;
pub mod validate;

use chrono::NaiveDate;
use clap::ValueEnum;
use ihtc::core::{
    input, process_gifts, AnnualExemptionState, EstateSnapshot, Gift, GiftBook, PetTreatment,
    ProcessedGift,
};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// How failed PETs interact with the estate's nil-rate band
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum PetTreatmentArg {
    /// Report gift and estate exposure side by side
    #[default]
    Separate,
    /// Let failed PETs use the nil-rate band first
    ConsumeNilRateBand,
}

impl From<PetTreatmentArg> for PetTreatment {
    fn from(arg: PetTreatmentArg) -> Self {
        match arg {
            PetTreatmentArg::Separate => PetTreatment::Separate,
            PetTreatmentArg::ConsumeNilRateBand => PetTreatment::ConsumeNilRateBand,
        }
    }
}

/// Read gifts from a CSV or JSON file (or stdin with "-")
pub fn read_gifts(path: &Path) -> anyhow::Result<GiftBook> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        BufReader::new(io::stdin().lock()).read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        let is_json = buffer
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'{');
        let cursor = io::Cursor::new(buffer);
        return if is_json {
            input::read_json(cursor)
        } else {
            input::read_csv(cursor)
        };
    }

    let reader = BufReader::new(File::open(path)?);
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        input::read_json(reader)
    } else {
        input::read_csv(reader)
    }
}

/// Read an estate from a JSON file
pub fn read_estate(path: &Path) -> anyhow::Result<EstateSnapshot> {
    input::read_estate_json(BufReader::new(File::open(path)?))
}

/// Explicit as-of date, or today
pub fn as_of_or_today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| chrono::Local::now().date_naive())
}

/// Reject gifts the calculators cannot take
pub fn validate_gifts(gifts: &[Gift], as_of: NaiveDate) -> anyhow::Result<()> {
    for gift in gifts {
        gift.validate(as_of)?;
    }
    Ok(())
}

/// Validate and allocate a gift book. `prior_year_used` overrides any value in the file.
pub fn process_book(
    book: &GiftBook,
    prior_year_used: Option<Decimal>,
    as_of: NaiveDate,
) -> anyhow::Result<Vec<ProcessedGift>> {
    validate_gifts(&book.gifts, as_of)?;
    let opening = prior_year_used
        .or(book.prior_year_annual_used)
        .zip(book.gifts.iter().map(|g| g.tax_year()).min())
        .map(|(used, first_year)| AnnualExemptionState::with_prior_year_used(first_year, used));
    Ok(process_gifts(&book.gifts, opening, as_of))
}

pub fn format_gbp(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-£{}", with_thousands(amount.abs()))
    } else {
        format!("£{}", with_thousands(amount))
    }
}

fn with_thousands(amount: Decimal) -> String {
    let s = format!("{:.2}", amount);
    let (whole, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}.{}", grouped, frac)
}

pub fn format_pct(fraction: Decimal) -> String {
    format!("{}%", (fraction * Decimal::ONE_HUNDRED).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn gbp_formatting() {
        assert_eq!(format_gbp(dec!(0)), "£0.00");
        assert_eq!(format_gbp(dec!(250)), "£250.00");
        assert_eq!(format_gbp(dec!(3000)), "£3,000.00");
        assert_eq!(format_gbp(dec!(1234567.891)), "£1,234,567.89");
        assert_eq!(format_gbp(dec!(-70000)), "-£70,000.00");
    }

    #[test]
    fn pct_formatting() {
        assert_eq!(format_pct(dec!(0.40)), "40%");
        assert_eq!(format_pct(dec!(0.36)), "36%");
        assert_eq!(format_pct(dec!(1)), "100%");
    }
}
