//! Position of a gift in the 7-year PET window and its taper relief

use super::uk::{IHT_RATE, PET_WINDOW_YEARS};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const DAYS_PER_JULIAN_YEAR: Decimal = dec!(365.25);

/// Taper relief band by whole years elapsed since the gift
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum ReliefBand {
    /// Less than 3 years
    NoRelief,
    Relief20,
    Relief40,
    Relief60,
    Relief80,
    /// 7 years or more: the PET has become exempt
    Exempt,
}

impl ReliefBand {
    pub fn from_whole_years(years: u32) -> ReliefBand {
        match years {
            0..=2 => ReliefBand::NoRelief,
            3 => ReliefBand::Relief20,
            4 => ReliefBand::Relief40,
            5 => ReliefBand::Relief60,
            6 => ReliefBand::Relief80,
            _ => ReliefBand::Exempt,
        }
    }

    /// Share of the tax on the PET that is relieved
    pub fn relief_fraction(&self) -> Decimal {
        match self {
            ReliefBand::NoRelief => dec!(0),
            ReliefBand::Relief20 => dec!(0.20),
            ReliefBand::Relief40 => dec!(0.40),
            ReliefBand::Relief60 => dec!(0.60),
            ReliefBand::Relief80 => dec!(0.80),
            ReliefBand::Exempt => dec!(1),
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            ReliefBand::NoRelief => "No relief",
            ReliefBand::Relief20 => "20% relief",
            ReliefBand::Relief40 => "40% relief",
            ReliefBand::Relief60 => "60% relief",
            ReliefBand::Relief80 => "80% relief",
            ReliefBand::Exempt => "Exempt",
        }
    }
}

impl std::fmt::Display for ReliefBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaperPosition {
    #[schemars(with = "String")]
    pub gift_date: NaiveDate,
    #[schemars(with = "String")]
    pub as_of: NaiveDate,
    /// Julian years (days / 365.25), for display
    #[schemars(with = "f64")]
    pub years_elapsed: Decimal,
    /// Gift anniversaries passed; drives the relief band
    pub whole_years: u32,
    #[schemars(with = "f64")]
    pub years_remaining: Decimal,
    #[schemars(with = "f64")]
    pub relief_fraction: Decimal,
    pub band: ReliefBand,
    /// Seventh anniversary, from which the gift is outside the window
    #[schemars(with = "Option<String>")]
    pub exempt_from: Option<NaiveDate>,
}

impl TaperPosition {
    /// Still inside the 7-year window
    pub fn in_window(&self) -> bool {
        self.band != ReliefBand::Exempt
    }

    /// Tax on a taxable PET amount if the donor died on the as-of date
    pub fn potential_iht(&self, taxable_amount: Decimal) -> Decimal {
        if !self.in_window() {
            return Decimal::ZERO;
        }
        (taxable_amount * (Decimal::ONE - self.relief_fraction) * IHT_RATE).round_dp(2)
    }
}

/// Classify a gift's position in the PET window as at `as_of`.
///
/// The relief band counts gift anniversaries passed, not `years_elapsed` rounded down, so a
/// gift reaches each band on its anniversary regardless of leap days. `years_elapsed` is
/// reported in Julian years for display.
pub fn classify(gift_date: NaiveDate, as_of: NaiveDate) -> TaperPosition {
    let days = (as_of - gift_date).num_days().max(0);
    let years_elapsed = (Decimal::from(days) / DAYS_PER_JULIAN_YEAR).round_dp(4);
    let whole_years = whole_years_between(gift_date, as_of);
    let band = ReliefBand::from_whole_years(whole_years);
    let years_remaining = if band == ReliefBand::Exempt {
        Decimal::ZERO
    } else {
        (Decimal::from(PET_WINDOW_YEARS) - years_elapsed).max(Decimal::ZERO)
    };

    TaperPosition {
        gift_date,
        as_of,
        years_elapsed,
        whole_years,
        years_remaining,
        relief_fraction: band.relief_fraction(),
        band,
        exempt_from: anniversary(gift_date, PET_WINDOW_YEARS),
    }
}

/// Anniversary `years` after `date`. A 29 February gift has its anniversary on 28 February.
pub fn anniversary(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(years * 12))
}

fn whole_years_between(from: NaiveDate, to: NaiveDate) -> u32 {
    if to <= from {
        return 0;
    }
    let mut years = u32::try_from(to.year() - from.year()).unwrap_or(0);
    while years > 0 && anniversary(from, years).map_or(true, |d| d > to) {
        years -= 1;
    }
    years
}
