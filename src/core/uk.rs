use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Annual exemption per tax year
pub const ANNUAL_EXEMPTION: Decimal = dec!(3000);
/// Small gifts exemption limit per recipient per tax year
pub const SMALL_GIFTS_LIMIT: Decimal = dec!(250);
/// Wedding gift cap from a parent
pub const WEDDING_CAP_CHILD: Decimal = dec!(5000);
/// Wedding gift cap from a grandparent
pub const WEDDING_CAP_GRANDCHILD: Decimal = dec!(2500);
/// Wedding gift cap from anyone else
pub const WEDDING_CAP_OTHER: Decimal = dec!(1000);

/// Standard nil-rate band
pub const NIL_RATE_BAND: Decimal = dec!(325000);
/// Residence nil-rate band before taper
pub const RESIDENCE_NIL_RATE_BAND: Decimal = dec!(175000);
/// Estate value above which the residence nil-rate band is withdrawn £1 for every £2
pub const RNRB_TAPER_THRESHOLD: Decimal = dec!(2000000);

/// IHT death rate
pub const IHT_RATE: Decimal = dec!(0.40);
/// Reduced rate when enough of the estate is left to charity
pub const IHT_CHARITY_RATE: Decimal = dec!(0.36);
/// Charitable percentage of the baseline estate needed for the reduced rate
pub const CHARITY_RATE_THRESHOLD_PCT: Decimal = dec!(10);

/// Years a donor must survive for a PET to become exempt
pub const PET_WINDOW_YEARS: u32 = 7;

/// UK Tax Year (runs 6 April to 5 April)
/// The year value represents the end year (e.g., 2025 = 2024/25 tax year)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Tax year containing a date
    pub fn from_date(date: NaiveDate) -> Self {
        // 6 April or later falls in the tax year ending next April
        if (date.month(), date.day()) >= (4, 6) {
            TaxYear(date.year() + 1)
        } else {
            TaxYear(date.year())
        }
    }

    /// Start date of the tax year (6 April of previous year)
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0 - 1, 4, 6)
    }

    /// End date of the tax year (5 April)
    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 4, 5)
    }

    pub fn next(&self) -> TaxYear {
        TaxYear(self.0 + 1)
    }

    /// Display as "2024/25" format
    pub fn display(&self) -> String {
        format!("{}/{:02}", self.0 - 1, self.0.rem_euclid(100))
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
