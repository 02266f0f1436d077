use super::estate::{transferable_nrb_from_percentage, EstateError, EstateSnapshot};
use super::gift::{
    AnnualClaim, ExemptionClaims, Gift, GiftError, GiftType, Relationship, StandardClaims,
};
use chrono::{NaiveDate, NaiveDateTime};
use ihtc_derive::CsvSchema;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Column description generated by `#[derive(CsvSchema)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// JSON input root for a gift book
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GiftBookInput {
    /// Annual exemption used in the tax year before the first gift
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub prior_year_annual_used: Option<Decimal>,
    pub gifts: Vec<GiftRecord>,
}

/// One gift as it appears in CSV or JSON input
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, CsvSchema)]
pub struct GiftRecord {
    /// Unique identifier for the gift
    pub id: String,
    /// Date of the gift (YYYY-MM-DD or DD/MM/YYYY)
    pub date: String,
    /// Name of the recipient
    pub recipient: String,
    /// SPOUSE, CHILD, GRANDCHILD, PARENT, SIBLING, FRIEND, CHARITY, TRUST or OTHER
    pub relationship: String,
    /// CASH, PROPERTY, SHARES or OTHER_ASSET (default CASH)
    #[serde(default)]
    pub gift_type: Option<String>,
    /// Value in GBP at the date of the gift
    #[schemars(with = "f64")]
    pub value: Decimal,
    /// Currency of the value; only GBP is accepted (default GBP)
    #[serde(default)]
    pub currency: Option<String>,
    /// Apply the current year's annual exemption (default true)
    #[serde(default = "default_true")]
    pub annual_exemption: bool,
    /// Also use last year's unused annual exemption
    #[serde(default)]
    pub carry_forward: bool,
    /// Claim the small gifts exemption (cannot be combined with other claims)
    #[serde(default)]
    pub small_gifts: bool,
    /// Amount claimed under the wedding exemption
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub wedding_amount: Option<Decimal>,
    /// Claim normal expenditure out of income for the remainder
    #[serde(default)]
    pub normal_expenditure: bool,
    /// Free text
    #[serde(default)]
    pub description: Option<String>,
}

fn default_true() -> bool {
    true
}

impl GiftRecord {
    fn claims(&self) -> Result<ExemptionClaims, GiftError> {
        if self.small_gifts {
            if self.carry_forward || self.wedding_amount.is_some() || self.normal_expenditure {
                return Err(GiftError::ConflictingClaims {
                    id: self.id.clone(),
                });
            }
            return Ok(ExemptionClaims::SmallGifts);
        }
        let annual = match (self.annual_exemption, self.carry_forward) {
            (_, true) => AnnualClaim::WithCarryForward,
            (true, false) => AnnualClaim::CurrentYear,
            (false, false) => AnnualClaim::Declined,
        };
        Ok(ExemptionClaims::Standard(StandardClaims {
            annual,
            wedding: self.wedding_amount,
            normal_expenditure: self.normal_expenditure,
        }))
    }
}

impl TryFrom<GiftRecord> for Gift {
    type Error = GiftError;

    fn try_from(record: GiftRecord) -> Result<Self, Self::Error> {
        let date = parse_date(&record.date).ok_or_else(|| GiftError::InvalidDate {
            id: record.id.clone(),
            date: record.date.clone(),
        })?;
        let claims = record.claims()?;
        let gift_type = match &record.gift_type {
            Some(s) if !s.trim().is_empty() => GiftType::from_str(s)?,
            _ => GiftType::default(),
        };

        Ok(Gift {
            date,
            relationship: Relationship::from_str(&record.relationship)?,
            gift_type,
            value: record.value,
            currency: record
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "GBP".to_string()),
            claims,
            description: record.description.filter(|d| !d.is_empty()),
            id: record.id,
            recipient: record.recipient,
        })
    }
}

/// Parse a date that may be ISO, UK day-first, or an ISO datetime
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    None
}

/// Gifts and the prior-year annual exemption usage read from a file
#[derive(Debug, Clone)]
pub struct GiftBook {
    pub gifts: Vec<Gift>,
    pub prior_year_annual_used: Option<Decimal>,
}

fn into_gifts(records: Vec<GiftRecord>) -> anyhow::Result<Vec<Gift>> {
    let mut gifts = records
        .into_iter()
        .map(Gift::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    gifts.sort_by_key(|g| g.date);
    log::info!("Read {} gift records", gifts.len());
    Ok(gifts)
}

/// Read gifts from CSV
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<GiftBook> {
    let mut rdr = csv::Reader::from_reader(reader);
    let records = rdr
        .deserialize::<GiftRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(GiftBook {
        gifts: into_gifts(records)?,
        prior_year_annual_used: None,
    })
}

/// Read gifts from JSON
pub fn read_json<R: Read>(reader: R) -> anyhow::Result<GiftBook> {
    let input: GiftBookInput = serde_json::from_reader(reader)?;
    Ok(GiftBook {
        gifts: into_gifts(input.gifts)?,
        prior_year_annual_used: input.prior_year_annual_used,
    })
}

/// A named asset or liability
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EstateItem {
    pub name: String,
    #[schemars(with = "f64")]
    pub value: Decimal,
}

/// Estate JSON input. `net_estate` overrides the itemised assets and liabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EstateInput {
    #[serde(default)]
    pub assets: Vec<EstateItem>,
    #[serde(default)]
    pub liabilities: Vec<EstateItem>,
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub net_estate: Option<Decimal>,
    /// Inherited nil-rate band as an amount
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub transferable_nrb: Option<Decimal>,
    /// Inherited nil-rate band as a percentage of the standard band
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub transferable_nrb_percentage: Option<Decimal>,
    #[serde(default)]
    pub rnrb_eligible: bool,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub charitable_gift_percentage: Decimal,
}

impl EstateInput {
    pub fn total_assets(&self) -> Decimal {
        self.assets.iter().map(|a| a.value).sum()
    }

    pub fn total_liabilities(&self) -> Decimal {
        self.liabilities.iter().map(|l| l.value).sum()
    }

    pub fn to_snapshot(&self) -> Result<EstateSnapshot, EstateError> {
        for (kind, items) in [("asset", &self.assets), ("liability", &self.liabilities)] {
            if let Some(item) = items.iter().find(|i| i.value < Decimal::ZERO) {
                return Err(EstateError::NegativeValue {
                    field: format!("{} '{}'", kind, item.name),
                    value: item.value,
                });
            }
        }
        let transferable_nrb = match (self.transferable_nrb, self.transferable_nrb_percentage) {
            (Some(_), Some(_)) => return Err(EstateError::ConflictingTransferableNrb),
            (Some(amount), None) => amount,
            (None, Some(pct)) => transferable_nrb_from_percentage(pct)?,
            (None, None) => Decimal::ZERO,
        };
        let snapshot = EstateSnapshot {
            net_estate: self
                .net_estate
                .unwrap_or_else(|| self.total_assets() - self.total_liabilities()),
            transferable_nrb,
            rnrb_eligible: self.rnrb_eligible,
            charitable_gift_percentage: self.charitable_gift_percentage,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

/// Read an estate from JSON
pub fn read_estate_json<R: Read>(reader: R) -> anyhow::Result<EstateSnapshot> {
    let input: EstateInput = serde_json::from_reader(reader)?;
    log::info!(
        "Read estate with {} assets and {} liabilities",
        input.assets.len(),
        input.liabilities.len()
    );
    Ok(input.to_snapshot()?)
}
