use super::uk::{TaxYear, SMALL_GIFTS_LIMIT};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GiftError {
    #[error("gift value must be positive: {id} ({value})")]
    NonPositiveValue { id: String, value: Decimal },
    #[error("gift is dated in the future: {id} ({date} is after {as_of})")]
    FutureDated {
        id: String,
        date: NaiveDate,
        as_of: NaiveDate,
    },
    #[error("wedding claim must not be negative: {id} ({amount})")]
    NegativeWeddingClaim { id: String, amount: Decimal },
    #[error("gift must be valued in GBP: {id} ({currency})")]
    UnsupportedCurrency { id: String, currency: String },
    #[error("small gifts exemption cannot be combined with other claims: {id}")]
    ConflictingClaims { id: String },
    #[error("invalid date '{date}': {id}")]
    InvalidDate { id: String, date: String },
    #[error("unknown recipient relationship: {0}")]
    UnknownRelationship(String),
    #[error("unknown gift type: {0}")]
    UnknownGiftType(String),
}

/// Relationship of the recipient to the donor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relationship {
    Spouse,
    Child,
    Grandchild,
    Parent,
    Sibling,
    Friend,
    Charity,
    Trust,
    Other,
}

impl Relationship {
    pub fn from_str(s: &str) -> Result<Relationship, GiftError> {
        match s.trim().to_uppercase().as_str() {
            "SPOUSE" => Ok(Relationship::Spouse),
            "CHILD" => Ok(Relationship::Child),
            "GRANDCHILD" => Ok(Relationship::Grandchild),
            "PARENT" => Ok(Relationship::Parent),
            "SIBLING" => Ok(Relationship::Sibling),
            "FRIEND" => Ok(Relationship::Friend),
            "CHARITY" => Ok(Relationship::Charity),
            "TRUST" => Ok(Relationship::Trust),
            "OTHER" => Ok(Relationship::Other),
            _ => Err(GiftError::UnknownRelationship(s.to_string())),
        }
    }

    /// Spouse and charity gifts are exempt without limit
    pub fn is_exempt_recipient(self) -> bool {
        matches!(self, Relationship::Spouse | Relationship::Charity)
    }

    pub fn display(&self) -> &'static str {
        match self {
            Relationship::Spouse => "Spouse",
            Relationship::Child => "Child",
            Relationship::Grandchild => "Grandchild",
            Relationship::Parent => "Parent",
            Relationship::Sibling => "Sibling",
            Relationship::Friend => "Friend",
            Relationship::Charity => "Charity",
            Relationship::Trust => "Trust",
            Relationship::Other => "Other",
        }
    }
}

/// What was given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GiftType {
    #[default]
    Cash,
    Property,
    Shares,
    OtherAsset,
}

impl GiftType {
    pub fn from_str(s: &str) -> Result<GiftType, GiftError> {
        match s.trim().to_uppercase().as_str() {
            "CASH" => Ok(GiftType::Cash),
            "PROPERTY" => Ok(GiftType::Property),
            "SHARES" => Ok(GiftType::Shares),
            "OTHER_ASSET" | "OTHER" => Ok(GiftType::OtherAsset),
            _ => Err(GiftError::UnknownGiftType(s.to_string())),
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            GiftType::Cash => "Cash",
            GiftType::Property => "Property",
            GiftType::Shares => "Shares",
            GiftType::OtherAsset => "Other asset",
        }
    }
}

/// How much of the annual exemption a gift claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum AnnualClaim {
    /// Annual exemption not applied to this gift
    Declined,
    /// Current tax year's allowance only
    #[default]
    CurrentYear,
    /// Current year first, then the unused allowance brought forward from last year
    WithCarryForward,
}

/// Claims that can be combined on one gift
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct StandardClaims {
    pub annual: AnnualClaim,
    /// Amount claimed under the wedding/civil partnership exemption
    #[schemars(with = "Option<f64>")]
    pub wedding: Option<Decimal>,
    /// Regular gift out of surplus income
    pub normal_expenditure: bool,
}

/// Exemptions requested against a gift.
///
/// Small gifts cannot be combined with any other exemption on the same gift, so
/// it carries no further claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum ExemptionClaims {
    SmallGifts,
    Standard(StandardClaims),
}

impl Default for ExemptionClaims {
    fn default() -> Self {
        ExemptionClaims::Standard(StandardClaims::default())
    }
}

impl ExemptionClaims {
    /// True when anything beyond the default current-year annual exemption was requested
    pub fn is_explicit(&self) -> bool {
        *self != ExemptionClaims::default()
    }
}

/// A lifetime transfer of value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Gift {
    pub id: String,
    #[schemars(with = "String")]
    pub date: NaiveDate,
    pub recipient: String,
    pub relationship: Relationship,
    pub gift_type: GiftType,
    #[schemars(with = "f64")]
    pub value: Decimal,
    pub currency: String,
    #[serde(default)]
    pub claims: ExemptionClaims,
    #[serde(default)]
    pub description: Option<String>,
}

impl Gift {
    pub fn tax_year(&self) -> TaxYear {
        TaxYear::from_date(self.date)
    }

    /// A gift is a small gift candidate only when claimed and within the limit
    pub fn qualifies_as_small_gift(&self) -> bool {
        self.claims == ExemptionClaims::SmallGifts && self.value <= SMALL_GIFTS_LIMIT
    }

    /// Reject input the calculators cannot take. Conflicting claims are not errors.
    pub fn validate(&self, as_of: NaiveDate) -> Result<(), GiftError> {
        if self.value <= Decimal::ZERO {
            return Err(GiftError::NonPositiveValue {
                id: self.id.clone(),
                value: self.value,
            });
        }
        if self.date > as_of {
            return Err(GiftError::FutureDated {
                id: self.id.clone(),
                date: self.date,
                as_of,
            });
        }
        if !self.currency.eq_ignore_ascii_case("GBP") {
            return Err(GiftError::UnsupportedCurrency {
                id: self.id.clone(),
                currency: self.currency.clone(),
            });
        }
        if let ExemptionClaims::Standard(StandardClaims {
            wedding: Some(amount),
            ..
        }) = &self.claims
        {
            if *amount < Decimal::ZERO {
                return Err(GiftError::NegativeWeddingClaim {
                    id: self.id.clone(),
                    amount: *amount,
                });
            }
        }
        Ok(())
    }
}
