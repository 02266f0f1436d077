use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Claims the allocator ignored or reduced. Never an error: the allocation still stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Spouse and charity gifts are wholly exempt; other claims have no effect.
    ClaimsIgnoredForExemptRecipient,
    /// Small gifts exemption claimed on a gift over the limit.
    SmallGiftsOverLimit {
        #[schemars(with = "f64")]
        value: Decimal,
    },
    /// Earlier small gifts to the same recipient this tax year already used the limit.
    SmallGiftsRecipientLimit {
        #[schemars(with = "f64")]
        given_this_year: Decimal,
    },
    /// Wedding claim above the cap for this relationship.
    WeddingClaimCapped {
        #[schemars(with = "f64")]
        claimed: Decimal,
        #[schemars(with = "f64")]
        cap: Decimal,
    },
    /// Carry-forward requested but nothing was left to bring forward.
    NoCarryForwardAvailable,
    /// Normal expenditure out of income needs documentary evidence of surplus income.
    EvidenceRequired,
}

impl Warning {
    pub fn name(&self) -> &'static str {
        match self {
            Warning::ClaimsIgnoredForExemptRecipient => "ClaimsIgnored",
            Warning::SmallGiftsOverLimit { .. } => "SmallGiftsOverLimit",
            Warning::SmallGiftsRecipientLimit { .. } => "SmallGiftsRecipientLimit",
            Warning::WeddingClaimCapped { .. } => "WeddingClaimCapped",
            Warning::NoCarryForwardAvailable => "NoCarryForward",
            Warning::EvidenceRequired => "EvidenceRequired",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Warning::ClaimsIgnoredForExemptRecipient => {
                "Gift is wholly exempt by recipient; other claimed exemptions were not applied"
                    .to_string()
            }
            Warning::SmallGiftsOverLimit { value } => format!(
                "Small gifts exemption only covers gifts up to \u{00A3}250 - gift of \u{00A3}{:.2} allocated normally",
                value
            ),
            Warning::SmallGiftsRecipientLimit { given_this_year } => format!(
                "Recipient already received \u{00A3}{:.2} of small gifts this tax year - small gifts exemption not applied",
                given_this_year
            ),
            Warning::WeddingClaimCapped { claimed, cap } => format!(
                "Wedding claim of \u{00A3}{:.2} limited to \u{00A3}{:.2} for this relationship",
                claimed, cap
            ),
            Warning::NoCarryForwardAvailable => {
                "No unused annual exemption from last tax year to carry forward".to_string()
            }
            Warning::EvidenceRequired => {
                "Normal expenditure out of income must be evidenced as regular and from surplus income"
                    .to_string()
            }
        }
    }

    /// Purely informational warnings that do not indicate a problem with the input
    pub fn is_advisory(&self) -> bool {
        matches!(self, Warning::EvidenceRequired)
    }
}
