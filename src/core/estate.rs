//! Estate IHT liability after nil-rate bands

use super::uk::{
    CHARITY_RATE_THRESHOLD_PCT, IHT_CHARITY_RATE, IHT_RATE, NIL_RATE_BAND,
    RESIDENCE_NIL_RATE_BAND, RNRB_TAPER_THRESHOLD,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EstateError {
    #[error("charitable gift percentage must be between 0 and 100: {0}")]
    CharitablePercentageOutOfRange(Decimal),
    #[error("transferable nil-rate band must be between 0 and 325000: {0}")]
    TransferableNrbOutOfRange(Decimal),
    #[error("transferable nil-rate band percentage must be between 0 and 100: {0}")]
    TransferablePercentageOutOfRange(Decimal),
    #[error("{field} must not be negative: {value}")]
    NegativeValue { field: String, value: Decimal },
    #[error("give the transferable nil-rate band as an amount or a percentage, not both")]
    ConflictingTransferableNrb,
}

/// How PETs that fail within 7 years of death interact with the estate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum PetTreatment {
    /// Gift and estate exposure are reported in parallel; gifts leave the NRB untouched
    #[default]
    Separate,
    /// Failed PETs use up the nil-rate band before the estate does
    ConsumeNilRateBand,
}

/// A taxable PET still inside the 7-year window at the date of death
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FailedPet {
    pub gift_id: String,
    #[schemars(with = "String")]
    pub gift_date: NaiveDate,
    #[schemars(with = "f64")]
    pub taxable_amount: Decimal,
    /// Taper relief at the date of death
    #[schemars(with = "f64")]
    pub relief_fraction: Decimal,
}

impl FailedPet {
    /// Tapered IHT on the part of this PET the nil-rate band does not cover
    pub fn tax_on(&self, uncovered: Decimal) -> Decimal {
        let relief = Decimal::ONE - self.relief_fraction;
        (uncovered.max(Decimal::ZERO) * relief * IHT_RATE).round_dp(2)
    }
}

/// 7-year gift exposure brought into the estate calculation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct GiftExposure {
    pub pets: Vec<FailedPet>,
    pub treatment: PetTreatment,
}

impl GiftExposure {
    /// Taxable PET amounts before taper relief
    pub fn chargeable_pets(&self) -> Decimal {
        self.pets.iter().map(|p| p.taxable_amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EstateSnapshot {
    /// Assets less liabilities
    #[schemars(with = "f64")]
    pub net_estate: Decimal,
    /// Unused nil-rate band inherited from a deceased spouse or civil partner
    #[schemars(with = "f64")]
    pub transferable_nrb: Decimal,
    /// Home passes to direct descendants
    pub rnrb_eligible: bool,
    /// Share of the baseline estate left to charity
    #[schemars(with = "f64")]
    pub charitable_gift_percentage: Decimal,
}

impl EstateSnapshot {
    pub fn validate(&self) -> Result<(), EstateError> {
        if self.transferable_nrb < Decimal::ZERO || self.transferable_nrb > NIL_RATE_BAND {
            return Err(EstateError::TransferableNrbOutOfRange(self.transferable_nrb));
        }
        if self.charitable_gift_percentage < Decimal::ZERO
            || self.charitable_gift_percentage > dec!(100)
        {
            return Err(EstateError::CharitablePercentageOutOfRange(
                self.charitable_gift_percentage,
            ));
        }
        Ok(())
    }
}

/// Transferable NRB claimed as a percentage of the deceased spouse's unused band
pub fn transferable_nrb_from_percentage(percentage: Decimal) -> Result<Decimal, EstateError> {
    if percentage < Decimal::ZERO || percentage > dec!(100) {
        return Err(EstateError::TransferablePercentageOutOfRange(percentage));
    }
    Ok((NIL_RATE_BAND * percentage / dec!(100)).round_dp(2))
}

/// Residence nil-rate band after the £1 for £2 taper above £2m
pub fn residence_nil_rate_band(net_estate: Decimal, eligible: bool) -> Decimal {
    if !eligible {
        return Decimal::ZERO;
    }
    let excess = (net_estate - RNRB_TAPER_THRESHOLD).max(Decimal::ZERO);
    (RESIDENCE_NIL_RATE_BAND - excess / dec!(2)).max(Decimal::ZERO)
}

/// Death rate for the estate
pub fn estate_rate(charitable_gift_percentage: Decimal) -> Decimal {
    if charitable_gift_percentage >= CHARITY_RATE_THRESHOLD_PCT {
        IHT_CHARITY_RATE
    } else {
        IHT_RATE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EstateLiability {
    #[schemars(with = "f64")]
    pub net_estate: Decimal,
    /// Own NRB plus transferable NRB
    #[schemars(with = "f64")]
    pub total_nrb: Decimal,
    /// NRB taken by failed PETs (zero when exposures are kept separate)
    #[schemars(with = "f64")]
    pub nrb_used_by_gifts: Decimal,
    #[schemars(with = "f64")]
    pub available_nrb: Decimal,
    #[schemars(with = "f64")]
    pub total_rnrb: Decimal,
    #[schemars(with = "f64")]
    pub chargeable_estate: Decimal,
    #[schemars(with = "f64")]
    pub rate: Decimal,
    #[schemars(with = "f64")]
    pub net_tax_liability: Decimal,
    /// Tapered IHT on failed PETs, after any nil-rate band they were given
    #[schemars(with = "f64")]
    pub gift_tax_after_nrb: Decimal,
    /// Estate IHT plus gift IHT
    #[schemars(with = "f64")]
    pub total_tax_liability: Decimal,
    pub treatment: PetTreatment,
}

/// IHT on the estate if death occurred today
pub fn compute(estate: &EstateSnapshot, exposure: &GiftExposure) -> EstateLiability {
    let transferable = estate.transferable_nrb.clamp(Decimal::ZERO, NIL_RATE_BAND);
    let total_nrb = NIL_RATE_BAND + transferable;
    let (nrb_used_by_gifts, gift_tax_after_nrb) = charge_failed_pets(exposure, total_nrb);
    let available_nrb = total_nrb - nrb_used_by_gifts;
    let total_rnrb = residence_nil_rate_band(estate.net_estate, estate.rnrb_eligible);
    let chargeable_estate = (estate.net_estate - available_nrb - total_rnrb).max(Decimal::ZERO);
    let rate = estate_rate(estate.charitable_gift_percentage);
    let net_tax_liability = (chargeable_estate * rate).round_dp(2);

    log::debug!(
        "Estate {}: NRB {} (gifts used {}), RNRB {}, chargeable {} @ {}",
        estate.net_estate,
        total_nrb,
        nrb_used_by_gifts,
        total_rnrb,
        chargeable_estate,
        rate
    );

    EstateLiability {
        net_estate: estate.net_estate,
        total_nrb,
        nrb_used_by_gifts,
        available_nrb,
        total_rnrb,
        chargeable_estate,
        rate,
        net_tax_liability,
        gift_tax_after_nrb,
        total_tax_liability: net_tax_liability + gift_tax_after_nrb,
        treatment: exposure.treatment,
    }
}

/// Nil-rate band taken by failed PETs, oldest first, and the tax left on them.
/// Kept separate, the PETs get no nil-rate band and are taxed in full.
fn charge_failed_pets(exposure: &GiftExposure, total_nrb: Decimal) -> (Decimal, Decimal) {
    let mut pets: Vec<&FailedPet> = exposure.pets.iter().collect();
    pets.sort_by(|a, b| {
        a.gift_date
            .cmp(&b.gift_date)
            .then_with(|| a.gift_id.cmp(&b.gift_id))
    });

    let mut nrb_left = match exposure.treatment {
        PetTreatment::Separate => Decimal::ZERO,
        PetTreatment::ConsumeNilRateBand => total_nrb,
    };
    let mut nrb_used = Decimal::ZERO;
    let mut tax = Decimal::ZERO;
    for pet in pets {
        let taxable = pet.taxable_amount.max(Decimal::ZERO);
        let covered = taxable.min(nrb_left);
        nrb_left -= covered;
        nrb_used += covered;
        tax += pet.tax_on(taxable - covered);
        log::debug!(
            "PET {}: {} covered by NRB, {} charged",
            pet.gift_id,
            covered,
            taxable - covered
        );
    }
    (nrb_used, tax)
}
