//! Portfolio view over all of a donor's lifetime gifts

use super::annual::AnnualExemptionState;
use super::estate::{FailedPet, GiftExposure, PetTreatment};
use super::exemption::{allocate, ExemptionAllocation, ExemptionType};
use super::gift::{ExemptionClaims, Gift};
use super::taper::{classify, TaperPosition};
use super::uk::{TaxYear, SMALL_GIFTS_LIMIT};
use super::warnings::Warning;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A gift with its allocation and taper position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessedGift {
    pub gift: Gift,
    pub allocation: ExemptionAllocation,
    pub taper: TaperPosition,
}

impl ProcessedGift {
    pub fn taxable_amount(&self) -> Decimal {
        self.allocation.taxable_amount
    }

    /// Taxable PET still inside the 7-year window
    pub fn is_active_pet(&self) -> bool {
        self.taxable_amount() > Decimal::ZERO && self.taper.in_window()
    }

    pub fn potential_iht(&self) -> Decimal {
        self.taper.potential_iht(self.taxable_amount())
    }

    /// The same gift with its taper position moved to `as_of`
    pub fn at(&self, as_of: NaiveDate) -> ProcessedGift {
        ProcessedGift {
            taper: classify(self.gift.date, as_of),
            ..self.clone()
        }
    }

    fn failed_pet(&self) -> FailedPet {
        FailedPet {
            gift_id: self.gift.id.clone(),
            gift_date: self.gift.date,
            taxable_amount: self.taxable_amount(),
            relief_fraction: self.taper.relief_fraction,
        }
    }
}

/// Allocate every gift in date order, carrying the annual exemption across tax years.
///
/// `opening` is the annual exemption state at or before the first gift's tax year. Without
/// it nothing is assumed to be carried forward into the first year.
pub fn process_gifts(
    gifts: &[Gift],
    opening: Option<AnnualExemptionState>,
    as_of: NaiveDate,
) -> Vec<ProcessedGift> {
    let mut sorted: Vec<&Gift> = gifts.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let Some(first) = sorted.first() else {
        return Vec::new();
    };
    let first_year = first.tax_year();
    let mut state = match opening {
        Some(opening) if opening.tax_year <= first_year => opening.advance_to(first_year),
        Some(opening) => {
            log::warn!(
                "Opening annual exemption for {} is after the first gift ({}), ignored",
                opening.tax_year,
                first_year
            );
            AnnualExemptionState::new(first_year)
        }
        None => AnnualExemptionState::new(first_year),
    };

    // small gifts given per (tax year, recipient)
    let mut small_gifts: HashMap<(TaxYear, String), Decimal> = HashMap::new();
    let mut processed = Vec::with_capacity(sorted.len());

    for gift in sorted {
        debug_assert!(gift.value > Decimal::ZERO, "gift {} not validated", gift.id);
        state = state.advance_to(gift.tax_year());

        let mut warnings = Vec::new();
        let mut effective = gift.clone();
        if gift.qualifies_as_small_gift() && !gift.relationship.is_exempt_recipient() {
            let key = (gift.tax_year(), gift.recipient.trim().to_lowercase());
            let given = small_gifts.entry(key).or_insert(Decimal::ZERO);
            if *given + gift.value > SMALL_GIFTS_LIMIT {
                log::warn!(
                    "Gift {}: {} already received {} of small gifts in {}",
                    gift.id,
                    gift.recipient,
                    given,
                    gift.tax_year()
                );
                warnings.push(Warning::SmallGiftsRecipientLimit {
                    given_this_year: *given,
                });
                effective.claims = ExemptionClaims::default();
            } else {
                *given += gift.value;
            }
        }

        let mut allocation = allocate(&effective, &state);
        warnings.append(&mut allocation.warnings);
        allocation.warnings = warnings;
        state = state.record(&allocation);

        processed.push(ProcessedGift {
            gift: gift.clone(),
            allocation,
            taper: classify(gift.date, as_of),
        });
    }

    log::info!("Processed {} gifts", processed.len());
    processed
}

/// Totals for one tax year of giving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxYearTotals {
    pub tax_year: TaxYear,
    pub gift_count: usize,
    #[schemars(with = "f64")]
    pub total_value: Decimal,
    #[schemars(with = "f64")]
    pub total_exempt: Decimal,
    #[schemars(with = "f64")]
    pub total_taxable: Decimal,
    /// Current-year and carried-forward annual exemption used
    #[schemars(with = "f64")]
    pub annual_exemption_used: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GiftBookSummary {
    #[schemars(with = "String")]
    pub as_of: NaiveDate,
    pub gift_count: usize,
    /// Value of all gifts inside the 7-year window, exempt or not
    #[schemars(with = "f64")]
    pub total_gifts_last_7_years: Decimal,
    pub active_pet_count: usize,
    /// Taxable PET amounts inside the window, before taper relief
    #[schemars(with = "f64")]
    pub chargeable_pets_last_7_years: Decimal,
    #[schemars(with = "f64")]
    pub potential_iht_if_death_today: Decimal,
    #[schemars(with = "f64")]
    pub total_exempt: Decimal,
    pub years: Vec<TaxYearTotals>,
    /// Active PETs that would fail on death at `as_of`
    pub failed_pets: Vec<FailedPet>,
}

impl GiftBookSummary {
    /// Failed-PET exposure to feed the estate calculation
    pub fn exposure(&self, treatment: PetTreatment) -> GiftExposure {
        GiftExposure {
            pets: self.failed_pets.clone(),
            treatment,
        }
    }
}

/// Portfolio figures as at `as_of`. Taper positions are recomputed for `as_of`.
pub fn summarize(processed: &[ProcessedGift], as_of: NaiveDate) -> GiftBookSummary {
    let mut total_gifts_last_7_years = Decimal::ZERO;
    let mut failed_pets = Vec::new();
    let mut chargeable_pets = Decimal::ZERO;
    let mut potential_iht = Decimal::ZERO;
    let mut total_exempt = Decimal::ZERO;
    let mut years: BTreeMap<TaxYear, TaxYearTotals> = BTreeMap::new();

    for p in processed.iter().map(|p| p.at(as_of)) {
        let taxable = p.taxable_amount();
        let exempt = p.allocation.total_exempt();

        if p.taper.in_window() {
            total_gifts_last_7_years += p.gift.value;
        }
        if p.is_active_pet() {
            chargeable_pets += taxable;
            potential_iht += p.potential_iht();
            failed_pets.push(p.failed_pet());
        }
        total_exempt += exempt;

        let tax_year = p.gift.tax_year();
        let totals = years.entry(tax_year).or_insert_with(|| TaxYearTotals {
            tax_year,
            gift_count: 0,
            total_value: Decimal::ZERO,
            total_exempt: Decimal::ZERO,
            total_taxable: Decimal::ZERO,
            annual_exemption_used: Decimal::ZERO,
        });
        totals.gift_count += 1;
        totals.total_value += p.gift.value;
        totals.total_exempt += exempt;
        totals.total_taxable += taxable;
        totals.annual_exemption_used += p.allocation.amount_for(ExemptionType::AnnualCurrentYear)
            + p.allocation.amount_for(ExemptionType::AnnualCarryForward);
    }

    log::debug!(
        "Gift book as at {}: {} active PETs, potential IHT {}",
        as_of,
        failed_pets.len(),
        potential_iht
    );

    GiftBookSummary {
        as_of,
        gift_count: processed.len(),
        total_gifts_last_7_years,
        active_pet_count: failed_pets.len(),
        chargeable_pets_last_7_years: chargeable_pets,
        potential_iht_if_death_today: potential_iht,
        total_exempt,
        years: years.into_values().collect(),
        failed_pets,
    }
}
