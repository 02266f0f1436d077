//! Annual exemption balance with one year of carry-forward

use super::exemption::{ExemptionAllocation, ExemptionType};
use super::uk::{TaxYear, ANNUAL_EXEMPTION};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Annual exemption usage within one tax year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnnualExemptionState {
    pub tax_year: TaxYear,
    /// Current-year allowance already used
    #[schemars(with = "f64")]
    pub used: Decimal,
    /// Unused allowance brought forward from the immediately preceding year, still available
    #[schemars(with = "f64")]
    pub carry_forward: Decimal,
}

impl AnnualExemptionState {
    /// Fresh year with nothing brought forward
    pub fn new(tax_year: TaxYear) -> Self {
        AnnualExemptionState {
            tax_year,
            used: Decimal::ZERO,
            carry_forward: Decimal::ZERO,
        }
    }

    /// Opening state for `tax_year` given how much of last year's allowance was used
    pub fn with_prior_year_used(tax_year: TaxYear, prior_used: Decimal) -> Self {
        let prior_used = prior_used.clamp(Decimal::ZERO, ANNUAL_EXEMPTION);
        AnnualExemptionState {
            tax_year,
            used: Decimal::ZERO,
            carry_forward: ANNUAL_EXEMPTION - prior_used,
        }
    }

    /// Current-year allowance still unused
    pub fn remaining_current(&self) -> Decimal {
        (ANNUAL_EXEMPTION - self.used).max(Decimal::ZERO)
    }

    /// Total the next gift this year can draw on
    pub fn available(&self) -> Decimal {
        self.remaining_current() + self.carry_forward.max(Decimal::ZERO)
    }

    /// Move to the next tax year. Only this year's unused allowance is brought forward;
    /// anything still left from the previous carry-forward lapses.
    pub fn advance_year(&self) -> Self {
        let next = AnnualExemptionState {
            tax_year: self.tax_year.next(),
            used: Decimal::ZERO,
            carry_forward: self.remaining_current(),
        };
        log::debug!(
            "Annual exemption {} -> {}: carry forward {}, lapsed {}",
            self.tax_year,
            next.tax_year,
            next.carry_forward,
            self.carry_forward
        );
        next
    }

    /// Advance year by year until `tax_year`. Earlier years leave the state unchanged.
    pub fn advance_to(&self, tax_year: TaxYear) -> Self {
        let mut state = *self;
        while state.tax_year < tax_year {
            state = state.advance_year();
        }
        state
    }

    /// Consume the annual exemption lines of an allocation made in this tax year
    pub fn record(&self, allocation: &ExemptionAllocation) -> Self {
        let current = allocation.amount_for(ExemptionType::AnnualCurrentYear);
        let brought_forward = allocation.amount_for(ExemptionType::AnnualCarryForward);
        AnnualExemptionState {
            tax_year: self.tax_year,
            used: (self.used + current).min(ANNUAL_EXEMPTION),
            carry_forward: (self.carry_forward - brought_forward).max(Decimal::ZERO),
        }
    }
}
