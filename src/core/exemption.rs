use super::annual::AnnualExemptionState;
use super::gift::{AnnualClaim, ExemptionClaims, Gift, Relationship, StandardClaims};
use super::uk::{WEDDING_CAP_CHILD, WEDDING_CAP_GRANDCHILD, WEDDING_CAP_OTHER};
use super::warnings::Warning;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which exemption covered part of a gift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ExemptionType {
    Spouse,
    Charity,
    SmallGifts,
    AnnualCurrentYear,
    AnnualCarryForward,
    Wedding,
    NormalExpenditure,
}

impl ExemptionType {
    pub fn display(&self) -> &'static str {
        match self {
            ExemptionType::Spouse => "Spouse exemption",
            ExemptionType::Charity => "Charity exemption",
            ExemptionType::SmallGifts => "Small gifts exemption",
            ExemptionType::AnnualCurrentYear => "Annual exemption",
            ExemptionType::AnnualCarryForward => "Annual exemption (carried forward)",
            ExemptionType::Wedding => "Wedding exemption",
            ExemptionType::NormalExpenditure => "Normal expenditure out of income",
        }
    }

    /// Claimed rather than automatic: needs supporting records
    pub fn requires_evidence(&self) -> bool {
        matches!(self, ExemptionType::NormalExpenditure)
    }
}

impl std::fmt::Display for ExemptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// One line of an allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Allocation {
    pub exemption: ExemptionType,
    #[schemars(with = "f64")]
    pub amount: Decimal,
}

/// How a gift's value splits between exemptions and the taxable PET remainder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExemptionAllocation {
    /// In the order the exemptions were applied
    pub allocations: Vec<Allocation>,
    #[schemars(with = "f64")]
    pub taxable_amount: Decimal,
    pub warnings: Vec<Warning>,
}

impl ExemptionAllocation {
    pub fn total_exempt(&self) -> Decimal {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    pub fn amount_for(&self, exemption: ExemptionType) -> Decimal {
        self.allocations
            .iter()
            .filter(|a| a.exemption == exemption)
            .map(|a| a.amount)
            .sum()
    }

    pub fn is_fully_exempt(&self) -> bool {
        self.taxable_amount.is_zero()
    }
}

/// Wedding/civil partnership cap for the recipient's relationship to the donor
pub fn wedding_cap(relationship: Relationship) -> Decimal {
    match relationship {
        Relationship::Child => WEDDING_CAP_CHILD,
        Relationship::Grandchild => WEDDING_CAP_GRANDCHILD,
        _ => WEDDING_CAP_OTHER,
    }
}

/// Split a gift between exemptions in strict priority order:
/// 1. Spouse or charity recipient: wholly exempt, nothing else applies
/// 2. Small gifts (claimed, at most £250): wholly exempt, nothing else applies
/// 3. Annual exemption, current year then carried forward
/// 4. Wedding exemption, capped by relationship
/// 5. Normal expenditure out of income takes whatever is left
///
/// Anything remaining is the taxable PET amount.
pub fn allocate(gift: &Gift, annual: &AnnualExemptionState) -> ExemptionAllocation {
    if gift.relationship.is_exempt_recipient() {
        let exemption = match gift.relationship {
            Relationship::Spouse => ExemptionType::Spouse,
            _ => ExemptionType::Charity,
        };
        let warnings = if gift.claims.is_explicit() {
            vec![Warning::ClaimsIgnoredForExemptRecipient]
        } else {
            Vec::new()
        };
        log::debug!("Gift {} wholly exempt: {}", gift.id, exemption);
        return ExemptionAllocation {
            allocations: vec![Allocation {
                exemption,
                amount: gift.value,
            }],
            taxable_amount: Decimal::ZERO,
            warnings,
        };
    }

    let mut warnings = Vec::new();
    let claims = match &gift.claims {
        ExemptionClaims::SmallGifts if gift.qualifies_as_small_gift() => {
            log::debug!("Gift {} wholly exempt: small gifts", gift.id);
            return ExemptionAllocation {
                allocations: vec![Allocation {
                    exemption: ExemptionType::SmallGifts,
                    amount: gift.value,
                }],
                taxable_amount: Decimal::ZERO,
                warnings,
            };
        }
        ExemptionClaims::SmallGifts => {
            log::warn!(
                "Gift {} claims small gifts exemption on {} - ignored",
                gift.id,
                gift.value
            );
            warnings.push(Warning::SmallGiftsOverLimit { value: gift.value });
            StandardClaims::default()
        }
        ExemptionClaims::Standard(claims) => claims.clone(),
    };

    let mut allocations = Vec::new();
    let mut remaining = gift.value;
    let mut take = |exemption: ExemptionType, limit: Decimal, remaining: &mut Decimal| {
        let amount = (*remaining).min(limit).max(Decimal::ZERO);
        if amount > Decimal::ZERO {
            *remaining -= amount;
            log::debug!(
                "Gift {} {}: {}. Remaining: {}",
                gift.id,
                exemption,
                amount,
                remaining
            );
            allocations.push(Allocation { exemption, amount });
        }
    };

    if claims.annual != AnnualClaim::Declined {
        take(
            ExemptionType::AnnualCurrentYear,
            annual.remaining_current(),
            &mut remaining,
        );
        if claims.annual == AnnualClaim::WithCarryForward && remaining > Decimal::ZERO {
            if annual.carry_forward > Decimal::ZERO {
                take(
                    ExemptionType::AnnualCarryForward,
                    annual.carry_forward,
                    &mut remaining,
                );
            } else {
                warnings.push(Warning::NoCarryForwardAvailable);
            }
        }
    }

    if let Some(claimed) = claims.wedding {
        if remaining > Decimal::ZERO {
            let cap = wedding_cap(gift.relationship);
            if claimed > cap {
                warnings.push(Warning::WeddingClaimCapped { claimed, cap });
            }
            take(ExemptionType::Wedding, cap.min(claimed), &mut remaining);
        }
    }

    if claims.normal_expenditure && remaining > Decimal::ZERO {
        take(ExemptionType::NormalExpenditure, remaining, &mut remaining);
        warnings.push(Warning::EvidenceRequired);
    }

    ExemptionAllocation {
        allocations,
        taxable_amount: remaining,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gift::tests::gift;
    use crate::core::uk::TaxYear;
    use rust_decimal_macros::dec;

    fn fresh() -> AnnualExemptionState {
        AnnualExemptionState::new(TaxYear(2025))
    }

    fn with_claims(mut g: Gift, claims: ExemptionClaims) -> Gift {
        g.claims = claims;
        g
    }

    fn standard(annual: AnnualClaim, wedding: Option<Decimal>, ne: bool) -> ExemptionClaims {
        ExemptionClaims::Standard(StandardClaims {
            annual,
            wedding,
            normal_expenditure: ne,
        })
    }

    fn lines(a: &ExemptionAllocation) -> Vec<(ExemptionType, Decimal)> {
        a.allocations.iter().map(|l| (l.exemption, l.amount)).collect()
    }

    #[test]
    fn friend_with_no_claims_uses_annual_exemption() {
        let g = gift("1", "2024-06-01", Relationship::Friend, dec!(5000));
        let a = allocate(&g, &fresh());
        assert_eq!(lines(&a), vec![(ExemptionType::AnnualCurrentYear, dec!(3000))]);
        assert_eq!(a.taxable_amount, dec!(2000));
        assert!(a.warnings.is_empty());
    }

    #[test]
    fn small_gift_to_friend_is_wholly_exempt() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Friend, dec!(200)),
            ExemptionClaims::SmallGifts,
        );
        let a = allocate(&g, &fresh());
        assert_eq!(lines(&a), vec![(ExemptionType::SmallGifts, dec!(200))]);
        assert_eq!(a.taxable_amount, dec!(0));
    }

    #[test]
    fn child_wedding_gift_with_annual_exemption() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Child, dec!(10000)),
            standard(AnnualClaim::CurrentYear, Some(dec!(5000)), false),
        );
        let a = allocate(&g, &fresh());
        assert_eq!(
            lines(&a),
            vec![
                (ExemptionType::AnnualCurrentYear, dec!(3000)),
                (ExemptionType::Wedding, dec!(5000)),
            ]
        );
        assert_eq!(a.taxable_amount, dec!(2000));
    }

    #[test]
    fn spouse_and_charity_ignore_all_other_claims() {
        for relationship in [Relationship::Spouse, Relationship::Charity] {
            let g = with_claims(
                gift("1", "2024-06-01", relationship, dec!(1000000)),
                standard(AnnualClaim::WithCarryForward, Some(dec!(5000)), true),
            );
            let a = allocate(&g, &fresh());
            assert_eq!(a.taxable_amount, dec!(0));
            assert_eq!(a.allocations.len(), 1);
            assert_eq!(a.total_exempt(), dec!(1000000));
            assert_eq!(a.warnings, vec![Warning::ClaimsIgnoredForExemptRecipient]);
        }
    }

    #[test]
    fn spouse_gift_without_claims_has_no_warning() {
        let g = gift("1", "2024-06-01", Relationship::Spouse, dec!(50));
        let a = allocate(&g, &fresh());
        assert_eq!(lines(&a), vec![(ExemptionType::Spouse, dec!(50))]);
        assert!(a.warnings.is_empty());
    }

    #[test]
    fn small_gifts_over_limit_never_partially_applied() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Friend, dec!(251)),
            ExemptionClaims::SmallGifts,
        );
        let a = allocate(&g, &fresh());
        assert_eq!(a.amount_for(ExemptionType::SmallGifts), dec!(0));
        assert_eq!(lines(&a), vec![(ExemptionType::AnnualCurrentYear, dec!(251))]);
        assert_eq!(a.warnings, vec![Warning::SmallGiftsOverLimit { value: dec!(251) }]);
    }

    #[test]
    fn small_gift_does_not_touch_annual_allowance() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Friend, dec!(250)),
            ExemptionClaims::SmallGifts,
        );
        let state = fresh();
        let a = allocate(&g, &state);
        assert_eq!(state.record(&a), state);
    }

    #[test]
    fn carry_forward_used_after_current_year() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Friend, dec!(8000)),
            standard(AnnualClaim::WithCarryForward, None, false),
        );
        let state = AnnualExemptionState::with_prior_year_used(TaxYear(2025), dec!(0));
        let a = allocate(&g, &state);
        assert_eq!(
            lines(&a),
            vec![
                (ExemptionType::AnnualCurrentYear, dec!(3000)),
                (ExemptionType::AnnualCarryForward, dec!(3000)),
            ]
        );
        assert_eq!(a.taxable_amount, dec!(2000));
    }

    #[test]
    fn carry_forward_without_balance_warns() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Friend, dec!(4000)),
            standard(AnnualClaim::WithCarryForward, None, false),
        );
        let a = allocate(&g, &fresh());
        assert_eq!(a.taxable_amount, dec!(1000));
        assert_eq!(a.warnings, vec![Warning::NoCarryForwardAvailable]);
    }

    #[test]
    fn carry_forward_not_used_unless_claimed() {
        let g = gift("1", "2024-06-01", Relationship::Friend, dec!(8000));
        let state = AnnualExemptionState::with_prior_year_used(TaxYear(2025), dec!(0));
        let a = allocate(&g, &state);
        assert_eq!(a.amount_for(ExemptionType::AnnualCarryForward), dec!(0));
        assert_eq!(a.taxable_amount, dec!(5000));
    }

    #[test]
    fn partially_used_allowance() {
        let g = gift("1", "2024-06-01", Relationship::Sibling, dec!(2000));
        let state = AnnualExemptionState {
            tax_year: TaxYear(2025),
            used: dec!(2500),
            carry_forward: dec!(0),
        };
        let a = allocate(&g, &state);
        assert_eq!(lines(&a), vec![(ExemptionType::AnnualCurrentYear, dec!(500))]);
        assert_eq!(a.taxable_amount, dec!(1500));
    }

    #[test]
    fn declined_annual_exemption() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Friend, dec!(2000)),
            standard(AnnualClaim::Declined, None, false),
        );
        let a = allocate(&g, &fresh());
        assert!(a.allocations.is_empty());
        assert_eq!(a.taxable_amount, dec!(2000));
    }

    #[test]
    fn wedding_caps_by_relationship() {
        assert_eq!(wedding_cap(Relationship::Child), dec!(5000));
        assert_eq!(wedding_cap(Relationship::Grandchild), dec!(2500));
        assert_eq!(wedding_cap(Relationship::Friend), dec!(1000));
        assert_eq!(wedding_cap(Relationship::Other), dec!(1000));
    }

    #[test]
    fn wedding_claim_capped_for_grandchild() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Grandchild, dec!(10000)),
            standard(AnnualClaim::CurrentYear, Some(dec!(5000)), false),
        );
        let a = allocate(&g, &fresh());
        assert_eq!(a.amount_for(ExemptionType::Wedding), dec!(2500));
        assert_eq!(a.taxable_amount, dec!(4500));
        assert_eq!(
            a.warnings,
            vec![Warning::WeddingClaimCapped {
                claimed: dec!(5000),
                cap: dec!(2500)
            }]
        );
    }

    #[test]
    fn wedding_claim_limited_by_claimed_amount() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Child, dec!(10000)),
            standard(AnnualClaim::CurrentYear, Some(dec!(2000)), false),
        );
        let a = allocate(&g, &fresh());
        assert_eq!(a.amount_for(ExemptionType::Wedding), dec!(2000));
        assert_eq!(a.taxable_amount, dec!(5000));
        assert!(a.warnings.is_empty());
    }

    #[test]
    fn wedding_skipped_when_annual_covers_gift() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Child, dec!(2000)),
            standard(AnnualClaim::CurrentYear, Some(dec!(5000)), false),
        );
        let a = allocate(&g, &fresh());
        assert_eq!(lines(&a), vec![(ExemptionType::AnnualCurrentYear, dec!(2000))]);
    }

    #[test]
    fn normal_expenditure_takes_remainder() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Child, dec!(12000)),
            standard(AnnualClaim::CurrentYear, Some(dec!(5000)), true),
        );
        let a = allocate(&g, &fresh());
        assert_eq!(
            lines(&a),
            vec![
                (ExemptionType::AnnualCurrentYear, dec!(3000)),
                (ExemptionType::Wedding, dec!(5000)),
                (ExemptionType::NormalExpenditure, dec!(4000)),
            ]
        );
        assert_eq!(a.taxable_amount, dec!(0));
        assert_eq!(a.warnings, vec![Warning::EvidenceRequired]);
        assert!(ExemptionType::NormalExpenditure.requires_evidence());
    }

    #[test]
    fn value_is_conserved() {
        let claims = [
            ExemptionClaims::default(),
            ExemptionClaims::SmallGifts,
            standard(AnnualClaim::Declined, Some(dec!(700)), false),
            standard(AnnualClaim::WithCarryForward, Some(dec!(9000)), false),
            standard(AnnualClaim::WithCarryForward, Some(dec!(9000)), true),
        ];
        let relationships = [
            Relationship::Child,
            Relationship::Grandchild,
            Relationship::Friend,
            Relationship::Trust,
        ];
        let state = AnnualExemptionState {
            tax_year: TaxYear(2025),
            used: dec!(1000),
            carry_forward: dec!(1500),
        };
        for value in [dec!(10), dec!(250), dec!(2999.99), dec!(7500), dec!(250000)] {
            for relationship in relationships {
                for c in &claims {
                    let g = with_claims(gift("1", "2024-06-01", relationship, value), c.clone());
                    let a = allocate(&g, &state);
                    assert_eq!(a.total_exempt() + a.taxable_amount, value);
                    assert!(a.taxable_amount >= dec!(0));
                    assert!(
                        a.amount_for(ExemptionType::AnnualCurrentYear)
                            + a.amount_for(ExemptionType::AnnualCarryForward)
                            <= state.available()
                    );
                    if a.amount_for(ExemptionType::SmallGifts) > dec!(0) {
                        assert_eq!(a.allocations.len(), 1);
                        assert_eq!(a.amount_for(ExemptionType::SmallGifts), value);
                    }
                }
            }
        }
    }

    #[test]
    fn allocation_is_idempotent() {
        let g = with_claims(
            gift("1", "2024-06-01", Relationship::Child, dec!(10000)),
            standard(AnnualClaim::WithCarryForward, Some(dec!(5000)), false),
        );
        let state = AnnualExemptionState::with_prior_year_used(TaxYear(2025), dec!(2000));
        assert_eq!(allocate(&g, &state), allocate(&g, &state));
    }
}
