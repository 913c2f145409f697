//! Risk scoring and the payment gate.
//!
//! A [`RiskScorer`] classifies a payment mandate. [`RiskPolicy`] turns that
//! classification into either a [`RiskClearance`] or a rejection.
//! `execute_payment` takes `&RiskClearance`, so payment is unreachable
//! without a prior risk check on the same mandate.

use ap2_schemas::RiskScore;
use uuid::Uuid;

use crate::{PaymentMandate, WorkflowError};

/// Classifies a payment mandate as `LOW`, `MEDIUM` or `HIGH` risk.
pub trait RiskScorer {
    fn score(&self, mandate: &PaymentMandate) -> RiskScore;
}

impl<T: RiskScorer + ?Sized> RiskScorer for &T {
    fn score(&self, mandate: &PaymentMandate) -> RiskScore {
        (**self).score(mandate)
    }
}

/// Scores by amount alone, ignoring currency.
///
/// `amount < medium_at` is LOW, `amount < high_at` is MEDIUM, anything else
/// is HIGH. Thresholds are integer micros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountBandScorer {
    pub medium_at_micros: i64,
    pub high_at_micros: i64,
}

impl AmountBandScorer {
    pub fn new(medium_at_micros: i64, high_at_micros: i64) -> Self {
        Self {
            medium_at_micros,
            high_at_micros,
        }
    }
}

impl RiskScorer for AmountBandScorer {
    fn score(&self, mandate: &PaymentMandate) -> RiskScore {
        let amount = mandate.mandate().amount_micros();
        if amount < self.medium_at_micros {
            RiskScore::Low
        } else if amount < self.high_at_micros {
            RiskScore::Medium
        } else {
            RiskScore::High
        }
    }
}

/// Blocks payment at or above `block_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskPolicy {
    pub block_at: RiskScore,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            block_at: RiskScore::High,
        }
    }
}

impl RiskPolicy {
    pub fn new(block_at: RiskScore) -> Self {
        Self { block_at }
    }

    pub fn allows(&self, score: RiskScore) -> bool {
        score < self.block_at
    }

    /// Gate a scored mandate. Only this method mints a [`RiskClearance`].
    pub fn clear(
        &self,
        mandate: &PaymentMandate,
        score: RiskScore,
    ) -> Result<RiskClearance, WorkflowError> {
        if !self.allows(score) {
            return Err(WorkflowError::RiskRejected {
                score,
                block_at: self.block_at,
            });
        }
        Ok(RiskClearance {
            _priv: (),
            mandate_id: mandate.id(),
            score,
        })
    }
}

/// Proof that a specific payment mandate passed the risk gate.
///
/// The `_priv` field keeps struct-literal construction inside this crate;
/// external code obtains one only through [`RiskPolicy::clear`].
#[allow(clippy::manual_non_exhaustive)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskClearance {
    pub(crate) _priv: (),
    mandate_id: Uuid,
    score: RiskScore,
}

impl RiskClearance {
    pub fn mandate_id(&self) -> Uuid {
        self.mandate_id
    }

    pub fn score(&self) -> RiskScore {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{convert_to_payment, issue_intent_mandate, MandateParams};

    fn payment_mandate(amount_micros: i64) -> PaymentMandate {
        let intent = issue_intent_mandate(MandateParams {
            user: "Aamir".to_string(),
            merchant: "merchant:amazon-uae".to_string(),
            amount_micros,
            currency: "AED".to_string(),
            description: "Order".to_string(),
        })
        .unwrap();
        convert_to_payment(intent)
    }

    #[test]
    fn bands_are_half_open() {
        let s = AmountBandScorer::new(1_000_000_000, 5_000_000_000);
        assert_eq!(s.score(&payment_mandate(129_990_000)), RiskScore::Low);
        assert_eq!(s.score(&payment_mandate(999_999_999)), RiskScore::Low);
        assert_eq!(s.score(&payment_mandate(1_000_000_000)), RiskScore::Medium);
        assert_eq!(s.score(&payment_mandate(4_999_999_999)), RiskScore::Medium);
        assert_eq!(s.score(&payment_mandate(5_000_000_000)), RiskScore::High);
    }

    #[test]
    fn default_policy_blocks_only_high() {
        let p = RiskPolicy::default();
        assert!(p.allows(RiskScore::Low));
        assert!(p.allows(RiskScore::Medium));
        assert!(!p.allows(RiskScore::High));
    }

    #[test]
    fn clearance_is_bound_to_the_scored_mandate() {
        let m = payment_mandate(1_000_000);
        let c = RiskPolicy::default().clear(&m, RiskScore::Low).unwrap();
        assert_eq!(c.mandate_id(), m.id());
        assert_eq!(c.score(), RiskScore::Low);
    }

    #[test]
    fn blocked_score_yields_rejection_not_clearance() {
        let m = payment_mandate(1_000_000);
        let err = RiskPolicy::new(RiskScore::Medium)
            .clear(&m, RiskScore::Medium)
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::RiskRejected {
                score: RiskScore::Medium,
                block_at: RiskScore::Medium
            }
        );
    }
}
