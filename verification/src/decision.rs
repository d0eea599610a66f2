//! Age decision engine.
//!
//! Two rules, one per evidence class:
//!
//! - **Exact evidence** (a stated birth date from a document or an identity
//!   provider) collapses to a plain threshold comparison. There is no
//!   uncertainty band: the date is authoritative.
//! - **Estimated evidence** (face-based age estimation) gets a three-way
//!   rule with an uncertainty band above the threshold. Estimation error
//!   near the legal threshold is asymmetric, so anything inside the band
//!   must come back as [`Verdict::Uncertain`] and prompt re-verification
//!   rather than risk a false approval.
//!
//! `Uncertain` is never a business success or failure by itself; adapters
//! surface it as "retry or switch method".

use agegate_types::ServiceParams;
use chrono::{Datelike, NaiveDate};

/// The ternary verdict of the decision engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected,
    Uncertain,
}

impl Verdict {
    /// The record outcome this verdict maps to. `Uncertain` stays
    /// uncertain — it is never downgraded to success or failure.
    pub fn outcome(&self) -> agegate_types::VerificationOutcome {
        use agegate_types::VerificationOutcome;
        match self {
            Self::Approved => VerificationOutcome::Success,
            Self::Rejected => VerificationOutcome::Failure,
            Self::Uncertain => VerificationOutcome::Uncertain,
        }
    }
}

/// Decision rules bound to a parameter set.
#[derive(Clone, Copy, Debug)]
pub struct AgeDecisionEngine {
    threshold_years: u32,
    upper_uncertainty_years: u32,
}

impl AgeDecisionEngine {
    pub fn from_params(params: &ServiceParams) -> Self {
        Self {
            threshold_years: params.age_threshold_years,
            upper_uncertainty_years: params.estimation_upper_bound_years,
        }
    }

    /// Decide from an exact age in whole years (birth-date evidence).
    pub fn decide_exact(&self, age_years: u32) -> Verdict {
        if age_years < self.threshold_years {
            Verdict::Rejected
        } else {
            Verdict::Approved
        }
    }

    /// Decide from an estimated age (mean of detector samples).
    pub fn decide_estimated(&self, age_years: f64) -> Verdict {
        if age_years < self.threshold_years as f64 {
            Verdict::Rejected
        } else if age_years > self.upper_uncertainty_years as f64 {
            Verdict::Approved
        } else {
            Verdict::Uncertain
        }
    }
}

/// Age in whole years at `today`, adjusted for whether the birthday has
/// occurred yet this year. A birth date in the future yields 0.
pub fn age_in_whole_years(birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> AgeDecisionEngine {
        AgeDecisionEngine::from_params(&ServiceParams::default())
    }

    // ── Exact rule ─────────────────────────────────────────────────────

    #[test]
    fn exact_seventeen_rejected() {
        assert_eq!(engine().decide_exact(17), Verdict::Rejected);
    }

    #[test]
    fn exact_twenty_six_approved() {
        assert_eq!(engine().decide_exact(26), Verdict::Approved);
    }

    #[test]
    fn exact_rule_has_no_uncertainty_band() {
        // 18 is inside the estimation band but exact evidence approves it.
        assert_eq!(engine().decide_exact(18), Verdict::Approved);
    }

    // ── Banded rule ────────────────────────────────────────────────────

    #[test]
    fn estimated_below_threshold_rejected() {
        assert_eq!(engine().decide_estimated(17.4), Verdict::Rejected);
    }

    #[test]
    fn estimated_band_is_uncertain() {
        for age in [18.0, 20.5, 25.0] {
            assert_eq!(engine().decide_estimated(age), Verdict::Uncertain, "age {age}");
        }
    }

    #[test]
    fn estimated_above_band_approved() {
        assert_eq!(engine().decide_estimated(25.1), Verdict::Approved);
        assert_eq!(engine().decide_estimated(40.0), Verdict::Approved);
    }

    // ── Calendar age ───────────────────────────────────────────────────

    #[test]
    fn age_counts_whole_years_only() {
        let birth = NaiveDate::from_ymd_opt(1990, 3, 15).unwrap();
        let before_birthday = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let on_birthday = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(age_in_whole_years(birth, before_birthday), 35);
        assert_eq!(age_in_whole_years(birth, on_birthday), 36);
    }

    #[test]
    fn future_birth_date_is_zero() {
        let birth = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(age_in_whole_years(birth, today), 0);
    }
}
