//! Service parameters — every tunable constant in one place.
//!
//! The live-capture thresholds and the estimation uncertainty band were
//! tuned empirically against the production detector; they are carried here
//! as named, overridable values rather than re-derived.

use crate::{Amount, Method};
use serde::{Deserialize, Serialize};

/// All tunable parameters of the verification and reconciliation core.
///
/// Fields omitted from a config file keep their defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceParams {
    // ── Sessions ─────────────────────────────────────────────────────────
    /// Duration (seconds) of a verification session before it expires.
    pub session_ttl_secs: u64,

    // ── Age decision ─────────────────────────────────────────────────────
    /// Minimum age (whole years) a visitor must meet.
    pub age_threshold_years: u32,

    /// Upper bound (whole years) of the uncertainty band for
    /// estimation-based evidence. Estimates in
    /// `[age_threshold_years, estimation_upper_bound_years]` are uncertain.
    pub estimation_upper_bound_years: u32,

    // ── Live capture ─────────────────────────────────────────────────────
    /// Number of weighted samples a capture run must accumulate.
    pub capture_sample_target: u32,

    /// Minimum per-frame detector confidence for a sample to count.
    pub capture_min_sample_confidence: f64,

    /// Minimum aggregate confidence for a completed run to be decided
    /// rather than failed outright.
    pub capture_min_aggregate_confidence: f64,

    /// Divisor in `confidence = clamp(1 - stddev / divisor, 0, 1)`.
    pub capture_stddev_divisor: f64,

    // ── Pricing (whole currency units per attempt) ───────────────────────
    pub price_redirect_identity: u64,
    pub price_document_ocr: u64,
    pub price_live_capture: u64,
    pub price_revalidation: u64,

    // ── Reconciliation ───────────────────────────────────────────────────
    /// Maximum statement-feed attempts per reconcile call.
    pub reconcile_max_attempts: u32,

    /// Initial backoff (ms) after a rate-limit denial; doubles per retry.
    pub reconcile_initial_backoff_ms: u64,

    /// Cap on the computed backoff delay (ms).
    pub reconcile_max_backoff_ms: u64,
}

impl ServiceParams {
    /// Defaults for the storefront deployment.
    pub fn storefront_defaults() -> Self {
        Self {
            session_ttl_secs: 30 * 60,

            age_threshold_years: 18,
            estimation_upper_bound_years: 25,

            capture_sample_target: 30,
            capture_min_sample_confidence: 0.8,
            capture_min_aggregate_confidence: 0.7,
            capture_stddev_divisor: 10.0,

            price_redirect_identity: 20,
            price_document_ocr: 10,
            price_live_capture: 5,
            price_revalidation: 1,

            reconcile_max_attempts: 5,
            reconcile_initial_backoff_ms: 1_000,
            reconcile_max_backoff_ms: 60_000,
        }
    }

    /// Price of one attempt via `method`.
    ///
    /// Cross-device carries no price of its own — the record is created by
    /// whichever evidence method runs on the secondary device.
    pub fn price(&self, method: Method) -> Amount {
        let units = match method {
            Method::RedirectIdentity => self.price_redirect_identity,
            Method::DocumentOcr => self.price_document_ocr,
            Method::LiveCapture => self.price_live_capture,
            Method::Revalidation => self.price_revalidation,
            Method::CrossDevice => 0,
        };
        Amount::new(units)
    }
}

impl Default for ServiceParams {
    fn default() -> Self {
        Self::storefront_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_methods_cost_more_than_revalidation() {
        let params = ServiceParams::default();
        for method in [
            Method::RedirectIdentity,
            Method::DocumentOcr,
            Method::LiveCapture,
        ] {
            assert!(params.price(method) > params.price(Method::Revalidation));
        }
    }

    #[test]
    fn cross_device_is_free() {
        assert!(ServiceParams::default().price(Method::CrossDevice).is_zero());
    }
}
