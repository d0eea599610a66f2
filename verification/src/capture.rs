//! Live-capture verification (face-based age estimation).
//!
//! A single sample is never enough: the adapter accumulates estimates from
//! successive detector invocations, counting a frame only when the subject
//! is in frame and the detector is confident about the frame itself. Once
//! the target sample count is reached it computes the mean age and an
//! aggregate confidence from the spread; a noisy run fails outright rather
//! than risking a verdict, and a clean run feeds the banded decision rule.
//!
//! Accumulation is held in memory per record and is cancellable at any
//! point before the final sample with no side effects — nothing is written
//! to the record until a terminal decision is reached.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use agegate_types::{Method, RecordId, SessionId, ShopId, VerificationOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decision::{AgeDecisionEngine, Verdict};
use crate::error::VerificationError;
use crate::method::{
    AdapterDeps, Evidence, Initiation, MethodAdapter, MethodInput, Resolution,
};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),

    #[error("frame not usable: {0}")]
    InvalidFrame(String),
}

/// One detector invocation's result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Detection {
    pub estimated_age: f64,
    /// Detector confidence in this frame, [0, 1].
    pub confidence: f64,
    /// Whether the subject is centered and large enough in the frame.
    pub in_frame: bool,
}

/// Opaque face-age estimation capability.
#[async_trait]
pub trait AgeDetector: Send + Sync {
    async fn detect(&self, frame: &[u8]) -> Result<Detection, DetectorError>;
}

/// Accumulated samples for one capture attempt.
#[derive(Debug, Default)]
pub struct CaptureRun {
    samples: Vec<f64>,
}

impl CaptureRun {
    pub fn push(&mut self, estimated_age: f64) {
        self.samples.push(estimated_age);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Population standard deviation of the samples.
    pub fn stddev(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .samples
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / self.samples.len() as f64;
        variance.sqrt()
    }

    /// `clamp(1 - stddev / divisor, 0, 1)` — high spread, low confidence.
    pub fn aggregate_confidence(&self, divisor: f64) -> f64 {
        (1.0 - self.stddev() / divisor).clamp(0.0, 1.0)
    }
}

/// Verification by face-based age estimation.
pub struct LiveCaptureAdapter {
    deps: AdapterDeps,
    detector: Arc<dyn AgeDetector>,
    engine: AgeDecisionEngine,
    runs: Mutex<HashMap<String, CaptureRun>>,
}

impl LiveCaptureAdapter {
    pub fn new(deps: AdapterDeps, detector: Arc<dyn AgeDetector>) -> Self {
        let engine = AgeDecisionEngine::from_params(&deps.params);
        Self {
            deps,
            detector,
            engine,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Abandon an in-flight capture run. The pending record is untouched.
    pub fn cancel(&self, record: &RecordId) {
        self.runs.lock().unwrap().remove(record.as_str());
    }

    fn counts(&self, detection: &Detection) -> bool {
        detection.in_frame
            && detection.confidence > self.deps.params.capture_min_sample_confidence
    }
}

#[async_trait]
impl MethodAdapter for LiveCaptureAdapter {
    fn method(&self) -> Method {
        Method::LiveCapture
    }

    async fn initiate(
        &self,
        shop: &ShopId,
        session: Option<&SessionId>,
        input: MethodInput,
    ) -> Result<Initiation, VerificationError> {
        let record =
            self.deps
                .begin_attempt(shop, session, Method::LiveCapture, input.subject)?;
        Ok(Initiation {
            record: Some(record),
            ..Default::default()
        })
    }

    async fn resolve(
        &self,
        record: &RecordId,
        evidence: Evidence,
    ) -> Result<Resolution, VerificationError> {
        self.deps.open_record(record)?;
        let detection = match evidence {
            Evidence::CaptureDetection(detection) => detection,
            Evidence::CaptureFrame(frame) => self
                .detector
                .detect(&frame)
                .await
                .map_err(|e| VerificationError::Upstream(e.to_string()))?,
            _ => {
                return Err(VerificationError::EvidenceInvalid(
                    "live-capture expects a camera frame or detection".into(),
                ));
            }
        };

        let target = self.deps.params.capture_sample_target;
        let run_state = {
            let mut runs = self.runs.lock().unwrap();
            let run = runs.entry(record.to_string()).or_default();

            if self.counts(&detection) {
                run.push(detection.estimated_age);
            }
            if (run.len() as u32) < target {
                return Ok(Resolution::InProgress {
                    samples_collected: run.len() as u32,
                    samples_needed: target,
                });
            }
            runs.remove(record.as_str()).unwrap_or_default()
        };

        let mean = run_state.mean();
        let confidence =
            run_state.aggregate_confidence(self.deps.params.capture_stddev_divisor);

        if confidence < self.deps.params.capture_min_aggregate_confidence {
            tracing::debug!(record = %record, confidence, "capture run too noisy, failing attempt");
            let detail = format!(
                "capture evidence too ambiguous (confidence {confidence:.2}); retry from scratch"
            );
            let resolution = self.deps.finish_attempt(
                record,
                VerificationOutcome::Failure,
                &detail,
                None,
                None,
            )?;
            return Ok(Resolution::Final(resolution));
        }

        let verdict = self.engine.decide_estimated(mean);
        let detail = match verdict {
            Verdict::Approved => format!("estimated age {mean:.1} (confidence {confidence:.2})"),
            Verdict::Rejected => format!(
                "estimated age {mean:.1} is below the threshold (confidence {confidence:.2})"
            ),
            Verdict::Uncertain => format!(
                "estimated age {mean:.1} is inside the uncertainty band; retry or switch method"
            ),
        };
        let resolution = self.deps.finish_attempt(
            record,
            verdict.outcome(),
            &detail,
            Some(verdict),
            None,
        )?;
        Ok(Resolution::Final(resolution))
    }
}
