//! Nullable face-age detector.

use std::collections::VecDeque;
use std::sync::Mutex;

use agegate_verification::capture::{AgeDetector, Detection, DetectorError};
use async_trait::async_trait;

/// A detector that plays back scripted detections, falling back to a
/// steady default once the script runs dry.
pub struct NullAgeDetector {
    script: Mutex<VecDeque<Detection>>,
    fallback: Detection,
}

impl NullAgeDetector {
    /// Every frame detects an in-frame subject of `age` at confidence 0.95.
    pub fn steady(age: f64) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Detection {
                estimated_age: age,
                confidence: 0.95,
                in_frame: true,
            },
        }
    }

    /// Play back `detections` in order, then repeat the last one.
    pub fn scripted(detections: Vec<Detection>) -> Self {
        let fallback = detections.last().copied().unwrap_or(Detection {
            estimated_age: 0.0,
            confidence: 0.0,
            in_frame: false,
        });
        Self {
            script: Mutex::new(detections.into()),
            fallback,
        }
    }
}

#[async_trait]
impl AgeDetector for NullAgeDetector {
    async fn detect(&self, _frame: &[u8]) -> Result<Detection, DetectorError> {
        let mut script = self.script.lock().unwrap();
        Ok(script.pop_front().unwrap_or(self.fallback))
    }
}
