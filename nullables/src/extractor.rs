//! Nullable text extractor.

use agegate_verification::document::{ExtractionError, TextExtractor};
use async_trait::async_trait;

/// An OCR engine that returns a fixed text for every image.
pub struct NullTextExtractor {
    result: Result<String, String>,
}

impl NullTextExtractor {
    /// Extraction always succeeds with `text`.
    pub fn returning(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
        }
    }

    /// Extraction always fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            result: Err(reason.into()),
        }
    }
}

#[async_trait]
impl TextExtractor for NullTextExtractor {
    async fn extract_text(&self, _image: &[u8]) -> Result<String, ExtractionError> {
        self.result.clone().map_err(ExtractionError)
    }
}
