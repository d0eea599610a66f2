//! Document-OCR verification.
//!
//! Text extraction itself is an opaque external capability behind
//! [`TextExtractor`]; this module owns what happens to the extracted text.
//! A birth date is accepted in two textual forms:
//!
//! - an explicit `dd.mm.yyyy` date;
//! - a national-id style code whose first six digits encode YYMMDD, with a
//!   month offset of +50 marking the alternate encoding used for one sex.
//!
//! The attempt succeeds only if extraction succeeded AND a birth date was
//! found; anything else resolves the record with a human-readable reason.

use std::sync::{Arc, OnceLock};

use agegate_types::{Method, RecordId, SessionId, ShopId, VerificationOutcome};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use thiserror::Error;

use crate::decision::{age_in_whole_years, AgeDecisionEngine, Verdict};
use crate::error::VerificationError;
use crate::method::{
    AdapterDeps, Evidence, Initiation, MethodAdapter, MethodInput, Resolution,
};

/// Month values above this carry the alternate-encoding offset.
const MONTH_OFFSET: u32 = 50;

#[derive(Debug, Error)]
#[error("text extraction failed: {0}")]
pub struct ExtractionError(pub String);

/// Opaque text extraction capability (the OCR engine).
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> Result<String, ExtractionError>;
}

/// A birth date located in extracted text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BirthDateFind {
    pub date: NaiveDate,
    /// The coded form carried the +50 month offset.
    pub alternate_encoding: bool,
}

fn explicit_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{2})\.(\d{2})\.(\d{4})\b").unwrap())
}

fn coded_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{2})(\d{2})(\d{2})\s*/\s*(\d{3,4})\b").unwrap())
}

/// Locate a birth date in extracted document text.
///
/// Explicit dates win over coded values. Candidates with impossible
/// month/day components are skipped, so a stray six-digit number never
/// masquerades as a birth date.
pub fn find_birth_date(text: &str, today: NaiveDate) -> Option<BirthDateFind> {
    for caps in explicit_date_re().captures_iter(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(BirthDateFind {
                date,
                alternate_encoding: false,
            });
        }
    }

    for caps in coded_date_re().captures_iter(text) {
        let yy: i32 = caps[1].parse().ok()?;
        let raw_month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;

        let (month, alternate) = if raw_month > MONTH_OFFSET {
            (raw_month - MONTH_OFFSET, true)
        } else {
            (raw_month, false)
        };

        // Two-digit years resolve to the most recent century not in the
        // future.
        let year = if 2000 + yy <= today.year() {
            2000 + yy
        } else {
            1900 + yy
        };

        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(BirthDateFind {
                date,
                alternate_encoding: alternate,
            });
        }
    }

    None
}

/// Verification by document image.
pub struct DocumentOcrAdapter {
    deps: AdapterDeps,
    extractor: Arc<dyn TextExtractor>,
    engine: AgeDecisionEngine,
}

impl DocumentOcrAdapter {
    pub fn new(deps: AdapterDeps, extractor: Arc<dyn TextExtractor>) -> Self {
        let engine = AgeDecisionEngine::from_params(&deps.params);
        Self {
            deps,
            extractor,
            engine,
        }
    }
}

#[async_trait]
impl MethodAdapter for DocumentOcrAdapter {
    fn method(&self) -> Method {
        Method::DocumentOcr
    }

    async fn initiate(
        &self,
        shop: &ShopId,
        session: Option<&SessionId>,
        input: MethodInput,
    ) -> Result<Initiation, VerificationError> {
        let record =
            self.deps
                .begin_attempt(shop, session, Method::DocumentOcr, input.subject)?;
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
        let Evidence::DocumentImage(image) = evidence else {
            return Err(VerificationError::EvidenceInvalid(
                "document-ocr expects a document image".into(),
            ));
        };
        self.deps.open_record(record)?;

        let text = match self.extractor.extract_text(&image).await {
            Ok(text) => text,
            Err(e) => {
                let resolution = self.deps.finish_attempt(
                    record,
                    VerificationOutcome::Error,
                    &e.to_string(),
                    None,
                    None,
                )?;
                return Ok(Resolution::Final(resolution));
            }
        };

        let today = self.deps.today();
        let Some(found) = find_birth_date(&text, today) else {
            let resolution = self.deps.finish_attempt(
                record,
                VerificationOutcome::Failure,
                "no birth date found",
                None,
                None,
            )?;
            return Ok(Resolution::Final(resolution));
        };

        let age = age_in_whole_years(found.date, today);
        let verdict = self.engine.decide_exact(age);
        let detail = match verdict {
            Verdict::Approved => format!("document birth date {} confirms age {age}", found.date),
            _ => format!("document birth date {} gives age {age}, below the threshold", found.date),
        };
        let resolution = self.deps.finish_attempt(
            record,
            verdict.outcome(),
            &detail,
            Some(verdict),
            Some(age),
        )?;
        Ok(Resolution::Final(resolution))
    }
}
