//! Request and response shapes for the HTTP surface.

use agegate_store::record::VerificationRecord;
use agegate_store::session::VerificationSession;
use agegate_types::{Method, SessionStatus};
use agegate_verification::capture::Detection;
use agegate_verification::method::{FinalResolution, Initiation, Resolution};
use serde::{Deserialize, Serialize};

// ── Sessions ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub shop: String,
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub expires_at: u64,
}

#[derive(Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub expires_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<RecordView>,
}

#[derive(Deserialize)]
pub struct AttachVerificationRequest {
    pub record_id: String,
    #[serde(default)]
    pub status: Option<SessionStatus>,
}

#[derive(Deserialize)]
pub struct ConfirmPairingRequest {
    pub pairing: String,
}

// ── Verification attempts ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StartVerificationRequest {
    pub shop: String,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Serialize)]
pub struct StartVerificationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

impl From<Initiation> for StartVerificationResponse {
    fn from(initiation: Initiation) -> Self {
        Self {
            verification_record_id: initiation.record.as_ref().map(|r| r.id.to_string()),
            price: initiation.record.as_ref().map(|r| r.price.units()),
            authorization_url: initiation.authorization_url,
            pairing_url: initiation.pairing_url,
            is_verified: initiation.is_verified,
        }
    }
}

/// Evidence payloads, tagged by kind. Binary evidence travels base64.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EvidenceDto {
    AuthorizationCode { code: String },
    DocumentImage { image_base64: String },
    CaptureFrame { frame_base64: String },
    CaptureDetection(Detection),
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    pub evidence: EvidenceDto,
}

/// Provider redirect callback query: `?code=...&state=<record id>`.
#[derive(Deserialize)]
pub struct ProviderCallbackQuery {
    pub code: String,
    pub state: String,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum ResolveResponse {
    InProgress {
        samples_collected: u32,
        samples_needed: u32,
    },
    Resolved {
        record: RecordView,
        #[serde(skip_serializing_if = "Option::is_none")]
        age: Option<u32>,
        /// The owning session expired before this result arrived; the
        /// outcome is recorded but moot for the session.
        session_moot: bool,
    },
}

impl From<Resolution> for ResolveResponse {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::InProgress {
                samples_collected,
                samples_needed,
            } => Self::InProgress {
                samples_collected,
                samples_needed,
            },
            Resolution::Final(FinalResolution {
                record,
                age_years,
                session_moot,
                ..
            }) => Self::Resolved {
                record: RecordView::from(&record),
                age: age_years,
                session_moot,
            },
        }
    }
}

/// Storefront-facing view of a verification record.
#[derive(Serialize)]
pub struct RecordView {
    pub record_id: String,
    pub method: Method,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    pub price: u64,
    pub detail: String,
    pub created_at: u64,
    pub updated_at: u64,
}

impl From<&VerificationRecord> for RecordView {
    fn from(record: &VerificationRecord) -> Self {
        Self {
            record_id: record.id.to_string(),
            method: record.method,
            status: record.status.to_string(),
            result: record.outcome.map(|o| o.to_string()),
            price: record.price.units(),
            detail: record.detail.clone(),
            created_at: record.created_at.as_secs(),
            updated_at: record.updated_at.as_secs(),
        }
    }
}

pub(crate) fn session_view(
    session: &VerificationSession,
    verification: Option<RecordView>,
) -> SessionStatusResponse {
    SessionStatusResponse {
        session_id: session.id.to_string(),
        status: session.status,
        expires_at: session.expires_at.as_secs(),
        verification,
    }
}

// ── Wallet ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TopUpRequest {
    pub company: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct TopUpResponse {
    pub transaction_reference: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct TopUpStatusResponse {
    pub transaction_reference: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct ReconcileResponse {
    pub transaction_reference: String,
    /// "completed" once the matching transfer was found, else "pending".
    pub status: String,
}
