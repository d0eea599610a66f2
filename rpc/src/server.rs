//! Axum router and handlers.

use std::sync::Arc;

use agegate_store::record::RecordStore;
use agegate_store::shop::ShopStore;
use agegate_types::{Method, RecordId, SessionId, ShopId, SubjectId, TxReference};
use agegate_verification::method::{Evidence, MethodInput, MethodRegistry, Resolution};
use agegate_verification::session::SessionManager;
use agegate_wallet::{ReconcileStatus, ReconciliationWorker, TopUpService};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::RpcError;
use crate::handlers::{
    session_view, AttachVerificationRequest, ConfirmPairingRequest, CreateSessionRequest,
    CreateSessionResponse, EvidenceDto, ProviderCallbackQuery, ReconcileResponse, RecordView,
    ResolveRequest, ResolveResponse, SessionStatusResponse, StartVerificationRequest,
    StartVerificationResponse, TopUpRequest, TopUpResponse, TopUpStatusResponse,
};

/// Everything the handlers need, injected once at wiring time.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub registry: Arc<MethodRegistry>,
    pub shops: Arc<dyn ShopStore>,
    pub records: Arc<dyn RecordStore>,
    pub topup: Arc<TopUpService>,
    pub worker: Arc<ReconciliationWorker>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(session_status))
        .route("/sessions/:id/attach", post(attach_verification))
        .route("/sessions/:id/pair", post(confirm_pairing))
        .route("/verifications/:method", post(start_verification))
        .route("/verifications/:id/resolve", post(resolve_verification))
        .route("/verifications/callback", get(provider_callback))
        .route("/wallet/topups", post(request_top_up))
        .route("/wallet/topups/:reference", get(top_up_status))
        .route("/wallet/topups/:reference/reconcile", post(reconcile))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "service": "agegate"}))
}

// ── Sessions ─────────────────────────────────────────────────────────────

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, RpcError> {
    let session = state.sessions.create_session(&ShopId::new(request.shop))?;
    Ok(Json(CreateSessionResponse {
        session_id: session.id.to_string(),
        expires_at: session.expires_at.as_secs(),
    }))
}

async fn session_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, RpcError> {
    let session = state.sessions.session_status(&SessionId::new(id))?;
    let verification = match &session.record {
        Some(record_id) => Some(RecordView::from(&state.records.get_record(record_id)?)),
        None => None,
    };
    Ok(Json(session_view(&session, verification)))
}

async fn attach_verification(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AttachVerificationRequest>,
) -> Result<Json<SessionStatusResponse>, RpcError> {
    let session = state.sessions.attach_verification(
        &SessionId::new(id),
        &RecordId::new(request.record_id),
        request.status,
    )?;
    Ok(Json(session_view(&session, None)))
}

async fn confirm_pairing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ConfirmPairingRequest>,
) -> Result<Json<SessionStatusResponse>, RpcError> {
    let session = state
        .sessions
        .confirm_pairing(&SessionId::new(id), &request.pairing)?;
    Ok(Json(session_view(&session, None)))
}

// ── Verification attempts ────────────────────────────────────────────────

async fn start_verification(
    State(state): State<AppState>,
    Path(method): Path<String>,
    Json(request): Json<StartVerificationRequest>,
) -> Result<Json<StartVerificationResponse>, RpcError> {
    let method: Method = method
        .parse()
        .map_err(|e: String| RpcError::BadRequest(e))?;
    let adapter = state.registry.get(method)?;

    let session = request.session.map(SessionId::new);
    let input = MethodInput {
        subject: request.subject.map(SubjectId::new),
    };
    let initiation = adapter.initiate(&ShopId::new(request.shop), session.as_ref(), input).await?;

    // Revalidation resolves at initiation; bill its record right away.
    if let Some(record) = initiation.record.as_ref() {
        if record.is_terminal() {
            bill_record(&state, record);
        }
    }

    Ok(Json(StartVerificationResponse::from(initiation)))
}

async fn resolve_verification(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, RpcError> {
    let record_id = RecordId::new(id);
    let evidence = decode_evidence(request.evidence)?;

    let record = state.records.get_record(&record_id)?;
    let adapter = state.registry.get(record.method)?;

    // A record that was already terminal resolves as an idempotent no-op
    // (redelivered callbacks); it must not be billed again.
    let was_terminal = record.is_terminal();
    let resolution = adapter.resolve(&record_id, evidence).await?;
    if !was_terminal {
        if let Resolution::Final(resolved) = &resolution {
            bill_record(&state, &resolved.record);
        }
    }
    Ok(Json(ResolveResponse::from(resolution)))
}

/// OAuth-style redirect callback from the identity provider. The `state`
/// query parameter carries the record id set at initiation.
async fn provider_callback(
    State(state): State<AppState>,
    Query(query): Query<ProviderCallbackQuery>,
) -> Result<Json<ResolveResponse>, RpcError> {
    let record_id = RecordId::new(query.state);
    let adapter = state.registry.get(Method::RedirectIdentity)?;

    let was_terminal = state.records.get_record(&record_id)?.is_terminal();
    let resolution = adapter
        .resolve(&record_id, Evidence::AuthorizationCode(query.code))
        .await?;
    if !was_terminal {
        if let Resolution::Final(resolved) = &resolution {
            bill_record(&state, &resolved.record);
        }
    }
    Ok(Json(ResolveResponse::from(resolution)))
}

fn decode_evidence(dto: EvidenceDto) -> Result<Evidence, RpcError> {
    let evidence = match dto {
        EvidenceDto::AuthorizationCode { code } => Evidence::AuthorizationCode(code),
        EvidenceDto::DocumentImage { image_base64 } => Evidence::DocumentImage(
            BASE64
                .decode(image_base64)
                .map_err(|e| RpcError::BadRequest(format!("image is not valid base64: {e}")))?,
        ),
        EvidenceDto::CaptureFrame { frame_base64 } => Evidence::CaptureFrame(
            BASE64
                .decode(frame_base64)
                .map_err(|e| RpcError::BadRequest(format!("frame is not valid base64: {e}")))?,
        ),
        EvidenceDto::CaptureDetection(detection) => Evidence::CaptureDetection(detection),
    };
    Ok(evidence)
}

/// Hand a freshly terminal record to billing: a completed debit against
/// the shop's company. Billing failures are logged, never surfaced to the
/// visitor — the verification outcome stands either way.
fn bill_record(state: &AppState, record: &agegate_store::record::VerificationRecord) {
    if record.price.is_zero() {
        return;
    }
    let company = match state.shops.get_shop(&record.shop) {
        Ok(shop) => shop.company,
        Err(e) => {
            tracing::error!(record = %record.id, error = %e, "billing lookup failed");
            return;
        }
    };
    let description = format!("verification {} via {}", record.id, record.method);
    if let Err(e) = state.topup.bill(&company, record.price, &description) {
        tracing::error!(record = %record.id, error = %e, "billing failed");
    }
}

// ── Wallet ───────────────────────────────────────────────────────────────

async fn request_top_up(
    State(state): State<AppState>,
    Json(request): Json<TopUpRequest>,
) -> Result<Json<TopUpResponse>, RpcError> {
    let tx = state.topup.request_top_up(
        &agegate_types::CompanyId::new(request.company),
        agegate_types::Amount::new(request.amount),
    )?;
    Ok(Json(TopUpResponse {
        transaction_reference: tx.reference.to_string(),
        amount: tx.amount.units(),
    }))
}

async fn top_up_status(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<TopUpStatusResponse>, RpcError> {
    let reference = TxReference::new(reference);
    let status = state.topup.status(&reference)?;
    Ok(Json(TopUpStatusResponse {
        transaction_reference: reference.to_string(),
        status: status.to_string(),
    }))
}

async fn reconcile(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<ReconcileResponse>, RpcError> {
    let reference = TxReference::new(reference);
    let status = state.worker.reconcile(&reference).await?;
    let status = match status {
        ReconcileStatus::Completed => "completed",
        ReconcileStatus::Pending => "pending",
    };
    Ok(Json(ReconcileResponse {
        transaction_reference: reference.to_string(),
        status: status.to_string(),
    }))
}
