//! RPC error type and its HTTP mapping.
//!
//! Every terminal condition keeps its own distinct, non-generic message:
//! an expired session is 410, an inactive shop 403, an already-terminal
//! record 409 (a no-op for the caller, not a failure), an unreachable
//! upstream 502. "Uncertain" is not an error at all — it travels in the
//! resolution body, never through this type.

use agegate_store::StoreError;
use agegate_verification::VerificationError;
use agegate_wallet::WalletError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{0}")]
    NotFound(String),

    /// Session expired — reported as HTTP 410, never as a plain 404.
    #[error("{0}")]
    Gone(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    /// Invariant no-op (already terminal / already settled).
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl RpcError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not-found"),
            Self::Gone(_) => (StatusCode::GONE, "expired"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation-failed"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "already-terminal"),
            Self::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "upstream-unavailable"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();
        let body = ErrorBody {
            error,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<VerificationError> for RpcError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::ShopNotFound(_)
            | VerificationError::SessionNotFound(_)
            | VerificationError::RecordNotFound(_) => Self::NotFound(e.to_string()),
            VerificationError::SessionExpired(_) => Self::Gone(e.to_string()),
            VerificationError::ShopInactive(_) => Self::Forbidden(e.to_string()),
            VerificationError::Validation(_) | VerificationError::EvidenceInvalid(_) => {
                Self::BadRequest(e.to_string())
            }
            VerificationError::AlreadyTerminal(_) => Self::Conflict(e.to_string()),
            VerificationError::Upstream(_) => Self::UpstreamUnavailable(e.to_string()),
            VerificationError::Store(inner) => Self::from(inner),
        }
    }
}

impl From<WalletError> for RpcError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::CompanyNotFound(_) | WalletError::TransactionNotFound(_) => {
                Self::NotFound(e.to_string())
            }
            WalletError::InvalidAmount(_) => Self::BadRequest(e.to_string()),
            WalletError::RetriesExhausted { .. } | WalletError::Gateway(_) => {
                Self::UpstreamUnavailable(e.to_string())
            }
            WalletError::Store(inner) => Self::from(inner),
        }
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::NotFound(e.to_string()),
            StoreError::AlreadyTerminal(_) | StoreError::AlreadySettled(_) => {
                Self::Conflict(e.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_session_maps_to_410() {
        let rpc: RpcError = VerificationError::SessionExpired("s1".into()).into();
        assert_eq!(rpc.status_and_code().0, StatusCode::GONE);
    }

    #[test]
    fn inactive_shop_maps_to_403() {
        let rpc: RpcError = VerificationError::ShopInactive("shop-1".into()).into();
        assert_eq!(rpc.status_and_code().0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn already_terminal_maps_to_409() {
        let rpc: RpcError = VerificationError::AlreadyTerminal("r1".into()).into();
        assert_eq!(rpc.status_and_code().0, StatusCode::CONFLICT);
    }

    #[test]
    fn exhausted_retries_map_to_502() {
        let rpc: RpcError = WalletError::RetriesExhausted { attempts: 5 }.into();
        assert_eq!(rpc.status_and_code().0, StatusCode::BAD_GATEWAY);
    }
}
