//! Redirect-identity verification (bank-grade / government-identity style).
//!
//! The redirect flow is two independent operations correlated by the record
//! id: `initiate` persists a pending record and builds the authorization
//! URL with the record id as provider state; `resolve` is driven by the
//! provider's callback and exchanges the authorization code for the
//! subject's birth date. The "suspension" between the two is the persisted
//! record, not anything in-process.
//!
//! Providers redeliver callbacks, so `resolve` against an already-completed
//! record is an idempotent no-op returning the stored outcome.

use std::sync::Arc;
use std::time::Duration;

use agegate_types::{Method, RecordId, SessionId, ShopId, VerificationOutcome};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decision::{age_in_whole_years, AgeDecisionEngine, Verdict};
use crate::error::VerificationError;
use crate::method::{
    AdapterDeps, Evidence, FinalResolution, Initiation, MethodAdapter, MethodInput, Resolution,
};

/// Stub authorization endpoint used in demo / unconfigured mode.
const STUB_AUTHORIZE_URL: &str = "https://identity.example.invalid/authorize";

/// Default timeout for provider requests.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const PROVIDER_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),

    #[error("identity provider denied the request: {0}")]
    Denied(String),

    #[error("unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

/// The remote identity provider, reduced to the two calls this flow needs.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError>;

    /// Fetch the authenticated subject's birth date.
    async fn fetch_birth_date(&self, access_token: &str) -> Result<NaiveDate, ProviderError>;
}

/// Endpoint configuration for a real identity provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Where the provider sends the visitor back (the resolve endpoint).
    pub callback_url: String,
}

/// OAuth-style HTTP client for a configured identity provider.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    settings: ProviderSettings,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfoResponse {
    birthdate: String,
}

impl HttpIdentityProvider {
    pub fn new(settings: ProviderSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .connect_timeout(PROVIDER_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, settings }
    }

    fn transport_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Unreachable(format!("request timed out: {e}"))
        } else if e.is_connect() {
            ProviderError::Unreachable(format!("connection failed: {e}"))
        } else {
            ProviderError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(&self.settings.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("redirect_uri", self.settings.callback_url.as_str()),
            ])
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Denied(format!(
                "token endpoint returned HTTP {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(token.access_token)
    }

    async fn fetch_birth_date(&self, access_token: &str) -> Result<NaiveDate, ProviderError> {
        let response = self
            .http
            .get(&self.settings.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            return Err(ProviderError::Denied(format!(
                "userinfo endpoint returned HTTP {}",
                response.status()
            )));
        }

        let info: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        NaiveDate::parse_from_str(&info.birthdate, "%Y-%m-%d").map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "unparseable birthdate {:?}: {e}",
                info.birthdate
            ))
        })
    }
}

/// Verification via a remote identity provider.
pub struct RedirectIdentityAdapter {
    deps: AdapterDeps,
    provider: Arc<dyn IdentityProvider>,
    engine: AgeDecisionEngine,
    /// Authorization endpoint details; `None` means demo / unconfigured
    /// mode, which hands out a stub URL instead.
    settings: Option<ProviderSettings>,
}

impl RedirectIdentityAdapter {
    pub fn new(
        deps: AdapterDeps,
        provider: Arc<dyn IdentityProvider>,
        settings: Option<ProviderSettings>,
    ) -> Self {
        let engine = AgeDecisionEngine::from_params(&deps.params);
        Self {
            deps,
            provider,
            engine,
            settings,
        }
    }

    fn authorization_url(&self, record: &RecordId) -> String {
        match &self.settings {
            Some(settings) => format!(
                "{}?response_type=code&client_id={}&redirect_uri={}&state={}",
                settings.authorize_url, settings.client_id, settings.callback_url, record
            ),
            None => format!("{STUB_AUTHORIZE_URL}?state={record}"),
        }
    }

    fn provider_failure(
        &self,
        record: &RecordId,
        detail: String,
    ) -> Result<Resolution, VerificationError> {
        tracing::warn!(record = %record, detail, "redirect verification failed upstream");
        let resolution = self.deps.finish_attempt(
            record,
            VerificationOutcome::Error,
            &detail,
            None,
            None,
        )?;
        Ok(Resolution::Final(resolution))
    }
}

#[async_trait]
impl MethodAdapter for RedirectIdentityAdapter {
    fn method(&self) -> Method {
        Method::RedirectIdentity
    }

    async fn initiate(
        &self,
        shop: &ShopId,
        session: Option<&SessionId>,
        input: MethodInput,
    ) -> Result<Initiation, VerificationError> {
        let record =
            self.deps
                .begin_attempt(shop, session, Method::RedirectIdentity, input.subject)?;
        let authorization_url = self.authorization_url(&record.id);
        Ok(Initiation {
            record: Some(record),
            authorization_url: Some(authorization_url),
            ..Default::default()
        })
    }

    async fn resolve(
        &self,
        record: &RecordId,
        evidence: Evidence,
    ) -> Result<Resolution, VerificationError> {
        let Evidence::AuthorizationCode(code) = evidence else {
            return Err(VerificationError::EvidenceInvalid(
                "redirect-identity expects an authorization code".into(),
            ));
        };

        let stored = self
            .deps
            .records
            .get_record(record)
            .map_err(|e| VerificationError::record_lookup(e, record))?;
        if stored.is_terminal() {
            // Redelivered callback: no-op, return the stored outcome.
            return Ok(Resolution::Final(FinalResolution {
                record: stored,
                verdict: None,
                age_years: None,
                session_moot: false,
            }));
        }

        // Token exchange failure is fatal to the attempt; it is never
        // retried (the code is single-use anyway).
        let access_token = match self.provider.exchange_code(&code).await {
            Ok(token) => token,
            Err(e) => return self.provider_failure(record, format!("token exchange failed: {e}")),
        };

        let birth_date = match self.provider.fetch_birth_date(&access_token).await {
            Ok(date) => date,
            Err(e) => {
                return self.provider_failure(record, format!("birth date lookup failed: {e}"))
            }
        };

        let today = self.deps.today();
        let age = age_in_whole_years(birth_date, today);
        let verdict = self.engine.decide_exact(age);
        let detail = match verdict {
            Verdict::Approved => format!("identity provider confirms age {age}"),
            _ => format!("identity provider reports age {age}, below the threshold"),
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
