//! Bank statement feed gateway.
//!
//! A pure read: fetch the statement lines for a date range. The gateway
//! holds no state and makes no decisions — matching and settlement belong
//! to the reconciliation worker.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

/// Default timeout for statement feed requests.
const FEED_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const FEED_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The feed denied the request due to rate limiting. Retryable.
    #[error("statement feed rate limited")]
    RateLimited,

    #[error("statement feed unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected statement feed response: {0}")]
    InvalidResponse(String),
}

/// One line of a bank statement.
#[derive(Clone, Debug, Deserialize)]
pub struct StatementLine {
    /// The payment reference the sender filled in, if any.
    #[serde(default)]
    pub reference: Option<String>,
    /// Signed decimal amount as reported by the bank; credits positive.
    pub amount: f64,
    pub date: NaiveDate,
    #[serde(default)]
    pub counterparty: Option<String>,
}

impl StatementLine {
    /// The credited amount rounded to whole currency units, sign dropped.
    pub fn credited_units(&self) -> u64 {
        self.amount.abs().round() as u64
    }
}

/// Read-only access to the external statement feed.
#[async_trait]
pub trait BankStatementGateway: Send + Sync {
    async fn fetch_statement(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StatementLine>, GatewayError>;
}

/// HTTP client for a real statement feed.
pub struct HttpBankGateway {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct StatementResponse {
    transactions: Vec<StatementLine>,
}

impl HttpBankGateway {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FEED_TIMEOUT)
            .connect_timeout(FEED_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl BankStatementGateway for HttpBankGateway {
    async fn fetch_statement(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StatementLine>, GatewayError> {
        let url = format!(
            "{}/statements?from={from}&to={to}",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Unavailable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    GatewayError::Unavailable(format!("connection failed: {e}"))
                } else {
                    GatewayError::Unavailable(e.to_string())
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(GatewayError::Unavailable(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        let body: StatementResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        Ok(body.transactions)
    }
}
