//! Nullable bank statement gateway.

use std::collections::VecDeque;
use std::sync::Mutex;

use agegate_wallet::{BankStatementGateway, GatewayError, StatementLine};
use async_trait::async_trait;
use chrono::NaiveDate;

/// A statement feed fed entirely by the test (or the demo wiring).
///
/// Lines added via [`NullBankGateway::add_credit`] are returned by every
/// fetch whose date range covers them; queued errors are served first,
/// one per fetch, so rate-limit and outage sequences are scriptable.
#[derive(Default)]
pub struct NullBankGateway {
    lines: Mutex<Vec<StatementLine>>,
    errors: Mutex<VecDeque<GatewayError>>,
}

impl NullBankGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming transfer the next fetches will see.
    pub fn add_credit(&self, reference: &str, amount: f64, date: NaiveDate) {
        self.lines.lock().unwrap().push(StatementLine {
            reference: Some(reference.to_string()),
            amount,
            date,
            counterparty: Some("demo counterparty".into()),
        });
    }

    /// Queue an error to be served before any lines.
    pub fn push_error(&self, error: GatewayError) {
        self.errors.lock().unwrap().push_back(error);
    }
}

#[async_trait]
impl BankStatementGateway for NullBankGateway {
    async fn fetch_statement(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StatementLine>, GatewayError> {
        if let Some(error) = self.errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(self
            .lines
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.date >= from && line.date <= to)
            .cloned()
            .collect())
    }
}
