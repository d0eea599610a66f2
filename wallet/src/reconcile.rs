//! Wallet reconciliation worker.
//!
//! Matches a claimed bank payment against the statement feed and performs
//! the idempotent Pending → Completed settlement. The feed fetch is the
//! only retried operation (it is a pure read): rate-limit denials back off
//! exponentially inside a bounded loop, and exhausting the budget is
//! reported distinctly from any other upstream failure, which propagates
//! from the final attempt.
//!
//! Safe to run from a schedule and on demand simultaneously, for different
//! or the same reference — the settlement CAS in the store guarantees a
//! reference is settled at most once.

use std::sync::Arc;
use std::time::Duration;

use agegate_store::wallet::WalletStore;
use agegate_store::StoreError;
use agegate_types::{Clock, ServiceParams, TxReference, TxStatus};
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::WalletError;
use crate::gateway::{BankStatementGateway, GatewayError, StatementLine};

/// Result of a reconcile pass over one reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileStatus {
    /// The transaction is settled (by this pass or a concurrent one).
    Completed,
    /// No statement line matched; the transaction stays pending.
    Pending,
}

/// Tally of one sweep over all pending credits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub settled: usize,
    pub still_pending: usize,
    pub failed: usize,
}

pub struct ReconciliationWorker {
    gateway: Arc<dyn BankStatementGateway>,
    wallet: Arc<dyn WalletStore>,
    clock: Arc<dyn Clock>,
    params: ServiceParams,
}

impl ReconciliationWorker {
    pub fn new(
        gateway: Arc<dyn BankStatementGateway>,
        wallet: Arc<dyn WalletStore>,
        clock: Arc<dyn Clock>,
        params: ServiceParams,
    ) -> Self {
        Self {
            gateway,
            wallet,
            clock,
            params,
        }
    }

    /// Try to settle `reference` against the current day's statement.
    pub async fn reconcile(
        &self,
        reference: &TxReference,
    ) -> Result<ReconcileStatus, WalletError> {
        let tx = self.wallet.get_by_reference(reference).map_err(|e| match e {
            StoreError::NotFound(_) => WalletError::TransactionNotFound(reference.to_string()),
            other => WalletError::Store(other),
        })?;

        match tx.status {
            TxStatus::Completed => return Ok(ReconcileStatus::Completed),
            TxStatus::Failed => return Ok(ReconcileStatus::Pending),
            TxStatus::Pending => {}
        }

        let today = self.today();
        let lines = self.fetch_with_backoff(today, today).await?;

        for line in &lines {
            let Some(line_reference) = line.reference.as_deref() else {
                continue;
            };
            if line_reference != reference.as_str() {
                continue;
            }
            if line.credited_units() != tx.amount.units() {
                // Another line with the same reference may still match, so
                // keep scanning rather than failing fast.
                tracing::debug!(
                    reference = %reference,
                    credited = line.credited_units(),
                    expected = tx.amount.units(),
                    "statement line amount mismatch"
                );
                continue;
            }

            return match self.wallet.settle(reference, self.clock.now()) {
                Ok(_) => {
                    tracing::info!(reference = %reference, amount = %tx.amount, "top-up settled");
                    Ok(ReconcileStatus::Completed)
                }
                // A concurrent reconcile won the race; the credit landed
                // exactly once either way.
                Err(StoreError::AlreadySettled(_)) => Ok(ReconcileStatus::Completed),
                Err(other) => Err(WalletError::Store(other)),
            };
        }

        Ok(ReconcileStatus::Pending)
    }

    /// Reconcile every pending credit. Individual failures do not stop the
    /// sweep.
    pub async fn sweep(&self) -> Result<SweepOutcome, WalletError> {
        let pending = self.wallet.pending_credits()?;
        let mut outcome = SweepOutcome::default();
        for tx in pending {
            match self.reconcile(&tx.reference).await {
                Ok(ReconcileStatus::Completed) => outcome.settled += 1,
                Ok(ReconcileStatus::Pending) => outcome.still_pending += 1,
                Err(e) => {
                    tracing::warn!(reference = %tx.reference, error = %e, "sweep reconcile failed");
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn fetch_with_backoff(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<StatementLine>, WalletError> {
        let max_attempts = self.params.reconcile_max_attempts.max(1);
        let cap = Duration::from_millis(self.params.reconcile_max_backoff_ms);
        let mut delay = Duration::from_millis(self.params.reconcile_initial_backoff_ms);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.gateway.fetch_statement(from, to).await {
                Ok(lines) => return Ok(lines),
                Err(e) if attempt >= max_attempts => {
                    return match e {
                        GatewayError::RateLimited => Err(WalletError::RetriesExhausted {
                            attempts: max_attempts,
                        }),
                        other => Err(WalletError::Gateway(other)),
                    };
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, delay_ms = delay.as_millis() as u64, "statement fetch failed; backing off");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(cap);
                }
            }
        }
    }

    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp(self.clock.now().as_secs() as i64, 0)
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}
