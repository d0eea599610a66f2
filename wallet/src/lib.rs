//! Prepaid wallet: top-up requests and bank statement reconciliation.
//!
//! A merchant requests a top-up and receives a quotable payment reference;
//! the money arrives out-of-band as a bank transfer. The
//! [`reconcile::ReconciliationWorker`] matches incoming statement lines to
//! pending credits and performs the exactly-once settlement, driving the
//! read-only [`gateway::BankStatementGateway`] with bounded retry/backoff.

pub mod error;
pub mod gateway;
pub mod reconcile;
pub mod topup;

pub use error::WalletError;
pub use gateway::{BankStatementGateway, GatewayError, HttpBankGateway, StatementLine};
pub use reconcile::{ReconcileStatus, ReconciliationWorker, SweepOutcome};
pub use topup::TopUpService;
