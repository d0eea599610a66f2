//! HTTP surface for the agegate service.
//!
//! Provides endpoints for:
//! - Session lifecycle (create, poll, attach, pairing confirmation)
//! - Verification attempts (start per method, resolve with evidence,
//!   provider callback)
//! - Wallet top-ups (request, status, on-demand reconcile)
//!
//! Plus the TOML service configuration consumed by the daemon.

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

pub use config::{BankFeedSettings, ConfigError, ServiceConfig};
pub use error::RpcError;
pub use server::{build_router, AppState};
