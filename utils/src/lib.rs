//! Shared utilities for the agegate service.

pub mod logging;

pub use logging::init_tracing;
