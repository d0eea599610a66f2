//! Age verification core.
//!
//! A storefront requests a [`session::SessionManager`] session, the visitor
//! picks a verification method, and the matching [`method::MethodAdapter`]
//! runs the attempt — synchronously (document OCR), over a redirect
//! round-trip (identity provider), across many frames (live capture), by
//! short-circuit (revalidation), or on a second device (cross-device
//! pairing). Evidence collapses into the [`decision::AgeDecisionEngine`],
//! and the outcome lands exactly once on a verification record.
//!
//! The verification *method* is modular: every adapter implements the same
//! `initiate`/`resolve` surface and is dispatched by method tag.

pub mod capture;
#[cfg(test)]
pub(crate) mod testutil;
pub mod cross_device;
pub mod decision;
pub mod document;
pub mod error;
pub mod method;
pub mod redirect;
pub mod revalidate;
pub mod session;

pub use capture::{AgeDetector, Detection, LiveCaptureAdapter};
pub use cross_device::CrossDeviceAdapter;
pub use decision::{AgeDecisionEngine, Verdict};
pub use document::{DocumentOcrAdapter, TextExtractor};
pub use error::VerificationError;
pub use method::{
    AdapterDeps, Evidence, FinalResolution, Initiation, MethodAdapter, MethodInput,
    MethodRegistry, Resolution,
};
pub use redirect::{IdentityProvider, RedirectIdentityAdapter};
pub use revalidate::RevalidationAdapter;
pub use session::{SessionAdvance, SessionManager};
