//! Verification method tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named verification technique.
///
/// Adapters are dispatched by this tag; the string forms are the wire
/// representation used by the storefront-facing API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Bank-grade / government-identity redirect flow.
    RedirectIdentity,
    /// Birth date extracted from a document image.
    DocumentOcr,
    /// Face-based age estimation over a stream of frames.
    LiveCapture,
    /// Short-circuit on a prior successful verification of the same subject.
    Revalidation,
    /// Pairing artifact only; evidence is collected by another method on the
    /// secondary device.
    CrossDevice,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::RedirectIdentity,
        Method::DocumentOcr,
        Method::LiveCapture,
        Method::Revalidation,
        Method::CrossDevice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RedirectIdentity => "redirect-identity",
            Self::DocumentOcr => "document-ocr",
            Self::LiveCapture => "live-capture",
            Self::Revalidation => "revalidation",
            Self::CrossDevice => "cross-device",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redirect-identity" => Ok(Self::RedirectIdentity),
            "document-ocr" => Ok(Self::DocumentOcr),
            "live-capture" => Ok(Self::LiveCapture),
            "revalidation" => Ok(Self::Revalidation),
            "cross-device" => Ok(Self::CrossDevice),
            other => Err(format!("unknown verification method: {other}")),
        }
    }
}
