//! Cross-device pairing.
//!
//! The primary device (say, a desktop browser) displays a scannable code;
//! the visitor's phone opens the encoded URL and runs one of the evidence
//! methods against the same session. This adapter's only job is the
//! pairing artifact and the pairing-state transition on the session
//! manager — it never collects evidence and never creates a record.

use agegate_types::{Method, RecordId, SessionId, ShopId};
use async_trait::async_trait;

use crate::error::VerificationError;
use crate::method::{
    AdapterDeps, Evidence, Initiation, MethodAdapter, MethodInput, Resolution,
};

pub struct CrossDeviceAdapter {
    deps: AdapterDeps,
    /// Public base URL of this service, embedded in pairing links.
    public_base_url: String,
}

impl CrossDeviceAdapter {
    pub fn new(deps: AdapterDeps, public_base_url: impl Into<String>) -> Self {
        Self {
            deps,
            public_base_url: public_base_url.into(),
        }
    }

    fn pairing_url(&self, session: &SessionId, token: &str) -> String {
        format!(
            "{}/verify/{session}?pairing={token}",
            self.public_base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl MethodAdapter for CrossDeviceAdapter {
    fn method(&self) -> Method {
        Method::CrossDevice
    }

    async fn initiate(
        &self,
        shop: &ShopId,
        session: Option<&SessionId>,
        _input: MethodInput,
    ) -> Result<Initiation, VerificationError> {
        let Some(session_id) = session else {
            return Err(VerificationError::Validation(
                "cross-device pairing requires a session".into(),
            ));
        };
        self.deps.validate_shop(shop)?;

        // Live check; an expired session must not hand out pairing links.
        let session = self.deps.sessions.session_status(session_id)?;
        let url = self.pairing_url(&session.id, &session.pairing_token);
        Ok(Initiation {
            pairing_url: Some(url),
            ..Default::default()
        })
    }

    async fn resolve(
        &self,
        _record: &RecordId,
        _evidence: Evidence,
    ) -> Result<Resolution, VerificationError> {
        Err(VerificationError::Validation(
            "cross-device collects no evidence; resolve via the method chosen on the secondary device"
                .into(),
        ))
    }
}
