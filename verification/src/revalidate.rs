//! Revalidation — short-circuit on a prior successful verification.
//!
//! No fresh evidence is collected. Given a subject identifier, the adapter
//! looks up the most recent prior Success record for that subject and, if
//! one exists, synthesizes a new completed record referencing it at the
//! lower revalidation price. If none exists it answers `is_verified =
//! false` without creating a billable failure record.
//!
//! The trust model is deliberately thin: any caller-supplied identifier
//! inherits the prior success. There is no binding between the identifier
//! and the originally verified subject.

use agegate_types::{Method, RecordId, SessionId, ShopId, VerificationOutcome};
use async_trait::async_trait;

use crate::error::VerificationError;
use crate::method::{
    AdapterDeps, Evidence, Initiation, MethodAdapter, MethodInput, Resolution,
};

pub struct RevalidationAdapter {
    deps: AdapterDeps,
}

impl RevalidationAdapter {
    pub fn new(deps: AdapterDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl MethodAdapter for RevalidationAdapter {
    fn method(&self) -> Method {
        Method::Revalidation
    }

    async fn initiate(
        &self,
        shop: &ShopId,
        session: Option<&SessionId>,
        input: MethodInput,
    ) -> Result<Initiation, VerificationError> {
        let Some(subject) = input.subject else {
            return Err(VerificationError::Validation(
                "revalidation requires a subject identifier".into(),
            ));
        };
        self.deps.validate_shop(shop)?;

        let Some(prior) = self.deps.records.latest_success_for_subject(&subject)? else {
            tracing::debug!(subject = %subject, "no prior success to revalidate against");
            return Ok(Initiation {
                is_verified: Some(false),
                ..Default::default()
            });
        };

        let record = self.deps.begin_attempt(
            shop,
            session,
            Method::Revalidation,
            Some(subject),
        )?;
        let detail = format!("revalidated against prior record {}", prior.id);
        let resolution = self.deps.finish_attempt(
            &record.id,
            VerificationOutcome::Success,
            &detail,
            None,
            None,
        )?;

        Ok(Initiation {
            record: Some(resolution.record),
            is_verified: Some(true),
            ..Default::default()
        })
    }

    async fn resolve(
        &self,
        _record: &RecordId,
        _evidence: Evidence,
    ) -> Result<Resolution, VerificationError> {
        Err(VerificationError::Validation(
            "revalidation completes at initiation; there is no evidence to resolve".into(),
        ))
    }
}
