//! Status enums for sessions, records, and wallet transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a verification session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created, no method selected yet.
    Pending,
    /// A method adapter has taken over (or a secondary device scanned the
    /// pairing code); evidence collection is in progress.
    Paired,
    /// The linked record reached a terminal status.
    Completed,
    /// The TTL elapsed before completion.
    Expired,
}

impl SessionStatus {
    /// Position in the forward-only ordering `Pending < Paired < Completed`.
    /// `Expired` sits outside the ordering; it is reachable from any
    /// non-terminal state but only via [`SessionStatus::Expired`] itself.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Paired => 1,
            Self::Completed => 2,
            Self::Expired => 3,
        }
    }

    /// Whether no further transition may leave this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }

    /// Whether a transition from `self` to `to` moves forward.
    ///
    /// A transition to the current status is forward (idempotent
    /// redelivery); any terminal state refuses every move away from it.
    pub fn allows_transition_to(&self, to: SessionStatus) -> bool {
        if self.is_terminal() {
            return *self == to;
        }
        if to == Self::Expired {
            return true;
        }
        to.rank() >= self.rank()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Paired => "paired",
            Self::Completed => "completed",
            Self::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

/// Lifecycle status of a verification record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Attempt started, no outcome yet.
    Pending,
    /// Evidence was evaluated to a business outcome.
    Completed,
    /// The attempt failed for a technical reason before evaluation.
    Error,
}

impl RecordStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Business outcome of a verification attempt. Set exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationOutcome {
    /// The subject met the age threshold.
    Success,
    /// The subject did not meet the age threshold, or the evidence was
    /// conclusively insufficient (unreadable document, low-confidence
    /// capture run).
    Failure,
    /// The evidence sits too close to the threshold to trust either way.
    /// Never presented as a rejection; the caller is prompted to retry or
    /// switch method.
    Uncertain,
    /// A technical failure (extraction error, provider failure).
    Error,
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Uncertain => "uncertain",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Direction of a wallet transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    /// Money in: a top-up by bank transfer.
    Credit,
    /// Money out: a billed verification.
    Debit,
}

/// Settlement status of a wallet transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Waiting for the matching bank statement line.
    Pending,
    /// Settled. Reached exactly once.
    Completed,
    /// Administratively failed (never set by the reconciliation worker).
    Failed,
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ordering_is_forward_only() {
        use SessionStatus::*;
        assert!(Pending.allows_transition_to(Paired));
        assert!(Paired.allows_transition_to(Completed));
        assert!(Pending.allows_transition_to(Completed));
        assert!(!Paired.allows_transition_to(Pending));
        assert!(!Completed.allows_transition_to(Paired));
    }

    #[test]
    fn expiry_reachable_from_non_terminal_only() {
        use SessionStatus::*;
        assert!(Pending.allows_transition_to(Expired));
        assert!(Paired.allows_transition_to(Expired));
        assert!(!Completed.allows_transition_to(Expired));
        assert!(Expired.allows_transition_to(Expired));
    }

    #[test]
    fn redelivery_of_current_status_is_allowed() {
        use SessionStatus::*;
        assert!(Paired.allows_transition_to(Paired));
        assert!(Completed.allows_transition_to(Completed));
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&SessionStatus::Paired).unwrap();
        assert_eq!(json, "\"paired\"");
        let back: VerificationOutcome = serde_json::from_str("\"uncertain\"").unwrap();
        assert_eq!(back, VerificationOutcome::Uncertain);
    }
}
