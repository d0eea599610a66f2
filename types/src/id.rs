//! Identifier newtypes.
//!
//! Shop, company and subject identifiers come from the surrounding
//! application and are treated as opaque strings. Session and record
//! identifiers, and top-up references, are generated here as random hex so
//! they carry no ordering or enumeration information.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes behind a generated identifier.
const ID_BYTES: usize = 16;

fn random_hex() -> String {
    let mut bytes = [0u8; ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }
    };
}

opaque_id!(
    /// Identifier of a storefront (shop) integration.
    ShopId
);

opaque_id!(
    /// Identifier of a merchant company (wallet owner).
    CompanyId
);

opaque_id!(
    /// Caller-supplied identifier of an end user, used by revalidation
    /// lookups. Opaque to the core; see the revalidation trust model notes.
    SubjectId
);

opaque_id!(
    /// Identifier of a verification session.
    SessionId
);

opaque_id!(
    /// Identifier of a verification record.
    RecordId
);

impl SessionId {
    pub fn generate() -> Self {
        Self(random_hex())
    }
}

impl RecordId {
    pub fn generate() -> Self {
        Self(random_hex())
    }
}

/// Externally-quotable reference of a wallet transaction.
///
/// This is the value a merchant puts in the bank transfer's payment
/// reference field, so it is deliberately distinct from any internal key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxReference(String);

impl TxReference {
    /// Prefix carried by generated top-up references.
    pub const TOPUP_PREFIX: &'static str = "TOPUP-";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Prefix carried by generated billing (debit) references.
    pub const BILLING_PREFIX: &'static str = "BILL-";

    /// Generate a fresh top-up reference.
    pub fn generate_topup() -> Self {
        Self::generate_with_prefix(Self::TOPUP_PREFIX)
    }

    /// Generate a fresh billing reference.
    pub fn generate_billing() -> Self {
        Self::generate_with_prefix(Self::BILLING_PREFIX)
    }

    fn generate_with_prefix(prefix: &str) -> Self {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(format!("{prefix}{}", hex::encode(bytes).to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_session_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
    }

    #[test]
    fn generated_ids_are_hex_of_expected_length() {
        let id = RecordId::generate();
        assert_eq!(id.as_str().len(), ID_BYTES * 2);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn topup_reference_carries_prefix() {
        let reference = TxReference::generate_topup();
        assert!(reference.as_str().starts_with(TxReference::TOPUP_PREFIX));
    }
}
