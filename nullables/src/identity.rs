//! Nullable identity provider.

use agegate_verification::redirect::{IdentityProvider, ProviderError};
use async_trait::async_trait;
use chrono::NaiveDate;

/// An identity provider that answers from a fixed script.
pub struct NullIdentityProvider {
    birth_date: Result<NaiveDate, String>,
    deny_exchange: bool,
}

impl NullIdentityProvider {
    /// A provider vouching for a subject born on `birth_date`.
    pub fn with_birth_date(birth_date: NaiveDate) -> Self {
        Self {
            birth_date: Ok(birth_date),
            deny_exchange: false,
        }
    }

    /// A comfortably adult subject (born 1990-01-01).
    pub fn adult() -> Self {
        Self::with_birth_date(NaiveDate::from_ymd_opt(1990, 1, 1).expect("valid date"))
    }

    /// A provider whose token endpoint rejects every code.
    pub fn denying() -> Self {
        Self {
            birth_date: Err("denied".into()),
            deny_exchange: true,
        }
    }
}

#[async_trait]
impl IdentityProvider for NullIdentityProvider {
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        if self.deny_exchange {
            return Err(ProviderError::Denied(format!("code {code:?} rejected")));
        }
        Ok(format!("null-token-{code}"))
    }

    async fn fetch_birth_date(&self, _access_token: &str) -> Result<NaiveDate, ProviderError> {
        self.birth_date
            .clone()
            .map_err(ProviderError::InvalidResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn adult_provider_round_trip() {
        let provider = NullIdentityProvider::adult();
        let token = provider.exchange_code("abc").await.unwrap();
        let date = provider.fetch_birth_date(&token).await.unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
    }

    #[tokio::test]
    async fn denying_provider_rejects_exchange() {
        let provider = NullIdentityProvider::denying();
        assert!(provider.exchange_code("abc").await.is_err());
    }
}
