//! Company directory trait.

use crate::StoreError;
use agegate_types::CompanyId;
use serde::{Deserialize, Serialize};

/// A merchant company — the owner of a prepaid wallet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub id: CompanyId,
    pub name: String,
}

pub trait CompanyStore: Send + Sync {
    fn get_company(&self, id: &CompanyId) -> Result<CompanyInfo, StoreError>;

    fn put_company(&self, company: &CompanyInfo) -> Result<(), StoreError>;
}
