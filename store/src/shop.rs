//! Shop directory trait.
//!
//! Shops are owned by the surrounding application; the core only reads
//! them to validate that a storefront integration exists and is active.

use crate::StoreError;
use agegate_types::{CompanyId, ShopId};
use serde::{Deserialize, Serialize};

/// A storefront integration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShopInfo {
    pub id: ShopId,
    /// The merchant company billed for this shop's verifications.
    pub company: CompanyId,
    pub name: String,
    pub active: bool,
}

pub trait ShopStore: Send + Sync {
    fn get_shop(&self, id: &ShopId) -> Result<ShopInfo, StoreError>;

    fn put_shop(&self, shop: &ShopInfo) -> Result<(), StoreError>;
}
