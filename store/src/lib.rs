//! Abstract storage traits for the agegate service.
//!
//! Every storage backend (in-memory, SQL, whatever the surrounding
//! application provides) implements these traits. The rest of the codebase
//! depends only on the traits; the terminal-transition invariants
//! (write-once record outcomes, exactly-once settlement, forward-only
//! session status) are part of the trait contracts and enforced by the
//! backend.

pub mod company;
pub mod error;
pub mod record;
pub mod session;
pub mod shop;
pub mod wallet;

pub use company::{CompanyInfo, CompanyStore};
pub use error::StoreError;
pub use record::{RecordStore, VerificationRecord};
pub use session::{SessionStore, VerificationSession};
pub use shop::{ShopInfo, ShopStore};
pub use wallet::{WalletStore, WalletTransaction};
