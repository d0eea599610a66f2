//! In-memory storage backend.
//!
//! Implements every `agegate-store` trait over mutex-held maps. The
//! terminal transitions (`complete_record`, `settle`, `advance_session`)
//! do their read-check-write under the entity map's lock, which is what
//! makes them compare-and-swap: of two racing callers exactly one wins
//! and the other observes `AlreadyTerminal` / `AlreadySettled`.

mod memory;

pub use memory::MemoryStore;
