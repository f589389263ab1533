//! Storage abstractions for the circulation system.
//!
//! The service talks to three narrow store interfaces; `MemoryStore`
//! implements all of them and snapshots to JSON for the CLI.

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{BookStore, BorrowerStore, LoanStore};
