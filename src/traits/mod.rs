//! External collaborator seams.
//!
//! The pool core owns every piece of its own state; the only shared
//! resources are the two token balances, reached through the
//! [`Reserves`] trait, and the counterparties that settle them, reached
//! through the callback traits. Tests run the engine against the
//! in-memory [`InMemoryReserves`] double ledger.

mod callbacks;
mod reserves;

pub use callbacks::{FlashCallback, MintCallback, SwapCallback};
pub use reserves::{InMemoryReserves, Reserves};
