//! The two-level sparse liquidity book.
//!
//! Tick-indexed state lives in two structures that must stay in sync:
//! the word-packed [`TickBitmap`](bitmap::TickBitmap) answers "where is
//! the next initialized tick" in one 256-bit word per query, and the
//! [`TickBook`](ticks::TickBook) holds the per-tick liquidity and
//! outside-accumulator records. Positions index into both through the
//! [`PositionBook`](positions::PositionBook).

pub mod bitmap;
pub mod positions;
pub mod ticks;

pub use bitmap::TickBitmap;
pub use positions::{PositionBook, PositionState};
pub use ticks::{TickBook, TickState};
