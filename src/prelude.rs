//! Convenience re-exports for common types and traits.
//!
//! The prelude provides a single import to bring all commonly used items
//! into scope:
//!
//! ```rust
//! use tidepool::prelude::*;
//! ```

// Re-export domain types
pub use crate::domain::{
    AccountId, Amount, AmountDelta, FeePips, FeeProtocol, Liquidity, Rounding, SqrtPriceX96,
    SwapResult, SwapSpec, Tick, TokenId, TokenPair, FEE_DENOMINATOR, MAX_SQRT_RATIO,
    MIN_SQRT_RATIO,
};

// Re-export the pool and its root records
pub use crate::pool::{LockState, Pool, ProtocolFees, Slot0};

// Re-export collaborator seams
pub use crate::traits::{FlashCallback, InMemoryReserves, MintCallback, Reserves, SwapCallback};

// Re-export configuration and events
pub use crate::config::PoolConfig;
pub use crate::events::PoolEvent;

// Re-export oracle types
pub use crate::oracle::{Observation, Observations, ORACLE_CAPACITY};

// Re-export error types
pub use crate::error::{PoolError, Result};
