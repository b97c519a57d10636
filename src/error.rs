//! Unified error types for the tidepool engine.
//!
//! All fallible operations across the crate return [`PoolError`] as their
//! error type. Every error aborts the whole operation: the pool never
//! commits partial state alongside an `Err`.
//!
//! # Error Code Ranges
//!
//! | Range | Category | Description |
//! |-------|----------|-------------|
//! | 1000–1999 | Input | Invalid arguments or parameters |
//! | 2000–2999 | Invariant | Arithmetic and state-machine violations |
//! | 3000–3999 | Protocol | Reentrancy, settlement, authorization |

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, PoolError>;

// ---------------------------------------------------------------------------
// PoolError
// ---------------------------------------------------------------------------

/// Unified error enum for the tidepool engine.
///
/// Every fallible operation in the crate returns `Result<T, PoolError>`.
/// Variants are grouped by numeric error-code ranges so that callers can
/// pattern-match on categories or inspect individual codes for logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    // ----- 1000–1999: Input errors ------------------------------------------
    /// The pool has already been initialized (code 1000).
    #[error("pool already initialized")]
    AlreadyInitialized,

    /// A tick range has `lower >= upper` (code 1001).
    #[error("tick range misordered: {0}")]
    TickMisordered(&'static str),

    /// A tick index falls outside `[-887272, 887272]` (code 1002).
    #[error("tick out of range: {0}")]
    TickOutOfRange(&'static str),

    /// A tick is not a multiple of the pool's tick spacing (code 1003).
    #[error("tick not aligned to spacing: {0}")]
    TickNotSpaced(&'static str),

    /// A zero amount was supplied where a non-zero one is required (code 1004).
    #[error("amount must be non-zero: {0}")]
    ZeroAmount(&'static str),

    /// A protocol-fee nibble is neither 0 nor in `[4, 10]` (code 1005).
    #[error("invalid protocol fee: {0}")]
    BadFeeProtocol(&'static str),

    /// A swap price limit is outside the open sqrt-ratio interval or on
    /// the wrong side of the current price (code 1006).
    #[error("invalid sqrt price limit: {0}")]
    BadSqrtPriceLimit(&'static str),

    /// A referenced position does not exist or holds no liquidity (code 1007).
    #[error("position not found: {0}")]
    PositionNotFound(&'static str),

    /// A pool configuration parameter is invalid (code 1008).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    // ----- 2000–2999: Invariant errors --------------------------------------
    /// Per-tick gross liquidity would exceed the per-tick cap (code 2000).
    #[error("liquidity overflow: {0}")]
    LiquidityOverflow(&'static str),

    /// A checked arithmetic operation overflowed its result type (code 2001).
    #[error("math overflow: {0}")]
    MathOverflow(&'static str),

    /// Division by zero was attempted (code 2002).
    #[error("division by zero")]
    DivisionByZero,

    /// A flash loan was requested with no in-range liquidity (code 2003).
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// An oracle target precedes the oldest stored observation (code 2004).
    #[error("oracle target too old")]
    OracleOld,

    /// The oracle has no observations to answer from (code 2005).
    #[error("oracle not initialized")]
    OracleUninitialized,

    // ----- 3000–3999: Protocol errors ---------------------------------------
    /// A state-mutating entry was re-entered while locked (code 3000).
    #[error("pool is locked")]
    Locked,

    /// A callback failed to settle the owed token balance (code 3001).
    #[error("insufficient payment: {0}")]
    InsufficientPayment(&'static str),

    /// An owner-only operation was called by a non-owner (code 3002).
    #[error("unauthorized caller")]
    Unauthorized,
}

impl PoolError {
    /// Returns the numeric error code for this variant.
    ///
    /// Codes are organized into ranges:
    /// - 1000–1999 for input errors
    /// - 2000–2999 for invariant errors
    /// - 3000–3999 for protocol errors
    #[must_use]
    pub const fn error_code(&self) -> u16 {
        match self {
            // Input (1000–1999)
            Self::AlreadyInitialized => 1000,
            Self::TickMisordered(_) => 1001,
            Self::TickOutOfRange(_) => 1002,
            Self::TickNotSpaced(_) => 1003,
            Self::ZeroAmount(_) => 1004,
            Self::BadFeeProtocol(_) => 1005,
            Self::BadSqrtPriceLimit(_) => 1006,
            Self::PositionNotFound(_) => 1007,
            Self::InvalidConfiguration(_) => 1008,

            // Invariant (2000–2999)
            Self::LiquidityOverflow(_) => 2000,
            Self::MathOverflow(_) => 2001,
            Self::DivisionByZero => 2002,
            Self::InsufficientLiquidity => 2003,
            Self::OracleOld => 2004,
            Self::OracleUninitialized => 2005,

            // Protocol (3000–3999)
            Self::Locked => 3000,
            Self::InsufficientPayment(_) => 3001,
            Self::Unauthorized => 3002,
        }
    }

    /// Returns `true` if this is an input error (1000–1999).
    #[must_use]
    pub const fn is_input(&self) -> bool {
        self.error_code() >= 1000 && self.error_code() < 2000
    }

    /// Returns `true` if this is an invariant error (2000–2999).
    #[must_use]
    pub const fn is_invariant(&self) -> bool {
        self.error_code() >= 2000 && self.error_code() < 3000
    }

    /// Returns `true` if this is a protocol error (3000–3999).
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        self.error_code() >= 3000 && self.error_code() < 4000
    }
}
