//! Immutable pool parameters.

use crate::domain::{AccountId, FeePips, Tick, TokenPair};
use crate::error::{PoolError, Result};

/// Widest tick spacing a pool may be configured with.
///
/// At this bound a spacing-aligned range still fits multiple ticks
/// inside the valid domain; anything wider makes the book degenerate.
const MAX_TICK_SPACING: i32 = 16_384;

/// Configuration for a concentrated-liquidity pool.
///
/// All parameters are fixed at construction: the canonical token pair,
/// the trade fee in pips, the tick spacing, and the factory owner
/// allowed to adjust the protocol-fee split.
///
/// # Validation
///
/// - `tick_spacing` must be in `[1, 16384]`.
/// - The token pair enforces distinct, canonically ordered tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    token_pair: TokenPair,
    fee: FeePips,
    tick_spacing: i32,
    factory_owner: AccountId,
}

impl PoolConfig {
    /// Creates a new `PoolConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] if `tick_spacing` is
    /// outside `[1, 16384]`.
    pub fn new(
        token_pair: TokenPair,
        fee: FeePips,
        tick_spacing: i32,
        factory_owner: AccountId,
    ) -> Result<Self> {
        let config = Self {
            token_pair,
            fee,
            tick_spacing,
            factory_owner,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates all configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] on a bad spacing.
    pub fn validate(&self) -> Result<()> {
        if self.tick_spacing < 1 || self.tick_spacing > MAX_TICK_SPACING {
            return Err(PoolError::InvalidConfiguration(
                "tick spacing must be in [1, 16384]",
            ));
        }
        Ok(())
    }

    /// Returns the token pair.
    #[must_use]
    pub const fn token_pair(&self) -> TokenPair {
        self.token_pair
    }

    /// Returns the trade fee.
    #[must_use]
    pub const fn fee(&self) -> FeePips {
        self.fee
    }

    /// Returns the tick spacing.
    #[must_use]
    pub const fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    /// Returns the factory owner.
    #[must_use]
    pub const fn factory_owner(&self) -> AccountId {
        self.factory_owner
    }

    /// Per-tick gross liquidity cap implied by the spacing.
    #[must_use]
    pub const fn max_liquidity_per_tick(&self) -> u128 {
        Tick::max_liquidity_per_tick(self.tick_spacing)
    }
}
