//! Per-position liquidity and fee accounting.
//!
//! A position is keyed by `(owner, lower tick, upper tick)`. It tracks
//! its share of virtual liquidity, a snapshot of fee-growth-inside from
//! the last touch, and the tokens it has earned but not yet collected.
//! Positions persist across zero-liquidity states so accrued tokens
//! survive until collected.

use std::collections::HashMap;

use primitive_types::U256;

use crate::domain::{AccountId, Amount};
use crate::error::{PoolError, Result};
use crate::math::{full_math, liquidity_math, Q128};

/// State stored for one position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionState {
    /// The position's virtual liquidity while the price is in range.
    pub liquidity: u128,
    /// Fee-growth-inside snapshot for token0 at the last update.
    pub fee_growth_inside_0_last_x128: U256,
    /// Fee-growth-inside snapshot for token1 at the last update.
    pub fee_growth_inside_1_last_x128: U256,
    /// Uncollected token0 owed to the position.
    pub tokens_owed_0: Amount,
    /// Uncollected token1 owed to the position.
    pub tokens_owed_1: Amount,
}

/// Key of a position record.
pub type PositionKey = (AccountId, i32, i32);

/// The position ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionBook {
    positions: HashMap<PositionKey, PositionState>,
}

/// Converts a Q128.128-scaled owed amount to token units, saturating.
///
/// Fees past `u128::MAX` clamp rather than error; the owner is expected
/// to collect long before that point.
fn owed_from_growth(delta_x128: U256, liquidity: u128) -> Result<Amount> {
    let owed = full_math::mul_div(delta_x128, U256::from(liquidity), Q128)?;
    if owed > U256::from(u128::MAX) {
        Ok(Amount::MAX)
    } else {
        Ok(Amount::new(owed.low_u128()))
    }
}

impl PositionBook {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the position for `(owner, lower, upper)`, if present.
    #[must_use]
    pub fn get(&self, owner: &AccountId, lower: i32, upper: i32) -> Option<&PositionState> {
        self.positions.get(&(*owner, lower, upper))
    }

    /// Number of tracked positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if no position is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates over `(key, state)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&PositionKey, &PositionState)> {
        self.positions.iter()
    }

    /// Credits accrued fees and applies a liquidity delta to a position.
    ///
    /// A delta of zero is a "poke": it settles fees without changing
    /// liquidity, and is only meaningful on a position that has some.
    ///
    /// # Errors
    ///
    /// - [`PoolError::PositionNotFound`] on a poke of a position with no
    ///   liquidity.
    /// - [`PoolError::LiquidityOverflow`] if the delta under- or
    ///   overflows the position's liquidity.
    pub fn update(
        &mut self,
        owner: &AccountId,
        lower: i32,
        upper: i32,
        liquidity_delta: i128,
        fee_growth_inside_0_x128: U256,
        fee_growth_inside_1_x128: U256,
    ) -> Result<()> {
        let position = self.positions.entry((*owner, lower, upper)).or_default();

        let liquidity_next = if liquidity_delta == 0 {
            if position.liquidity == 0 {
                return Err(PoolError::PositionNotFound("poke of empty position"));
            }
            position.liquidity
        } else {
            liquidity_math::add_delta(position.liquidity, liquidity_delta)?
        };

        // Owed tokens accrue from the wrap-around growth delta before the
        // liquidity change takes effect.
        let owed_0 = owed_from_growth(
            fee_growth_inside_0_x128
                .overflowing_sub(position.fee_growth_inside_0_last_x128)
                .0,
            position.liquidity,
        )?;
        let owed_1 = owed_from_growth(
            fee_growth_inside_1_x128
                .overflowing_sub(position.fee_growth_inside_1_last_x128)
                .0,
            position.liquidity,
        )?;

        position.liquidity = liquidity_next;
        position.fee_growth_inside_0_last_x128 = fee_growth_inside_0_x128;
        position.fee_growth_inside_1_last_x128 = fee_growth_inside_1_x128;
        if !owed_0.is_zero() || !owed_1.is_zero() {
            position.tokens_owed_0 = position.tokens_owed_0.saturating_add(&owed_0);
            position.tokens_owed_1 = position.tokens_owed_1.saturating_add(&owed_1);
        }
        Ok(())
    }

    /// Credits burn proceeds straight into the owed counters.
    pub fn credit_owed(
        &mut self,
        owner: &AccountId,
        lower: i32,
        upper: i32,
        amount_0: Amount,
        amount_1: Amount,
    ) {
        let position = self.positions.entry((*owner, lower, upper)).or_default();
        position.tokens_owed_0 = position.tokens_owed_0.saturating_add(&amount_0);
        position.tokens_owed_1 = position.tokens_owed_1.saturating_add(&amount_1);
    }

    /// Withdraws up to the requested amounts from the owed counters.
    ///
    /// Never fails: a missing or empty position simply yields zero, and
    /// requests are clamped to what is owed.
    pub fn collect(
        &mut self,
        owner: &AccountId,
        lower: i32,
        upper: i32,
        amount_0_requested: Amount,
        amount_1_requested: Amount,
    ) -> (Amount, Amount) {
        let Some(position) = self.positions.get_mut(&(*owner, lower, upper)) else {
            return (Amount::ZERO, Amount::ZERO);
        };
        let amount_0 = amount_0_requested.min(position.tokens_owed_0);
        let amount_1 = amount_1_requested.min(position.tokens_owed_1);
        position.tokens_owed_0 = position
            .tokens_owed_0
            .checked_sub(&amount_0)
            .unwrap_or(Amount::ZERO);
        position.tokens_owed_1 = position
            .tokens_owed_1
            .checked_sub(&amount_1)
            .unwrap_or(Amount::ZERO);
        (amount_0, amount_1)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from_bytes([0xa1; 32])
    }

    // -- update -------------------------------------------------------------

    #[test]
    fn mint_creates_position() {
        let mut book = PositionBook::new();
        let Ok(()) = book.update(&alice(), -60, 60, 1_000, U256::zero(), U256::zero()) else {
            panic!("expected Ok");
        };
        let Some(pos) = book.get(&alice(), -60, 60) else {
            panic!("position should exist");
        };
        assert_eq!(pos.liquidity, 1_000);
        assert!(pos.tokens_owed_0.is_zero());
    }

    #[test]
    fn poke_of_empty_position_rejected() {
        let mut book = PositionBook::new();
        let result = book.update(&alice(), -60, 60, 0, U256::zero(), U256::zero());
        assert!(matches!(result, Err(PoolError::PositionNotFound(_))));
    }

    #[test]
    fn burn_below_zero_rejected() {
        let mut book = PositionBook::new();
        let Ok(()) = book.update(&alice(), -60, 60, 100, U256::zero(), U256::zero()) else {
            panic!("expected Ok");
        };
        let result = book.update(&alice(), -60, 60, -101, U256::zero(), U256::zero());
        assert!(matches!(result, Err(PoolError::LiquidityOverflow(_))));
    }

    #[test]
    fn fees_accrue_from_growth_delta() {
        let mut book = PositionBook::new();
        let Ok(()) = book.update(&alice(), -60, 60, 1, U256::zero(), U256::zero()) else {
            panic!("expected Ok");
        };
        // Liquidity 1, growth delta of 3 << 128 => 3 tokens owed.
        let growth = U256::from(3u64) << 128;
        let Ok(()) = book.update(&alice(), -60, 60, 0, growth, U256::zero()) else {
            panic!("expected Ok");
        };
        let Some(pos) = book.get(&alice(), -60, 60) else {
            panic!("position should exist");
        };
        assert_eq!(pos.tokens_owed_0, Amount::new(3));
        assert_eq!(pos.fee_growth_inside_0_last_x128, growth);
    }

    #[test]
    fn wrapped_growth_delta_still_accrues() {
        let mut book = PositionBook::new();
        let Ok(()) = book.update(&alice(), -60, 60, 1, U256::MAX, U256::zero()) else {
            panic!("expected Ok");
        };
        // Growth wrapped past 2^256: new value is small, delta is 2 << 128.
        let wrapped = (U256::from(2u64) << 128) - U256::one();
        let Ok(()) = book.update(&alice(), -60, 60, 0, wrapped, U256::zero()) else {
            panic!("expected Ok");
        };
        let Some(pos) = book.get(&alice(), -60, 60) else {
            panic!("position should exist");
        };
        assert_eq!(pos.tokens_owed_0, Amount::new(2));
    }

    #[test]
    fn owed_saturates_at_max() {
        let mut book = PositionBook::new();
        let Ok(()) = book.update(&alice(), -60, 60, i128::MAX, U256::zero(), U256::zero()) else {
            panic!("expected Ok");
        };
        // Enormous growth: owed would exceed u128.
        let Ok(()) = book.update(&alice(), -60, 60, 0, U256::MAX / 2u64, U256::zero()) else {
            panic!("expected Ok");
        };
        let Some(pos) = book.get(&alice(), -60, 60) else {
            panic!("position should exist");
        };
        assert_eq!(pos.tokens_owed_0, Amount::MAX);
    }

    #[test]
    fn position_persists_at_zero_liquidity() {
        let mut book = PositionBook::new();
        let growth = U256::from(5u64) << 128;
        let Ok(()) = book.update(&alice(), -60, 60, 10, U256::zero(), U256::zero()) else {
            panic!("expected Ok");
        };
        let Ok(()) = book.update(&alice(), -60, 60, -10, growth, U256::zero()) else {
            panic!("expected Ok");
        };
        let Some(pos) = book.get(&alice(), -60, 60) else {
            panic!("position should persist for collection");
        };
        assert_eq!(pos.liquidity, 0);
        assert_eq!(pos.tokens_owed_0, Amount::new(50));
    }

    // -- credit_owed / collect ----------------------------------------------

    #[test]
    fn credit_then_collect_partial() {
        let mut book = PositionBook::new();
        book.credit_owed(&alice(), -60, 60, Amount::new(100), Amount::new(40));
        let (a0, a1) = book.collect(&alice(), -60, 60, Amount::new(30), Amount::new(100));
        assert_eq!(a0, Amount::new(30));
        assert_eq!(a1, Amount::new(40));
        let (a0, a1) = book.collect(&alice(), -60, 60, Amount::MAX, Amount::MAX);
        assert_eq!(a0, Amount::new(70));
        assert_eq!(a1, Amount::ZERO);
    }

    #[test]
    fn collect_from_missing_position_is_zero() {
        let mut book = PositionBook::new();
        let (a0, a1) = book.collect(&alice(), -1, 1, Amount::MAX, Amount::MAX);
        assert_eq!(a0, Amount::ZERO);
        assert_eq!(a1, Amount::ZERO);
    }

    #[test]
    fn distinct_owners_do_not_share() {
        let bob = AccountId::from_bytes([0xb0; 32]);
        let mut book = PositionBook::new();
        book.credit_owed(&alice(), -60, 60, Amount::new(5), Amount::ZERO);
        let (a0, _) = book.collect(&bob, -60, 60, Amount::MAX, Amount::MAX);
        assert_eq!(a0, Amount::ZERO);
    }

    #[test]
    fn distinct_ranges_do_not_share() {
        let mut book = PositionBook::new();
        book.credit_owed(&alice(), -60, 60, Amount::new(5), Amount::ZERO);
        let (a0, _) = book.collect(&alice(), -120, 60, Amount::MAX, Amount::MAX);
        assert_eq!(a0, Amount::ZERO);
        assert_eq!(book.len(), 2);
    }
}
