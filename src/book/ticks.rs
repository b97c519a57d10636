//! Per-tick liquidity and outside-accumulator records.
//!
//! Each initialized tick tracks the gross liquidity referencing it, the
//! signed net liquidity applied when the price crosses it, and a set of
//! "outside" accumulators. An outside value represents the accumulator
//! total over all time the price has spent on the far side of the tick
//! from where it currently is; crossing the tick flips every outside
//! value to `global - outside`. Fee-growth arithmetic wraps modulo
//! 2^256 by design, so differences between accumulators stay valid.

use std::collections::BTreeMap;

use primitive_types::U256;

use crate::error::{PoolError, Result};
use crate::math::liquidity_math;

/// State stored for one initialized tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickState {
    /// Sum of |Δliquidity| of positions using this tick as a bound.
    /// Zero is equivalent to "uninitialized".
    pub liquidity_gross: u128,
    /// Liquidity added when the tick is crossed left-to-right; negated
    /// for right-to-left crossings.
    pub liquidity_net: i128,
    /// Fee growth of token0 on the far side of this tick (Q128.128).
    pub fee_growth_outside_0_x128: U256,
    /// Fee growth of token1 on the far side of this tick (Q128.128).
    pub fee_growth_outside_1_x128: U256,
    /// Tick-cumulative on the far side of this tick.
    pub tick_cumulative_outside: i64,
    /// Seconds-per-liquidity on the far side of this tick (Q128.128).
    pub seconds_per_liquidity_outside_x128: U256,
    /// Seconds spent on the far side of this tick.
    pub seconds_outside: u32,
    /// Set on first initialization. Redundant with `liquidity_gross != 0`
    /// but kept so the flip decision reads off one field.
    pub initialized: bool,
}

/// The tick-indexed liquidity book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickBook {
    ticks: BTreeMap<i32, TickState>,
}

impl TickBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `tick`, if initialized.
    #[must_use]
    pub fn get(&self, tick: i32) -> Option<&TickState> {
        self.ticks.get(&tick)
    }

    /// Number of initialized ticks; used by consistency checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Returns `true` if no tick is initialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Iterates over `(tick, state)` in ascending tick order.
    pub fn iter(&self) -> impl Iterator<Item = (&i32, &TickState)> {
        self.ticks.iter()
    }

    /// Applies a liquidity delta to a tick bound.
    ///
    /// Returns `true` if the tick flipped between initialized and
    /// uninitialized, in which case the caller must update the bitmap.
    ///
    /// A tick initialized at or below the current tick seeds its outside
    /// accumulators from the globals: by convention, all growth before
    /// initialization is attributed to the side below the tick.
    ///
    /// # Errors
    ///
    /// - [`PoolError::LiquidityOverflow`] if gross liquidity would exceed
    ///   `max_liquidity` or the net value leaves `i128`.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        tick: i32,
        tick_current: i32,
        liquidity_delta: i128,
        fee_growth_global_0_x128: U256,
        fee_growth_global_1_x128: U256,
        seconds_per_liquidity_cumulative_x128: U256,
        tick_cumulative: i64,
        time: u32,
        upper: bool,
        max_liquidity: u128,
    ) -> Result<bool> {
        let state = self.ticks.entry(tick).or_default();

        let gross_before = state.liquidity_gross;
        let gross_after = liquidity_math::add_delta(gross_before, liquidity_delta)?;
        if gross_after > max_liquidity {
            return Err(PoolError::LiquidityOverflow(
                "tick gross liquidity above per-tick cap",
            ));
        }

        let flipped = (gross_after == 0) != (gross_before == 0);

        if gross_before == 0 {
            if tick <= tick_current {
                state.fee_growth_outside_0_x128 = fee_growth_global_0_x128;
                state.fee_growth_outside_1_x128 = fee_growth_global_1_x128;
                state.seconds_per_liquidity_outside_x128 =
                    seconds_per_liquidity_cumulative_x128;
                state.tick_cumulative_outside = tick_cumulative;
                state.seconds_outside = time;
            }
            state.initialized = true;
        }

        state.liquidity_gross = gross_after;
        state.liquidity_net = if upper {
            state
                .liquidity_net
                .checked_sub(liquidity_delta)
                .ok_or(PoolError::LiquidityOverflow("tick net liquidity"))?
        } else {
            state
                .liquidity_net
                .checked_add(liquidity_delta)
                .ok_or(PoolError::LiquidityOverflow("tick net liquidity"))?
        };

        Ok(flipped)
    }

    /// Erases a tick record.
    pub fn clear(&mut self, tick: i32) {
        self.ticks.remove(&tick);
    }

    /// Transitions a tick as the price crosses it, mirroring every
    /// outside accumulator to `global - outside`, and returns the
    /// signed net liquidity to apply (the caller negates it when moving
    /// right to left).
    pub fn cross(
        &mut self,
        tick: i32,
        fee_growth_global_0_x128: U256,
        fee_growth_global_1_x128: U256,
        seconds_per_liquidity_cumulative_x128: U256,
        tick_cumulative: i64,
        time: u32,
    ) -> i128 {
        let Some(state) = self.ticks.get_mut(&tick) else {
            return 0;
        };
        state.fee_growth_outside_0_x128 = fee_growth_global_0_x128
            .overflowing_sub(state.fee_growth_outside_0_x128)
            .0;
        state.fee_growth_outside_1_x128 = fee_growth_global_1_x128
            .overflowing_sub(state.fee_growth_outside_1_x128)
            .0;
        state.seconds_per_liquidity_outside_x128 = seconds_per_liquidity_cumulative_x128
            .overflowing_sub(state.seconds_per_liquidity_outside_x128)
            .0;
        state.tick_cumulative_outside =
            tick_cumulative.wrapping_sub(state.tick_cumulative_outside);
        state.seconds_outside = time.wrapping_sub(state.seconds_outside);
        state.liquidity_net
    }

    /// Computes the fee growth inside `[lower, upper]` from the two
    /// bounds' outside accumulators and the globals.
    ///
    /// Pure accumulator algebra with wrap-around subtraction:
    /// `inside = global - below(lower) - above(upper)`.
    #[must_use]
    pub fn fee_growth_inside(
        &self,
        lower: i32,
        upper: i32,
        tick_current: i32,
        fee_growth_global_0_x128: U256,
        fee_growth_global_1_x128: U256,
    ) -> (U256, U256) {
        let lower_outside = self
            .ticks
            .get(&lower)
            .map(|s| (s.fee_growth_outside_0_x128, s.fee_growth_outside_1_x128))
            .unwrap_or_default();
        let upper_outside = self
            .ticks
            .get(&upper)
            .map(|s| (s.fee_growth_outside_0_x128, s.fee_growth_outside_1_x128))
            .unwrap_or_default();

        let (below_0, below_1) = if tick_current >= lower {
            lower_outside
        } else {
            (
                fee_growth_global_0_x128.overflowing_sub(lower_outside.0).0,
                fee_growth_global_1_x128.overflowing_sub(lower_outside.1).0,
            )
        };

        let (above_0, above_1) = if tick_current < upper {
            upper_outside
        } else {
            (
                fee_growth_global_0_x128.overflowing_sub(upper_outside.0).0,
                fee_growth_global_1_x128.overflowing_sub(upper_outside.1).0,
            )
        };

        (
            fee_growth_global_0_x128
                .overflowing_sub(below_0)
                .0
                .overflowing_sub(above_0)
                .0,
            fee_growth_global_1_x128
                .overflowing_sub(below_1)
                .0
                .overflowing_sub(above_1)
                .0,
        )
    }
}
