//! The swap loop.
//!
//! Each iteration finds the next candidate tick from the bitmap, swaps
//! toward it (or the caller's price limit, whichever is nearer), takes
//! the fee, and crosses the tick when the step reaches it. The loop
//! stops when the budget is spent or the price limit is hit. The oracle
//! observation for the current block is computed lazily, at most once
//! per swap, on the first initialized-tick crossing.

use primitive_types::U256;
use tracing::debug;

use crate::domain::{
    AccountId, Amount, AmountDelta, Liquidity, SqrtPriceX96, SwapResult, SwapSpec, Tick,
    MAX_SQRT_RATIO, MIN_SQRT_RATIO,
};
use crate::error::{PoolError, Result};
use crate::events::PoolEvent;
use crate::math::{full_math, liquidity_math, swap_math, tick_math, Q128};
use crate::pool::{to_i128, Pool};
use crate::traits::{Reserves, SwapCallback};

/// Values fixed for the duration of one swap.
struct SwapCache {
    /// Protocol-fee denominator for the input token (0 = off).
    fee_protocol: u8,
    /// In-range liquidity at entry.
    liquidity_start: u128,
    /// Oracle accumulators as of this block, filled on first crossing.
    tick_cumulative: i64,
    seconds_per_liquidity_cumulative_x128: U256,
    computed_latest_observation: bool,
}

/// Running state of the loop, committed at the end.
struct SwapState {
    amount_specified_remaining: i128,
    amount_calculated: i128,
    sqrt_price_x96: U256,
    tick: i32,
    fee_growth_global_x128: U256,
    protocol_fee: u128,
    liquidity: u128,
}

/// Per-iteration scratch.
#[derive(Default)]
struct StepComputations {
    sqrt_price_start_x96: U256,
    tick_next: i32,
    initialized: bool,
    sqrt_price_next_x96: U256,
}

impl<R: Reserves> Pool<R> {
    /// Swaps along the price curve.
    ///
    /// `zero_for_one` sells token0 for token1 (price moves down);
    /// otherwise token1 for token0. The spec fixes either the input or
    /// the output leg; the walk stops at `sqrt_price_limit` if the
    /// budget outlasts the curve.
    ///
    /// The recipient is paid the output first; the callback must then
    /// settle the input side, verified by a balance check.
    ///
    /// A walk through empty ranges moves the price and tick without
    /// moving tokens; such a swap returns `(0, 0)` deltas and still
    /// commits the new price.
    ///
    /// # Errors
    ///
    /// - [`PoolError::BadSqrtPriceLimit`] for a limit on the wrong side
    ///   of the current price or outside the open ratio interval.
    /// - [`PoolError::InsufficientPayment`] if the callback settles
    ///   short.
    ///
    /// Any error restores the pre-swap pool state.
    #[allow(clippy::too_many_arguments)]
    pub fn swap<C: SwapCallback<R>>(
        &mut self,
        recipient: AccountId,
        zero_for_one: bool,
        spec: SwapSpec,
        sqrt_price_limit_x96: SqrtPriceX96,
        data: &[u8],
        callback: &mut C,
        time: u32,
    ) -> Result<SwapResult> {
        let saved = self.begin()?;
        let result = self.swap_inner(
            recipient,
            zero_for_one,
            spec,
            sqrt_price_limit_x96,
            data,
            callback,
            time,
        );
        match result {
            Ok(v) => {
                self.commit();
                Ok(v)
            }
            Err(e) => {
                self.state = saved;
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn swap_inner<C: SwapCallback<R>>(
        &mut self,
        recipient: AccountId,
        zero_for_one: bool,
        spec: SwapSpec,
        sqrt_price_limit_x96: SqrtPriceX96,
        data: &[u8],
        callback: &mut C,
        time: u32,
    ) -> Result<SwapResult> {
        let amount_specified = spec.amount_specified();
        let slot0_start = self.state.slot0;
        let limit = sqrt_price_limit_x96.get();

        if zero_for_one {
            if limit >= slot0_start.sqrt_price_x96 || limit <= MIN_SQRT_RATIO {
                return Err(PoolError::BadSqrtPriceLimit(
                    "limit must be below the price and above the minimum ratio",
                ));
            }
        } else if limit <= slot0_start.sqrt_price_x96 || limit >= MAX_SQRT_RATIO {
            return Err(PoolError::BadSqrtPriceLimit(
                "limit must be above the price and below the maximum ratio",
            ));
        }

        let mut cache = SwapCache {
            fee_protocol: slot0_start.fee_protocol.for_direction(zero_for_one),
            liquidity_start: self.state.liquidity,
            tick_cumulative: 0,
            seconds_per_liquidity_cumulative_x128: U256::zero(),
            computed_latest_observation: false,
        };
        let exact_input = amount_specified > 0;
        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: 0,
            sqrt_price_x96: slot0_start.sqrt_price_x96,
            tick: slot0_start.tick,
            fee_growth_global_x128: if zero_for_one {
                self.state.fee_growth_global_0_x128
            } else {
                self.state.fee_growth_global_1_x128
            },
            protocol_fee: 0,
            liquidity: cache.liquidity_start,
        };

        while state.amount_specified_remaining != 0 && state.sqrt_price_x96 != limit {
            let mut step = StepComputations {
                sqrt_price_start_x96: state.sqrt_price_x96,
                ..StepComputations::default()
            };

            (step.tick_next, step.initialized) = self
                .state
                .bitmap
                .next_initialized_tick_within_one_word(
                    state.tick,
                    self.tick_spacing(),
                    zero_for_one,
                );
            // The bitmap is unaware of the tick domain edges.
            step.tick_next = step.tick_next.clamp(Tick::MIN.get(), Tick::MAX.get());
            step.sqrt_price_next_x96 = tick_math::sqrt_ratio_at_tick(step.tick_next)?;

            let target = if zero_for_one {
                step.sqrt_price_next_x96.max(limit)
            } else {
                step.sqrt_price_next_x96.min(limit)
            };
            let computed = swap_math::compute_swap_step(
                state.sqrt_price_x96,
                target,
                state.liquidity,
                state.amount_specified_remaining,
                self.fee().get(),
            )?;
            state.sqrt_price_x96 = computed.sqrt_price_next_x96;
            let amount_in = to_i128(computed.amount_in)?;
            let amount_out = to_i128(computed.amount_out)?;
            let mut fee_amount = to_i128(computed.fee_amount)?;

            if exact_input {
                state.amount_specified_remaining = state
                    .amount_specified_remaining
                    .checked_sub(
                        amount_in
                            .checked_add(fee_amount)
                            .ok_or(PoolError::MathOverflow("swap input leg"))?,
                    )
                    .ok_or(PoolError::MathOverflow("swap input leg"))?;
                state.amount_calculated = state
                    .amount_calculated
                    .checked_sub(amount_out)
                    .ok_or(PoolError::MathOverflow("swap output leg"))?;
            } else {
                state.amount_specified_remaining = state
                    .amount_specified_remaining
                    .checked_add(amount_out)
                    .ok_or(PoolError::MathOverflow("swap output leg"))?;
                state.amount_calculated = state
                    .amount_calculated
                    .checked_add(
                        amount_in
                            .checked_add(fee_amount)
                            .ok_or(PoolError::MathOverflow("swap input leg"))?,
                    )
                    .ok_or(PoolError::MathOverflow("swap input leg"))?;
            }

            // Split the protocol's cut out of the step fee.
            if cache.fee_protocol > 0 {
                let delta = fee_amount / i128::from(cache.fee_protocol);
                fee_amount -= delta;
                state.protocol_fee = state.protocol_fee.saturating_add(delta.unsigned_abs());
            }

            if state.liquidity > 0 {
                let growth = full_math::mul_div(
                    U256::from(fee_amount.unsigned_abs()),
                    Q128,
                    U256::from(state.liquidity),
                )?;
                state.fee_growth_global_x128 =
                    state.fee_growth_global_x128.overflowing_add(growth).0;
            }

            if state.sqrt_price_x96 == step.sqrt_price_next_x96 {
                // The step reached a tick boundary.
                if step.initialized {
                    if !cache.computed_latest_observation {
                        let (tick_cumulative, seconds_per_liquidity) =
                            self.state.observations.observe_single(
                                time,
                                0,
                                slot0_start.tick,
                                slot0_start.observation_index,
                                cache.liquidity_start,
                                slot0_start.observation_cardinality,
                            )?;
                        cache.tick_cumulative = tick_cumulative;
                        cache.seconds_per_liquidity_cumulative_x128 = seconds_per_liquidity;
                        cache.computed_latest_observation = true;
                    }

                    // Fee growth of the input side comes from the loop
                    // state; the output side is untouched this swap.
                    let mut liquidity_net = self.state.ticks.cross(
                        step.tick_next,
                        if zero_for_one {
                            state.fee_growth_global_x128
                        } else {
                            self.state.fee_growth_global_0_x128
                        },
                        if zero_for_one {
                            self.state.fee_growth_global_1_x128
                        } else {
                            state.fee_growth_global_x128
                        },
                        cache.seconds_per_liquidity_cumulative_x128,
                        cache.tick_cumulative,
                        time,
                    );
                    if zero_for_one {
                        liquidity_net = liquidity_net
                            .checked_neg()
                            .ok_or(PoolError::MathOverflow("net liquidity negation"))?;
                    }
                    state.liquidity = liquidity_math::add_delta(state.liquidity, liquidity_net)?;
                }
                state.tick = if zero_for_one {
                    step.tick_next - 1
                } else {
                    step.tick_next
                };
            } else if state.sqrt_price_x96 != step.sqrt_price_start_x96 {
                // Moved within the range: recompute the tick.
                state.tick = tick_math::tick_at_sqrt_ratio(state.sqrt_price_x96)?;
            }
        }

        // Commit root state.
        if state.tick != slot0_start.tick {
            let (index, cardinality) = self.state.observations.write(
                slot0_start.observation_index,
                time,
                slot0_start.tick,
                cache.liquidity_start,
                slot0_start.observation_cardinality,
                slot0_start.observation_cardinality_next,
            );
            self.state.slot0.observation_index = index;
            self.state.slot0.observation_cardinality = cardinality;
        }
        self.state.slot0.sqrt_price_x96 = state.sqrt_price_x96;
        self.state.slot0.tick = state.tick;

        if cache.liquidity_start != state.liquidity {
            self.state.liquidity = state.liquidity;
        }

        // Fee growth and protocol fees accrue on the input side only.
        // Owed-fee overflow clamps; the protocol withdraws before then.
        if zero_for_one {
            self.state.fee_growth_global_0_x128 = state.fee_growth_global_x128;
            if state.protocol_fee > 0 {
                self.state.protocol_fees.token0 = self
                    .state
                    .protocol_fees
                    .token0
                    .saturating_add(&Amount::new(state.protocol_fee));
            }
        } else {
            self.state.fee_growth_global_1_x128 = state.fee_growth_global_x128;
            if state.protocol_fee > 0 {
                self.state.protocol_fees.token1 = self
                    .state
                    .protocol_fees
                    .token1
                    .saturating_add(&Amount::new(state.protocol_fee));
            }
        }

        let (amount0, amount1) = if zero_for_one == exact_input {
            (
                amount_specified - state.amount_specified_remaining,
                state.amount_calculated,
            )
        } else {
            (
                state.amount_calculated,
                amount_specified - state.amount_specified_remaining,
            )
        };

        // Settle: pay the output, then demand the input via callback.
        if zero_for_one {
            if amount1 < 0 {
                self.reserves
                    .transfer1(&recipient, Amount::new(amount1.unsigned_abs()))?;
            }
            let balance0_before = self.reserves.balance0();
            callback.swap_callback(
                &mut self.reserves,
                AmountDelta::new(amount0),
                AmountDelta::new(amount1),
                data,
            )?;
            let required = balance0_before
                .checked_add(&Amount::new(amount0.unsigned_abs()))
                .ok_or(PoolError::MathOverflow("token0 balance"))?;
            if self.reserves.balance0() < required {
                return Err(PoolError::InsufficientPayment("token0 for swap"));
            }
        } else {
            if amount0 < 0 {
                self.reserves
                    .transfer0(&recipient, Amount::new(amount0.unsigned_abs()))?;
            }
            let balance1_before = self.reserves.balance1();
            callback.swap_callback(
                &mut self.reserves,
                AmountDelta::new(amount0),
                AmountDelta::new(amount1),
                data,
            )?;
            let required = balance1_before
                .checked_add(&Amount::new(amount1.unsigned_abs()))
                .ok_or(PoolError::MathOverflow("token1 balance"))?;
            if self.reserves.balance1() < required {
                return Err(PoolError::InsufficientPayment("token1 for swap"));
            }
        }

        let result = SwapResult::new(
            AmountDelta::new(amount0),
            AmountDelta::new(amount1),
            SqrtPriceX96::new(state.sqrt_price_x96)?,
            Liquidity::new(state.liquidity),
            Tick::new(state.tick)?,
        );
        self.state.events.push(PoolEvent::Swap {
            recipient,
            amount0: AmountDelta::new(amount0),
            amount1: AmountDelta::new(amount1),
            sqrt_price_x96: state.sqrt_price_x96,
            liquidity: Liquidity::new(state.liquidity),
            tick: Tick::new(state.tick)?,
        });
        debug!(
            amount0,
            amount1,
            tick = state.tick,
            liquidity = state.liquidity,
            "swap"
        );
        Ok(result)
    }
}
