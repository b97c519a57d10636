//! One step of the swap loop.
//!
//! [`compute_swap_step`] decides whether the remaining swap budget is
//! enough to carry the price all the way to the step target (the next
//! initialized tick or the caller's price limit) and produces the input
//! consumed, output produced, and fee taken for the step.

use primitive_types::U256;

use crate::domain::{Rounding, FEE_DENOMINATOR};
use crate::error::{PoolError, Result};
use crate::math::{full_math, sqrt_price_math};

/// Outcome of a single swap step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwapStep {
    /// Price after the step; equals the target when the budget sufficed.
    pub sqrt_price_next_x96: U256,
    /// Input-token amount consumed by the step, fee excluded.
    pub amount_in: U256,
    /// Output-token amount produced by the step.
    pub amount_out: U256,
    /// Fee taken on the step, in input-token units.
    pub fee_amount: U256,
}

/// Computes one swap step between the current price and a target price.
///
/// `amount_remaining` follows the signed convention: positive means
/// exact input (fee comes out of it), negative means exact output.
/// The direction is inferred from the price ordering: a target at or
/// below the current price is a zero-for-one step.
///
/// For an exact-input step that does **not** reach the target, the
/// entire residual of the budget is taken as the fee, so the swap
/// consumes the input exactly.
///
/// # Errors
///
/// - [`PoolError::InvalidConfiguration`] if `fee_pips` is not below the
///   fee denominator.
/// - Any arithmetic error from the underlying price/amount functions.
pub fn compute_swap_step(
    sqrt_ratio_current_x96: U256,
    sqrt_ratio_target_x96: U256,
    liquidity: u128,
    amount_remaining: i128,
    fee_pips: u32,
) -> Result<SwapStep> {
    if fee_pips >= FEE_DENOMINATOR {
        return Err(PoolError::InvalidConfiguration(
            "fee must be below the pip denominator",
        ));
    }

    let zero_for_one = sqrt_ratio_current_x96 >= sqrt_ratio_target_x96;
    let exact_in = amount_remaining >= 0;
    let mut step = SwapStep::default();

    if exact_in {
        let remaining = U256::from(amount_remaining as u128);
        let remaining_less_fee = full_math::mul_div(
            remaining,
            U256::from(FEE_DENOMINATOR - fee_pips),
            U256::from(FEE_DENOMINATOR),
        )?;
        step.amount_in = if zero_for_one {
            sqrt_price_math::amount0_delta(
                sqrt_ratio_target_x96,
                sqrt_ratio_current_x96,
                liquidity,
                Rounding::Up,
            )?
        } else {
            sqrt_price_math::amount1_delta(
                sqrt_ratio_current_x96,
                sqrt_ratio_target_x96,
                liquidity,
                Rounding::Up,
            )?
        };
        step.sqrt_price_next_x96 = if remaining_less_fee >= step.amount_in {
            sqrt_ratio_target_x96
        } else {
            sqrt_price_math::next_sqrt_price_from_input(
                sqrt_ratio_current_x96,
                liquidity,
                remaining_less_fee,
                zero_for_one,
            )?
        };
    } else {
        let remaining_abs = U256::from(amount_remaining.unsigned_abs());
        step.amount_out = if zero_for_one {
            sqrt_price_math::amount1_delta(
                sqrt_ratio_target_x96,
                sqrt_ratio_current_x96,
                liquidity,
                Rounding::Down,
            )?
        } else {
            sqrt_price_math::amount0_delta(
                sqrt_ratio_current_x96,
                sqrt_ratio_target_x96,
                liquidity,
                Rounding::Down,
            )?
        };
        step.sqrt_price_next_x96 = if remaining_abs >= step.amount_out {
            sqrt_ratio_target_x96
        } else {
            sqrt_price_math::next_sqrt_price_from_output(
                sqrt_ratio_current_x96,
                liquidity,
                remaining_abs,
                zero_for_one,
            )?
        };
    }

    let reached_target = sqrt_ratio_target_x96 == step.sqrt_price_next_x96;

    // Recompute the step legs against the achieved price.
    if zero_for_one {
        if !(reached_target && exact_in) {
            step.amount_in = sqrt_price_math::amount0_delta(
                step.sqrt_price_next_x96,
                sqrt_ratio_current_x96,
                liquidity,
                Rounding::Up,
            )?;
        }
        if !(reached_target && !exact_in) {
            step.amount_out = sqrt_price_math::amount1_delta(
                step.sqrt_price_next_x96,
                sqrt_ratio_current_x96,
                liquidity,
                Rounding::Down,
            )?;
        }
    } else {
        if !(reached_target && exact_in) {
            step.amount_in = sqrt_price_math::amount1_delta(
                sqrt_ratio_current_x96,
                step.sqrt_price_next_x96,
                liquidity,
                Rounding::Up,
            )?;
        }
        if !(reached_target && !exact_in) {
            step.amount_out = sqrt_price_math::amount0_delta(
                sqrt_ratio_current_x96,
                step.sqrt_price_next_x96,
                liquidity,
                Rounding::Down,
            )?;
        }
    }

    // Exact output never receives more than requested.
    if !exact_in {
        let remaining_abs = U256::from(amount_remaining.unsigned_abs());
        if step.amount_out > remaining_abs {
            step.amount_out = remaining_abs;
        }
    }

    step.fee_amount = if exact_in && !reached_target {
        // The whole residual budget becomes the fee.
        U256::from(amount_remaining as u128) - step.amount_in
    } else {
        full_math::mul_div_rounding_up(
            step.amount_in,
            U256::from(fee_pips),
            U256::from(FEE_DENOMINATOR - fee_pips),
        )?
    };

    Ok(step)
}
