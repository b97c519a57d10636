//! Token deltas and next-price steps along the sqrt-price curve.
//!
//! For virtual reserves `x = L / sqrt(P)` and `y = L * sqrt(P)`:
//!
//! ```text
//! amount0 between √Pa and √Pb = L * (√Pb - √Pa) / (√Pa * √Pb) * 2^96
//! amount1 between √Pa and √Pb = L * (√Pb - √Pa) / 2^96
//! ```
//!
//! The rounding direction is always explicit: the pool rounds **up** on
//! amounts it is owed and **down** on amounts it pays. Passing the wrong
//! direction is the classic way an implementation leaks value, so there
//! are no defaulted variants.

use primitive_types::{U256, U512};

use crate::domain::Rounding;
use crate::error::{PoolError, Result};
use crate::math::full_math::{narrow, widen};
use crate::math::{full_math, Q96};

/// Upper bound for a Q64.96 sqrt price: 160 bits.
const MAX_U160: U256 = U256([u64::MAX, u64::MAX, 0xffff_ffff, 0]);

/// Computes the token0 amount for `liquidity` moving between two sqrt
/// prices.
///
/// `amount0 = L * 2^96 * (√Pb - √Pa) / (√Pa * √Pb)` with the bounds
/// sorted internally.
///
/// # Errors
///
/// - [`PoolError::DivisionByZero`] if the lower sqrt price is zero.
/// - [`PoolError::MathOverflow`] if the amount exceeds 256 bits.
pub fn amount0_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    rounding: Rounding,
) -> Result<U256> {
    let (lower, upper) = if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    } else {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96)
    };
    if lower.is_zero() {
        return Err(PoolError::DivisionByZero);
    }

    let numerator1 = widen(U256::from(liquidity)) << 96;
    let numerator2 = widen(upper - lower);
    let product = numerator1 * numerator2;

    match rounding {
        Rounding::Up => {
            // ceil(ceil(product / upper) / lower)
            let upper = widen(upper);
            let mut inner = product / upper;
            if !(product % upper).is_zero() {
                inner = inner + U512::one();
            }
            let lower = widen(lower);
            let mut outer = inner / lower;
            if !(inner % lower).is_zero() {
                outer = outer + U512::one();
            }
            narrow(outer)
        }
        Rounding::Down => narrow(product / widen(upper) / widen(lower)),
    }
}

/// Computes the token1 amount for `liquidity` moving between two sqrt
/// prices.
///
/// `amount1 = L * (√Pb - √Pa) / 2^96` with the bounds sorted internally.
///
/// # Errors
///
/// Returns [`PoolError::MathOverflow`] if the amount exceeds 256 bits.
pub fn amount1_delta(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: u128,
    rounding: Rounding,
) -> Result<U256> {
    let (lower, upper) = if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        (sqrt_ratio_b_x96, sqrt_ratio_a_x96)
    } else {
        (sqrt_ratio_a_x96, sqrt_ratio_b_x96)
    };
    match rounding {
        Rounding::Up => full_math::mul_div_rounding_up(U256::from(liquidity), upper - lower, Q96),
        Rounding::Down => full_math::mul_div(U256::from(liquidity), upper - lower, Q96),
    }
}

/// Computes the sqrt price after consuming `amount_in` of the input
/// token.
///
/// For `zero_for_one` the input is token0 and the price moves down,
/// rounding up so the pool never under-quotes itself; otherwise the
/// input is token1 and the price moves up, rounding down.
///
/// # Errors
///
/// - [`PoolError::ZeroAmount`] if `liquidity` is zero.
/// - [`PoolError::DivisionByZero`] if `sqrt_price_x96` is zero.
/// - [`PoolError::MathOverflow`] if the next price exceeds 160 bits.
pub fn next_sqrt_price_from_input(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256> {
    if liquidity == 0 {
        return Err(PoolError::ZeroAmount("liquidity for price step"));
    }
    if sqrt_price_x96.is_zero() {
        return Err(PoolError::DivisionByZero);
    }
    if amount_in.is_zero() {
        return Ok(sqrt_price_x96);
    }

    if zero_for_one {
        // √P' = L·√P·2^96 / (L·2^96 + amount·√P), rounded up.
        let numerator1 = widen(U256::from(liquidity)) << 96;
        let numerator = numerator1 * widen(sqrt_price_x96);
        let denominator = numerator1 + widen(amount_in) * widen(sqrt_price_x96);
        let mut quotient = numerator / denominator;
        if !(numerator % denominator).is_zero() {
            quotient = quotient + U512::one();
        }
        narrow(quotient)
    } else {
        // √P' = √P + amount·2^96 / L, rounded down.
        let quotient = full_math::mul_div(amount_in, Q96, U256::from(liquidity))?;
        let next = sqrt_price_x96
            .checked_add(quotient)
            .ok_or(PoolError::MathOverflow("next sqrt price"))?;
        if next > MAX_U160 {
            return Err(PoolError::MathOverflow("next sqrt price exceeds 160 bits"));
        }
        Ok(next)
    }
}

/// Computes the sqrt price after paying out `amount_out` of the output
/// token.
///
/// For `zero_for_one` the output is token1 and the price moves down;
/// otherwise the output is token0 and the price moves up. Both branches
/// round in the pool's favor.
///
/// # Errors
///
/// - [`PoolError::ZeroAmount`] if `liquidity` is zero.
/// - [`PoolError::MathOverflow`] if the requested output exceeds what
///   the range can provide or the next price leaves 160 bits.
pub fn next_sqrt_price_from_output(
    sqrt_price_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256> {
    if liquidity == 0 {
        return Err(PoolError::ZeroAmount("liquidity for price step"));
    }
    if sqrt_price_x96.is_zero() {
        return Err(PoolError::DivisionByZero);
    }

    if zero_for_one {
        // √P' = √P - ceil(amount·2^96 / L)
        let quotient = full_math::mul_div_rounding_up(amount_out, Q96, U256::from(liquidity))?;
        if sqrt_price_x96 <= quotient {
            return Err(PoolError::MathOverflow("output exceeds range reserves"));
        }
        Ok(sqrt_price_x96 - quotient)
    } else {
        // √P' = L·√P·2^96 / (L·2^96 - amount·√P), rounded up.
        let numerator1 = widen(U256::from(liquidity)) << 96;
        let product = widen(amount_out) * widen(sqrt_price_x96);
        if numerator1 <= product {
            return Err(PoolError::MathOverflow("output exceeds range reserves"));
        }
        let denominator = numerator1 - product;
        let numerator = numerator1 * widen(sqrt_price_x96);
        let mut quotient = numerator / denominator;
        if !(numerator % denominator).is_zero() {
            quotient = quotient + U512::one();
        }
        let next = narrow(quotient)?;
        if next > MAX_U160 {
            return Err(PoolError::MathOverflow("next sqrt price exceeds 160 bits"));
        }
        Ok(next)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::math::tick_math::sqrt_ratio_at_tick;

    fn q96() -> U256 {
        Q96
    }

    // -- amount0_delta ------------------------------------------------------

    #[test]
    fn amount0_zero_liquidity() {
        let Ok(a) = amount0_delta(q96(), q96() << 1, 0, Rounding::Up) else {
            panic!("expected Ok");
        };
        assert_eq!(a, U256::zero());
    }

    #[test]
    fn amount0_equal_prices_is_zero() {
        let Ok(a) = amount0_delta(q96(), q96(), 1_000_000, Rounding::Up) else {
            panic!("expected Ok");
        };
        assert_eq!(a, U256::zero());
    }

    #[test]
    fn amount0_price_doubling() {
        // From price 1 to price 4 (sqrt 1 -> 2): amount0 = L * (2-1)/(1*2) = L/2.
        let Ok(a) = amount0_delta(q96(), q96() * 2u64, 1_000_000, Rounding::Down) else {
            panic!("expected Ok");
        };
        assert_eq!(a, U256::from(500_000u64));
    }

    #[test]
    fn amount0_order_insensitive() {
        let lo = q96();
        let hi = q96() * 3u64 / 2u64;
        let Ok(a) = amount0_delta(lo, hi, 77_777, Rounding::Up) else {
            panic!("expected Ok");
        };
        let Ok(b) = amount0_delta(hi, lo, 77_777, Rounding::Up) else {
            panic!("expected Ok");
        };
        assert_eq!(a, b);
    }

    #[test]
    fn amount0_round_up_ge_round_down() {
        let Ok(lo) = sqrt_ratio_at_tick(-600) else {
            panic!("expected Ok");
        };
        let Ok(hi) = sqrt_ratio_at_tick(600) else {
            panic!("expected Ok");
        };
        let Ok(up) = amount0_delta(lo, hi, 10u128.pow(18), Rounding::Up) else {
            panic!("expected Ok");
        };
        let Ok(down) = amount0_delta(lo, hi, 10u128.pow(18), Rounding::Down) else {
            panic!("expected Ok");
        };
        assert!(up >= down);
        assert!(up - down <= U256::one());
    }

    #[test]
    fn amount0_zero_lower_price_rejected() {
        assert_eq!(
            amount0_delta(U256::zero(), q96(), 1, Rounding::Up),
            Err(PoolError::DivisionByZero)
        );
    }

    // -- amount1_delta ------------------------------------------------------

    #[test]
    fn amount1_price_doubling() {
        // amount1 = L * (2-1) = L for sqrt going 1 -> 2.
        let Ok(a) = amount1_delta(q96(), q96() * 2u64, 1_000_000, Rounding::Down) else {
            panic!("expected Ok");
        };
        assert_eq!(a, U256::from(1_000_000u64));
    }

    #[test]
    fn amount1_round_up_ge_round_down() {
        let Ok(lo) = sqrt_ratio_at_tick(-600) else {
            panic!("expected Ok");
        };
        let Ok(hi) = sqrt_ratio_at_tick(600) else {
            panic!("expected Ok");
        };
        let Ok(up) = amount1_delta(lo, hi, 10u128.pow(18), Rounding::Up) else {
            panic!("expected Ok");
        };
        let Ok(down) = amount1_delta(lo, hi, 10u128.pow(18), Rounding::Down) else {
            panic!("expected Ok");
        };
        assert!(up >= down);
        assert!(up - down <= U256::one());
    }

    // -- next_sqrt_price_from_input -----------------------------------------

    #[test]
    fn input_zero_amount_keeps_price() {
        let Ok(p) = next_sqrt_price_from_input(q96(), 1_000_000, U256::zero(), true) else {
            panic!("expected Ok");
        };
        assert_eq!(p, q96());
    }

    #[test]
    fn input_zero_liquidity_rejected() {
        assert!(next_sqrt_price_from_input(q96(), 0, U256::one(), true).is_err());
    }

    #[test]
    fn input_token0_moves_price_down() {
        let Ok(p) = next_sqrt_price_from_input(q96(), 10u128.pow(18), U256::from(10u64.pow(17)), true)
        else {
            panic!("expected Ok");
        };
        assert!(p < q96());
    }

    #[test]
    fn input_token1_moves_price_up() {
        let Ok(p) =
            next_sqrt_price_from_input(q96(), 10u128.pow(18), U256::from(10u64.pow(17)), false)
        else {
            panic!("expected Ok");
        };
        assert!(p > q96());
    }

    #[test]
    fn input_token1_exact_quotient() {
        // amount * 2^96 / L with L = amount gives exactly one Q96 step.
        let amount = 10u128.pow(18);
        let Ok(p) = next_sqrt_price_from_input(q96(), amount, U256::from(amount), false) else {
            panic!("expected Ok");
        };
        assert_eq!(p, q96() * 2u64);
    }

    #[test]
    fn input_round_trip_consistency() {
        // The amount implied by the returned price never exceeds the input.
        let liquidity = 10u128.pow(18);
        let amount = U256::from(123_456_789u64);
        let Ok(next) = next_sqrt_price_from_input(q96(), liquidity, amount, true) else {
            panic!("expected Ok");
        };
        let Ok(used) = amount0_delta(next, q96(), liquidity, Rounding::Down) else {
            panic!("expected Ok");
        };
        assert!(used <= amount);
    }

    // -- next_sqrt_price_from_output ----------------------------------------

    #[test]
    fn output_token1_moves_price_down() {
        let Ok(p) =
            next_sqrt_price_from_output(q96(), 10u128.pow(18), U256::from(10u64.pow(17)), true)
        else {
            panic!("expected Ok");
        };
        assert!(p < q96());
    }

    #[test]
    fn output_token0_moves_price_up() {
        let Ok(p) =
            next_sqrt_price_from_output(q96(), 10u128.pow(18), U256::from(10u64.pow(17)), false)
        else {
            panic!("expected Ok");
        };
        assert!(p > q96());
    }

    #[test]
    fn output_draining_range_rejected() {
        // Asking for the whole virtual reserve of token1 empties the range.
        let liquidity = 1_000_000u128;
        let result = next_sqrt_price_from_output(q96(), liquidity, U256::from(2_000_000u64), true);
        assert!(matches!(result, Err(PoolError::MathOverflow(_))));
    }

    #[test]
    fn output_token0_excess_rejected() {
        // product >= numerator1: the range cannot provide that much token0.
        let result =
            next_sqrt_price_from_output(q96(), 1_000_000, U256::from(2_000_000u64), false);
        assert!(matches!(result, Err(PoolError::MathOverflow(_))));
    }

    // -- rounding asymmetry --------------------------------------------------

    #[test]
    fn input_price_rounds_in_pools_favor() {
        // For token0 input the price rounds up (pool keeps a sliver).
        let liquidity = 10u128.pow(12);
        let amount = U256::from(997u64);
        let Ok(next_up) = next_sqrt_price_from_input(q96(), liquidity, amount, true) else {
            panic!("expected Ok");
        };
        // Exact rational value would be <= next_up by construction.
        let Ok(back) = amount0_delta(next_up, q96(), liquidity, Rounding::Up) else {
            panic!("expected Ok");
        };
        assert!(back >= amount || back + U256::one() >= amount);
    }
}
