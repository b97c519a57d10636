//! Multiply-then-divide with full 512-bit intermediates.
//!
//! `floor(a * b / denominator)` and its ceiling variant, computed
//! without losing the high bits of the product. The widening runs
//! through [`U512`]; results must narrow back into 256 bits.

use primitive_types::{U256, U512};

use crate::error::{PoolError, Result};

/// Widens a 256-bit value to 512 bits.
#[inline]
#[must_use]
pub fn widen(x: U256) -> U512 {
    U512([x.0[0], x.0[1], x.0[2], x.0[3], 0, 0, 0, 0])
}

/// Narrows a 512-bit value back to 256 bits.
///
/// # Errors
///
/// Returns [`PoolError::MathOverflow`] if any of the high 256 bits are
/// set.
#[inline]
pub fn narrow(x: U512) -> Result<U256> {
    if x.0[4] != 0 || x.0[5] != 0 || x.0[6] != 0 || x.0[7] != 0 {
        return Err(PoolError::MathOverflow("result exceeds 256 bits"));
    }
    Ok(U256([x.0[0], x.0[1], x.0[2], x.0[3]]))
}

/// Computes `floor(a * b / denominator)` exactly.
///
/// The product is taken at 512 bits, so no intermediate precision is
/// lost for any pair of 256-bit factors.
///
/// # Errors
///
/// - [`PoolError::DivisionByZero`] if `denominator` is zero.
/// - [`PoolError::MathOverflow`] if the quotient does not fit in 256
///   bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(PoolError::DivisionByZero);
    }
    let product = widen(a) * widen(b);
    narrow(product / widen(denominator))
}

/// Computes `ceil(a * b / denominator)` exactly.
///
/// # Errors
///
/// Same conditions as [`mul_div`]; the rounding bump itself can also
/// overflow 256 bits.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(PoolError::DivisionByZero);
    }
    let product = widen(a) * widen(b);
    let denominator = widen(denominator);
    let quotient = product / denominator;
    let quotient = if (product % denominator).is_zero() {
        quotient
    } else {
        quotient + U512::one()
    };
    narrow(quotient)
}

/// Computes `ceil(numerator / denominator)`.
///
/// # Errors
///
/// Returns [`PoolError::DivisionByZero`] if `denominator` is zero.
pub fn div_rounding_up(numerator: U256, denominator: U256) -> Result<U256> {
    if denominator.is_zero() {
        return Err(PoolError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    if (numerator % denominator).is_zero() {
        Ok(quotient)
    } else {
        // quotient < U256::MAX here: a remainder requires denominator > 1.
        Ok(quotient + U256::one())
    }
}
