//! Q64.96 square-root price.

use core::fmt;

use primitive_types::U256;

use crate::error::PoolError;

/// `sqrt(1.0001^MIN_TICK) * 2^96`, the lowest representable sqrt price.
pub const MIN_SQRT_RATIO: U256 = U256([4_295_128_739, 0, 0, 0]);

/// `sqrt(1.0001^MAX_TICK) * 2^96`, the exclusive upper sqrt-price bound.
///
/// Decimal value `1461446703485210103287273052203988822378723970342`,
/// a 160-bit quantity.
pub const MAX_SQRT_RATIO: U256 = U256([
    0x5D95_1D52_6398_8D26,
    0xEFD1_FC6A_5064_8849,
    0xFFFD_8963,
    0,
]);

/// The square root of a token1/token0 price, as a Q64.96 fixed-point
/// number.
///
/// A validated value always satisfies
/// `MIN_SQRT_RATIO <= value < MAX_SQRT_RATIO`, matching the domain of
/// the tick conversion functions. The pool's current price, swap price
/// limits, and all curve targets are expressed in this type at the API
/// boundary; the math layer works on the raw [`U256`].
///
/// # Examples
///
/// ```
/// use primitive_types::U256;
/// use tidepool::domain::SqrtPriceX96;
///
/// // Price 1.0: sqrt(1) * 2^96.
/// let parity = SqrtPriceX96::new(U256::from(1u128) << 96);
/// assert!(parity.is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SqrtPriceX96(U256);

impl SqrtPriceX96 {
    /// Lowest valid sqrt price (price at the minimum tick).
    pub const MIN: Self = Self(MIN_SQRT_RATIO);

    /// Creates a new `SqrtPriceX96` with domain validation.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::BadSqrtPriceLimit`] if `value` is below
    /// `MIN_SQRT_RATIO` or at/above `MAX_SQRT_RATIO`.
    pub fn new(value: U256) -> crate::error::Result<Self> {
        if value < MIN_SQRT_RATIO || value >= MAX_SQRT_RATIO {
            return Err(PoolError::BadSqrtPriceLimit(
                "sqrt price outside [MIN_SQRT_RATIO, MAX_SQRT_RATIO)",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the underlying Q64.96 value.
    #[must_use]
    pub const fn get(&self) -> U256 {
        self.0
    }

    /// The sqrt price of parity (price 1.0), `1 << 96`.
    #[must_use]
    pub fn parity() -> Self {
        Self(U256([0, 0x1_0000_0000, 0, 0]))
    }
}

impl fmt::Display for SqrtPriceX96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
