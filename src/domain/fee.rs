//! Trade-fee rate and protocol-fee split.

use core::fmt;

use crate::error::PoolError;

/// Denominator of the pip-based fee rate: one pip is 10⁻⁶.
pub const FEE_DENOMINATOR: u32 = 1_000_000;

/// The pool's trade fee in hundredths of a basis point (pips).
///
/// A fee of `3000` is 0.30%. The rate is immutable for the lifetime of
/// a pool and must be strictly below the denominator of 10⁶.
///
/// # Examples
///
/// ```
/// use tidepool::domain::FeePips;
///
/// let fee = FeePips::new(3_000);
/// assert!(fee.is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeePips(u32);

impl FeePips {
    /// Creates a new fee rate.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] if `pips` is not
    /// strictly below 10⁶.
    pub const fn new(pips: u32) -> crate::error::Result<Self> {
        if pips >= FEE_DENOMINATOR {
            return Err(PoolError::InvalidConfiguration(
                "fee must be below 1_000_000 pips",
            ));
        }
        Ok(Self(pips))
    }

    /// Returns the fee in pips.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for FeePips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}pips", self.0)
    }
}

/// The protocol's share of swap fees, one nibble per token.
///
/// Each nibble is the *denominator* of the protocol's cut: a value of
/// `n` sends `1/n` of every fee step to the protocol. Valid nibbles are
/// `0` (disabled) or `4..=10`. The low nibble applies to token0 fees,
/// the high nibble to token1 fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeeProtocol(u8);

impl FeeProtocol {
    /// Protocol fee disabled for both tokens.
    pub const OFF: Self = Self(0);

    /// Packs two per-token denominators into a `FeeProtocol`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::BadFeeProtocol`] unless each value is `0`
    /// or in `[4, 10]`.
    pub const fn from_parts(fee0: u8, fee1: u8) -> crate::error::Result<Self> {
        if !(fee0 == 0 || (fee0 >= 4 && fee0 <= 10)) {
            return Err(PoolError::BadFeeProtocol("token0 share must be 0 or 4..=10"));
        }
        if !(fee1 == 0 || (fee1 >= 4 && fee1 <= 10)) {
            return Err(PoolError::BadFeeProtocol("token1 share must be 0 or 4..=10"));
        }
        Ok(Self(fee0 | (fee1 << 4)))
    }

    /// Returns the packed byte.
    #[must_use]
    pub const fn packed(&self) -> u8 {
        self.0
    }

    /// Denominator of the protocol cut on token0 fees (0 = disabled).
    #[must_use]
    pub const fn token0(&self) -> u8 {
        self.0 % 16
    }

    /// Denominator of the protocol cut on token1 fees (0 = disabled).
    #[must_use]
    pub const fn token1(&self) -> u8 {
        self.0 >> 4
    }

    /// Returns the denominator for the swap's input token.
    #[must_use]
    pub const fn for_direction(&self, zero_for_one: bool) -> u8 {
        if zero_for_one {
            self.token0()
        } else {
            self.token1()
        }
    }
}

impl fmt::Display for FeeProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{} | 1/{}", self.token0(), self.token1())
    }
}
