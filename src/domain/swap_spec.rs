//! Swap operation specification.

use core::fmt;

use super::Amount;
use crate::error::PoolError;

/// Specifies what constraint drives a swap: either an exact input amount
/// or an exact output amount.
///
/// # Invariants
///
/// The contained amount is non-zero and fits the engine's signed
/// accounting range (`i128`).
///
/// # Examples
///
/// ```
/// use tidepool::domain::{Amount, SwapSpec};
///
/// let spec = SwapSpec::exact_in(Amount::new(1000));
/// assert!(spec.is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapSpec {
    /// The caller provides an exact input amount.
    ExactIn {
        /// The fixed input amount (always non-zero).
        amount_in: Amount,
    },
    /// The caller requests an exact output amount.
    ExactOut {
        /// The desired output amount (always non-zero).
        amount_out: Amount,
    },
}

impl SwapSpec {
    /// Creates an exact-input swap specification.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroAmount`] if `amount` is zero.
    /// - [`PoolError::MathOverflow`] if `amount` exceeds the signed
    ///   accounting range.
    pub const fn exact_in(amount: Amount) -> crate::error::Result<Self> {
        if amount.is_zero() {
            return Err(PoolError::ZeroAmount("swap amount"));
        }
        if amount.get() > i128::MAX as u128 {
            return Err(PoolError::MathOverflow("swap amount exceeds signed range"));
        }
        Ok(Self::ExactIn { amount_in: amount })
    }

    /// Creates an exact-output swap specification.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroAmount`] if `amount` is zero.
    /// - [`PoolError::MathOverflow`] if `amount` exceeds the signed
    ///   accounting range.
    pub const fn exact_out(amount: Amount) -> crate::error::Result<Self> {
        if amount.is_zero() {
            return Err(PoolError::ZeroAmount("swap amount"));
        }
        if amount.get() > i128::MAX as u128 {
            return Err(PoolError::MathOverflow("swap amount exceeds signed range"));
        }
        Ok(Self::ExactOut { amount_out: amount })
    }

    /// Returns `true` if this is an exact-input specification.
    #[must_use]
    pub const fn is_exact_in(&self) -> bool {
        matches!(self, Self::ExactIn { .. })
    }

    /// The signed `amount_specified` convention of the swap engine:
    /// positive for exact input, negative for exact output.
    #[must_use]
    pub const fn amount_specified(&self) -> i128 {
        match self {
            Self::ExactIn { amount_in } => amount_in.get() as i128,
            Self::ExactOut { amount_out } => -(amount_out.get() as i128),
        }
    }
}

impl fmt::Display for SwapSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactIn { amount_in } => write!(f, "ExactIn({amount_in})"),
            Self::ExactOut { amount_out } => write!(f, "ExactOut({amount_out})"),
        }
    }
}
