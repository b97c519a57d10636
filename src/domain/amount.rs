//! Raw token amount with checked arithmetic.

use core::fmt;

use super::Rounding;

/// A raw token amount in the smallest unit of its asset.
///
/// `Amount` never interprets decimals; it is the unit in which reserve
/// balances, owed fees, and swap legs are denominated. All `u128` values
/// are valid amounts.
///
/// Arithmetic methods are checked: they return `None` on overflow,
/// underflow, or division by zero instead of panicking. The single
/// exception is [`Amount::saturating_add`], used for owed-token
/// accumulators that clamp at the ceiling rather than fail.
///
/// # Examples
///
/// ```
/// use tidepool::domain::Amount;
///
/// let a = Amount::new(100);
/// let b = Amount::new(200);
/// assert_eq!(a.checked_add(&b), Some(Amount::new(300)));
/// assert_eq!(b.checked_sub(&a), Some(Amount::new(100)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[must_use]
pub struct Amount(u128);

impl Amount {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Maximum representable amount.
    pub const MAX: Self = Self(u128::MAX);

    /// Creates a new `Amount` from a raw `u128` value.
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Returns the underlying `u128` value.
    #[must_use]
    pub const fn get(&self) -> u128 {
        self.0
    }

    /// Returns `true` if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition. Returns `None` on overflow.
    #[must_use]
    pub const fn checked_add(&self, other: &Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on underflow.
    #[must_use]
    pub const fn checked_sub(&self, other: &Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Saturating addition, clamping at [`Amount::MAX`].
    ///
    /// Owed-token counters use this: an LP that lets fees accrue past
    /// `u128::MAX` loses the excess rather than wedging the position.
    pub const fn saturating_add(&self, other: &Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Checked division with explicit rounding direction.
    ///
    /// - [`Rounding::Down`]: floor division.
    /// - [`Rounding::Up`]: ceiling division.
    ///
    /// Returns `None` if `divisor` is zero.
    #[must_use]
    pub const fn checked_div(&self, divisor: &Self, rounding: Rounding) -> Option<Self> {
        if divisor.0 == 0 {
            return None;
        }
        let q = self.0 / divisor.0;
        let r = self.0 % divisor.0;
        match rounding {
            Rounding::Down => Some(Self(q)),
            Rounding::Up => {
                if r != 0 {
                    // q + 1 cannot overflow: r != 0 implies self < u128::MAX
                    // or divisor > 1, either way q < u128::MAX.
                    Some(Self(q + 1))
                } else {
                    Some(Self(q))
                }
            }
        }
    }

    /// Returns the smaller of two amounts.
    #[must_use]
    pub const fn min(&self, other: &Self) -> Self {
        if self.0 <= other.0 {
            *self
        } else {
            *other
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    // -- Construction -------------------------------------------------------

    #[test]
    fn new_and_get() {
        assert_eq!(Amount::new(42).get(), 42);
    }

    #[test]
    fn zero_constant() {
        assert_eq!(Amount::ZERO.get(), 0);
        assert!(Amount::ZERO.is_zero());
    }

    #[test]
    fn default_is_zero() {
        assert_eq!(Amount::default(), Amount::ZERO);
    }

    // -- checked_add --------------------------------------------------------

    #[test]
    fn add_ok() {
        assert_eq!(
            Amount::new(1).checked_add(&Amount::new(2)),
            Some(Amount::new(3))
        );
    }

    #[test]
    fn add_overflow() {
        assert_eq!(Amount::MAX.checked_add(&Amount::new(1)), None);
    }

    // -- checked_sub --------------------------------------------------------

    #[test]
    fn sub_ok() {
        assert_eq!(
            Amount::new(3).checked_sub(&Amount::new(2)),
            Some(Amount::new(1))
        );
    }

    #[test]
    fn sub_underflow() {
        assert_eq!(Amount::new(1).checked_sub(&Amount::new(2)), None);
    }

    // -- saturating_add -----------------------------------------------------

    #[test]
    fn saturating_add_normal() {
        assert_eq!(
            Amount::new(10).saturating_add(&Amount::new(5)),
            Amount::new(15)
        );
    }

    #[test]
    fn saturating_add_clamps() {
        assert_eq!(Amount::MAX.saturating_add(&Amount::new(1)), Amount::MAX);
    }

    // -- checked_div --------------------------------------------------------

    #[test]
    fn div_round_down() {
        let Some(r) = Amount::new(10).checked_div(&Amount::new(3), Rounding::Down) else {
            panic!("expected Some");
        };
        assert_eq!(r, Amount::new(3));
    }

    #[test]
    fn div_round_up() {
        let Some(r) = Amount::new(10).checked_div(&Amount::new(3), Rounding::Up) else {
            panic!("expected Some");
        };
        assert_eq!(r, Amount::new(4));
    }

    #[test]
    fn div_exact_both_directions() {
        let Some(down) = Amount::new(10).checked_div(&Amount::new(2), Rounding::Down) else {
            panic!("expected Some");
        };
        let Some(up) = Amount::new(10).checked_div(&Amount::new(2), Rounding::Up) else {
            panic!("expected Some");
        };
        assert_eq!(down, Amount::new(5));
        assert_eq!(up, Amount::new(5));
    }

    #[test]
    fn div_by_zero() {
        assert_eq!(
            Amount::new(10).checked_div(&Amount::ZERO, Rounding::Down),
            None
        );
    }

    #[test]
    fn div_max_round_up_no_overflow() {
        let Some(r) = Amount::MAX.checked_div(&Amount::new(3), Rounding::Up) else {
            panic!("expected Some");
        };
        assert_eq!(r, Amount::new(u128::MAX / 3 + 1));
    }

    // -- min ----------------------------------------------------------------

    #[test]
    fn min_picks_smaller() {
        assert_eq!(Amount::new(3).min(Amount::new(7)), Amount::new(3));
        assert_eq!(Amount::new(7).min(Amount::new(3)), Amount::new(3));
    }

    // -- Display ------------------------------------------------------------

    #[test]
    fn display() {
        assert_eq!(format!("{}", Amount::new(1_000)), "1000");
    }

    // -- Ordering -----------------------------------------------------------

    #[test]
    fn ordering() {
        assert!(Amount::new(1) < Amount::new(2));
    }
}
