//! Discrete price point on the tick-partitioned curve.

use core::fmt;

use crate::error::PoolError;

/// Minimum valid tick index.
const MIN_TICK: i32 = -887_272;

/// Maximum valid tick index.
const MAX_TICK: i32 = 887_272;

/// A discrete price point on the curve.
///
/// Price increases exponentially with the tick index:
/// `price = 1.0001^tick`, so `sqrt_price = 1.0001^(tick/2)`. Valid tick
/// indices range from [`MIN`](Self::MIN) (`-887272`) to
/// [`MAX`](Self::MAX) (`887272`).
///
/// Only ticks that are multiples of the pool's tick spacing may carry
/// liquidity; [`Tick::is_aligned`] checks that property.
///
/// # Examples
///
/// ```
/// use tidepool::domain::Tick;
///
/// let tick = Tick::new(120);
/// assert!(tick.is_ok());
/// assert!(tick.unwrap_or(Tick::ZERO).is_aligned(60));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(i32);

impl Tick {
    /// Minimum valid tick (`-887272`).
    pub const MIN: Self = Self(MIN_TICK);

    /// Maximum valid tick (`887272`).
    pub const MAX: Self = Self(MAX_TICK);

    /// Neutral tick where `price = 1.0001^0 = 1.0`.
    pub const ZERO: Self = Self(0);

    /// Creates a new `Tick` with range validation.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::TickOutOfRange`] if `value` is outside
    /// the range `[-887272, 887272]`.
    pub const fn new(value: i32) -> crate::error::Result<Self> {
        if value < MIN_TICK || value > MAX_TICK {
            return Err(PoolError::TickOutOfRange(
                "tick out of range [-887272, 887272]",
            ));
        }
        Ok(Self(value))
    }

    /// Returns the underlying `i32` tick index.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Returns `true` if this tick is a multiple of `spacing`.
    #[must_use]
    pub const fn is_aligned(&self, spacing: i32) -> bool {
        spacing > 0 && self.0 % spacing == 0
    }

    /// Returns `tick / spacing` rounded toward negative infinity.
    ///
    /// This is the compressed index used by the tick bitmap; plain `i32`
    /// division truncates toward zero, which is wrong for negative
    /// non-multiples.
    #[must_use]
    pub const fn compress(&self, spacing: i32) -> i32 {
        let mut compressed = self.0 / spacing;
        if self.0 < 0 && self.0 % spacing != 0 {
            compressed -= 1;
        }
        compressed
    }

    /// Maximum liquidity a single tick may reference for a given spacing.
    ///
    /// Computed as `u128::MAX / num_usable_ticks`, where the usable ticks
    /// are the spacing-aligned ticks inside `[MIN, MAX]`. Capping per-tick
    /// gross liquidity keeps the signed net-liquidity sums representable.
    #[must_use]
    pub const fn max_liquidity_per_tick(spacing: i32) -> u128 {
        let min_usable = (MIN_TICK / spacing) * spacing;
        let max_usable = (MAX_TICK / spacing) * spacing;
        let num_ticks = ((max_usable - min_usable) / spacing + 1) as u128;
        u128::MAX / num_ticks
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tick({})", self.0)
    }
}
