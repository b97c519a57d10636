//! Tick ↔ sqrt-price conversion.
//!
//! `sqrt_ratio_at_tick` evaluates `sqrt(1.0001^tick) * 2^96` by binary
//! decomposition of the tick over precomputed Q128.128 factors of
//! `sqrt(1.0001)^(2^i)`, then shifts to Q64.96 rounding up. The inverse
//! recovers the greatest tick whose ratio does not exceed the input, so
//! `tick_at_sqrt_ratio(sqrt_ratio_at_tick(t)) == t` across the whole
//! domain and exact tick boundaries map to the lower tick.

use primitive_types::U256;

use crate::domain::{Tick, MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use crate::error::{PoolError, Result};

/// `sqrt(1.0001)^(-2^i) * 2^128` for bit positions 0..=19.
///
/// The factor table covers |tick| up to 2^20 - 1, which contains the
/// whole valid range.
const FACTORS: [u128; 20] = [
    0xfffcb933bd6fad37aa2d162d1a594001,
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

/// Computes `sqrt(1.0001^tick) * 2^96` as a Q64.96 value.
///
/// Monotone in `tick`; the results at the domain edges are exactly
/// [`MIN_SQRT_RATIO`] and [`MAX_SQRT_RATIO`].
///
/// # Errors
///
/// Returns [`PoolError::TickOutOfRange`] if `tick` is outside
/// `[MIN_TICK, MAX_TICK]`.
pub fn sqrt_ratio_at_tick(tick: i32) -> Result<U256> {
    if tick < Tick::MIN.get() || tick > Tick::MAX.get() {
        return Err(PoolError::TickOutOfRange("tick conversion out of domain"));
    }
    let abs_tick = tick.unsigned_abs();

    // Q128.128 accumulator; every factor is < 1.0 so the running product
    // for |tick| stays at or below 2^128.
    let mut ratio = if abs_tick & 1 != 0 {
        U256::from(FACTORS[0])
    } else {
        U256::one() << 128
    };
    for (i, factor) in FACTORS.iter().enumerate().skip(1) {
        if abs_tick & (1 << i) != 0 {
            ratio = (ratio * U256::from(*factor)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up so the inverse of the output price
    // is always consistent.
    let shifted = ratio >> 32;
    if (ratio & U256::from(0xffff_ffffu64)).is_zero() {
        Ok(shifted)
    } else {
        Ok(shifted + U256::one())
    }
}

/// Computes the greatest tick whose sqrt ratio is at most `sqrt_price_x96`.
///
/// This is the monotone inverse of [`sqrt_ratio_at_tick`] under the
/// lower-tick boundary convention. The valid input domain is
/// `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
///
/// # Errors
///
/// Returns [`PoolError::BadSqrtPriceLimit`] if the input is outside the
/// domain.
pub fn tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(PoolError::BadSqrtPriceLimit(
            "sqrt price outside conversion domain",
        ));
    }

    // Binary search for the greatest tick with ratio <= input. Exact by
    // construction against the forward function.
    let mut low = Tick::MIN.get();
    let mut high = Tick::MAX.get();
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    Ok(low)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::math::Q96;

    // -- sqrt_ratio_at_tick -------------------------------------------------

    #[test]
    fn tick_zero_is_exactly_q96() {
        let Ok(r) = sqrt_ratio_at_tick(0) else {
            panic!("expected Ok");
        };
        assert_eq!(r, Q96);
    }

    #[test]
    fn min_tick_is_min_ratio() {
        let Ok(r) = sqrt_ratio_at_tick(Tick::MIN.get()) else {
            panic!("expected Ok");
        };
        assert_eq!(r, MIN_SQRT_RATIO);
    }

    #[test]
    fn max_tick_is_max_ratio() {
        let Ok(r) = sqrt_ratio_at_tick(Tick::MAX.get()) else {
            panic!("expected Ok");
        };
        assert_eq!(r, MAX_SQRT_RATIO);
    }

    #[test]
    fn known_single_tick_values() {
        let Ok(up) = sqrt_ratio_at_tick(1) else {
            panic!("expected Ok");
        };
        let Ok(down) = sqrt_ratio_at_tick(-1) else {
            panic!("expected Ok");
        };
        assert_eq!(up, U256::from(79_232_123_823_359_799_118_286_999_568u128));
        assert_eq!(down, U256::from(79_224_201_403_219_477_170_569_942_574u128));
    }

    #[test]
    fn out_of_domain_rejected() {
        assert!(sqrt_ratio_at_tick(Tick::MIN.get() - 1).is_err());
        assert!(sqrt_ratio_at_tick(Tick::MAX.get() + 1).is_err());
    }

    #[test]
    fn strictly_monotone_over_samples() {
        let mut prev = U256::zero();
        for tick in (-887_272..=887_272).step_by(88_727) {
            let Ok(r) = sqrt_ratio_at_tick(tick) else {
                panic!("expected Ok for tick {tick}");
            };
            assert!(r > prev, "ratio must grow with tick (tick {tick})");
            prev = r;
        }
    }

    #[test]
    fn adjacent_ticks_strictly_ordered() {
        for base in [-887_272, -100_000, -1, 0, 1, 100_000, 887_271] {
            let Ok(a) = sqrt_ratio_at_tick(base) else {
                panic!("expected Ok");
            };
            let Ok(b) = sqrt_ratio_at_tick(base + 1) else {
                panic!("expected Ok");
            };
            assert!(a < b, "tick {base} ratio not below tick {}", base + 1);
        }
    }

    // -- tick_at_sqrt_ratio -------------------------------------------------

    #[test]
    fn q96_maps_to_tick_zero() {
        let Ok(t) = tick_at_sqrt_ratio(Q96) else {
            panic!("expected Ok");
        };
        assert_eq!(t, 0);
    }

    #[test]
    fn min_ratio_maps_to_min_tick() {
        let Ok(t) = tick_at_sqrt_ratio(MIN_SQRT_RATIO) else {
            panic!("expected Ok");
        };
        assert_eq!(t, Tick::MIN.get());
    }

    #[test]
    fn just_below_max_maps_to_one_under_max_tick() {
        let Ok(t) = tick_at_sqrt_ratio(MAX_SQRT_RATIO - U256::one()) else {
            panic!("expected Ok");
        };
        assert_eq!(t, Tick::MAX.get() - 1);
    }

    #[test]
    fn domain_bounds_rejected() {
        assert!(tick_at_sqrt_ratio(MIN_SQRT_RATIO - U256::one()).is_err());
        assert!(tick_at_sqrt_ratio(MAX_SQRT_RATIO).is_err());
        assert!(tick_at_sqrt_ratio(U256::zero()).is_err());
    }

    // -- Round trip ---------------------------------------------------------

    #[test]
    fn round_trip_identity_over_samples() {
        for tick in [
            -887_272, -443_636, -100_000, -60, -1, 0, 1, 60, 100_000, 443_636, 887_271,
        ] {
            let Ok(ratio) = sqrt_ratio_at_tick(tick) else {
                panic!("expected Ok for tick {tick}");
            };
            let Ok(back) = tick_at_sqrt_ratio(ratio) else {
                panic!("expected Ok for ratio of tick {tick}");
            };
            assert_eq!(back, tick, "round trip failed for tick {tick}");
        }
    }

    #[test]
    fn price_between_ticks_floors_to_lower() {
        let Ok(at_60) = sqrt_ratio_at_tick(60) else {
            panic!("expected Ok");
        };
        let Ok(t) = tick_at_sqrt_ratio(at_60 + U256::one()) else {
            panic!("expected Ok");
        };
        assert_eq!(t, 60);

        let Ok(t) = tick_at_sqrt_ratio(at_60 - U256::one()) else {
            panic!("expected Ok");
        };
        assert_eq!(t, 59);
    }

    #[test]
    fn exact_boundary_is_lower_tick() {
        // The tick at an exact boundary price equals that tick, not the
        // one below.
        for tick in [-600, -60, 0, 60, 600] {
            let Ok(ratio) = sqrt_ratio_at_tick(tick) else {
                panic!("expected Ok");
            };
            let Ok(back) = tick_at_sqrt_ratio(ratio) else {
                panic!("expected Ok");
            };
            assert_eq!(back, tick);
        }
    }
}
