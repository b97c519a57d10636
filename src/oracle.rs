//! Circular price/liquidity oracle.
//!
//! The oracle stores checkpoints of two accumulators — `Σ tick · Δt` and
//! `Σ Δt / max(L, 1)` — in a ring whose live prefix grows on demand up
//! to [`ORACLE_CAPACITY`] slots. Any time-weighted average over a window
//! is a subtraction of two observed values.
//!
//! At most one observation is written per timestamp: writes within the
//! same second collapse into the checkpoint already at the head.
//! Timestamps are 32-bit and comparisons tolerate one wrap.

use primitive_types::U256;

use crate::error::{PoolError, Result};

/// Maximum number of slots the ring may ever hold.
pub const ORACLE_CAPACITY: u16 = 65_535;

/// One checkpoint of the running accumulators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observation {
    /// Timestamp of the checkpoint, seconds, wrapping at 2^32.
    pub block_timestamp: u32,
    /// Running `Σ tick · Δt` as of the timestamp.
    pub tick_cumulative: i64,
    /// Running `Σ (Δt << 128) / max(L, 1)` as of the timestamp.
    pub seconds_per_liquidity_cumulative_x128: U256,
    /// Whether the slot holds a real checkpoint. Prepaid slots are
    /// allocated with `false` and a sentinel timestamp.
    pub initialized: bool,
}

impl Observation {
    /// Advances an observation to `time` given the tick and liquidity
    /// that prevailed since it was taken.
    fn transform(&self, time: u32, tick: i32, liquidity: u128) -> Self {
        let delta = time.wrapping_sub(self.block_timestamp);
        Self {
            block_timestamp: time,
            tick_cumulative: self
                .tick_cumulative
                .wrapping_add(i64::from(tick) * i64::from(delta)),
            seconds_per_liquidity_cumulative_x128: self
                .seconds_per_liquidity_cumulative_x128
                .overflowing_add(
                    (U256::from(delta) << 128) / U256::from(liquidity.max(1)),
                )
                .0,
            initialized: true,
        }
    }
}

/// 32-bit timestamp comparison tolerating one wrap.
///
/// `a <= b` in ring time, where `time` is the current timestamp and
/// values logically after it belong to the previous epoch.
fn lte(time: u32, a: u32, b: u32) -> bool {
    if a <= time && b <= time {
        return a <= b;
    }
    let a_adj = if a > time {
        u64::from(a)
    } else {
        u64::from(a) + (1u64 << 32)
    };
    let b_adj = if b > time {
        u64::from(b)
    } else {
        u64::from(b) + (1u64 << 32)
    };
    a_adj <= b_adj
}

/// The observation ring.
///
/// Only indices `[0, cardinality)` are live; `grow` extends the backing
/// store by writing prepaid, uninitialized slots that `write` later
/// activates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observations {
    slots: Vec<Observation>,
}

impl Observations {
    /// Creates an empty ring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the observation at `index`.
    ///
    /// Out-of-range indices return a default slot; callers always pass
    /// indices below the live cardinality.
    #[must_use]
    pub fn get(&self, index: u16) -> Observation {
        self.slots
            .get(usize::from(index))
            .copied()
            .unwrap_or_default()
    }

    /// Seeds slot 0 at `time` and returns the initial
    /// `(cardinality, cardinality_next)`.
    pub fn initialize(&mut self, time: u32) -> (u16, u16) {
        self.slots.clear();
        self.slots.push(Observation {
            block_timestamp: time,
            tick_cumulative: 0,
            seconds_per_liquidity_cumulative_x128: U256::zero(),
            initialized: true,
        });
        (1, 1)
    }

    /// Writes an observation for `time`, returning the new head index
    /// and cardinality.
    ///
    /// A repeated timestamp is a no-op. Cardinality grows lazily: the
    /// bump to `cardinality_next` happens when the head is about to wrap
    /// past the last live slot.
    #[allow(clippy::too_many_arguments)]
    pub fn write(
        &mut self,
        index: u16,
        time: u32,
        tick: i32,
        liquidity: u128,
        cardinality: u16,
        cardinality_next: u16,
    ) -> (u16, u16) {
        let last = self.get(index);
        if last.block_timestamp == time {
            return (index, cardinality);
        }

        let cardinality_updated = if cardinality_next > cardinality && index == cardinality - 1 {
            cardinality_next
        } else {
            cardinality
        };

        let index_updated = (index + 1) % cardinality_updated;
        let slot = usize::from(index_updated);
        let transformed = last.transform(time, tick, liquidity);
        if slot < self.slots.len() {
            self.slots[slot] = transformed;
        } else {
            self.slots.push(transformed);
        }
        (index_updated, cardinality_updated)
    }

    /// Extends the backing store to `next` slots, prepaying each new one
    /// with the sentinel timestamp `1` so it stays unreadable until
    /// written. Returns the effective cardinality-next.
    pub fn grow(&mut self, current: u16, next: u16) -> u16 {
        if next <= current {
            return current;
        }
        let next = next.min(ORACLE_CAPACITY);
        for _ in self.slots.len()..usize::from(next) {
            self.slots.push(Observation {
                block_timestamp: 1,
                ..Observation::default()
            });
        }
        next
    }

    /// Observes the accumulators as of `seconds_ago` before `time`.
    ///
    /// Returns `(tick_cumulative, seconds_per_liquidity_cumulative)`.
    ///
    /// # Errors
    ///
    /// - [`PoolError::OracleUninitialized`] if no observation exists.
    /// - [`PoolError::OracleOld`] if the target precedes the oldest
    ///   stored observation.
    #[allow(clippy::too_many_arguments)]
    pub fn observe_single(
        &self,
        time: u32,
        seconds_ago: u32,
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(i64, U256)> {
        if cardinality == 0 {
            return Err(PoolError::OracleUninitialized);
        }

        if seconds_ago == 0 {
            let mut last = self.get(index);
            if last.block_timestamp != time {
                last = last.transform(time, tick, liquidity);
            }
            return Ok((
                last.tick_cumulative,
                last.seconds_per_liquidity_cumulative_x128,
            ));
        }

        let target = time.wrapping_sub(seconds_ago);
        let (before_or_at, at_or_after) =
            self.surrounding_observations(time, target, tick, index, liquidity, cardinality)?;

        if target == before_or_at.block_timestamp {
            Ok((
                before_or_at.tick_cumulative,
                before_or_at.seconds_per_liquidity_cumulative_x128,
            ))
        } else if target == at_or_after.block_timestamp {
            Ok((
                at_or_after.tick_cumulative,
                at_or_after.seconds_per_liquidity_cumulative_x128,
            ))
        } else {
            // Linear interpolation between the surrounding checkpoints.
            let delta = at_or_after
                .block_timestamp
                .wrapping_sub(before_or_at.block_timestamp);
            let elapsed = target.wrapping_sub(before_or_at.block_timestamp);
            let tick_cumulative = before_or_at.tick_cumulative.wrapping_add(
                (at_or_after
                    .tick_cumulative
                    .wrapping_sub(before_or_at.tick_cumulative)
                    / i64::from(delta))
                    * i64::from(elapsed),
            );
            let seconds_per_liquidity = before_or_at
                .seconds_per_liquidity_cumulative_x128
                .overflowing_add(
                    at_or_after
                        .seconds_per_liquidity_cumulative_x128
                        .overflowing_sub(before_or_at.seconds_per_liquidity_cumulative_x128)
                        .0
                        / U256::from(delta)
                        * U256::from(elapsed),
                )
                .0;
            Ok((tick_cumulative, seconds_per_liquidity))
        }
    }

    /// Observes a batch of windows; one result per `seconds_agos` entry.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Observations::observe_single`].
    #[allow(clippy::too_many_arguments)]
    pub fn observe(
        &self,
        time: u32,
        seconds_agos: &[u32],
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<Vec<(i64, U256)>> {
        seconds_agos
            .iter()
            .map(|&ago| self.observe_single(time, ago, tick, index, liquidity, cardinality))
            .collect()
    }

    /// Locates the checkpoints bracketing `target`.
    fn surrounding_observations(
        &self,
        time: u32,
        target: u32,
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> Result<(Observation, Observation)> {
        // Head first: the common case asks about the recent past.
        let mut before_or_at = self.get(index);
        if lte(time, before_or_at.block_timestamp, target) {
            if before_or_at.block_timestamp == target {
                return Ok((before_or_at, Observation::default()));
            }
            return Ok((
                before_or_at,
                before_or_at.transform(target, tick, liquidity),
            ));
        }

        // Oldest live observation bounds the history.
        before_or_at = self.get((index + 1) % cardinality);
        if !before_or_at.initialized {
            before_or_at = self.get(0);
        }
        if !lte(time, before_or_at.block_timestamp, target) {
            return Err(PoolError::OracleOld);
        }

        self.binary_search(time, target, index, cardinality)
    }

    /// Binary search over the live ring, skipping prepaid slots.
    fn binary_search(
        &self,
        time: u32,
        target: u32,
        index: u16,
        cardinality: u16,
    ) -> Result<(Observation, Observation)> {
        let mut left = u32::from((index + 1) % cardinality);
        let mut right = left + u32::from(cardinality) - 1;

        loop {
            let mid = (left + right) / 2;
            let before_or_at = self.get((mid % u32::from(cardinality)) as u16);

            // Uninitialized slot: the live range is to the right.
            if !before_or_at.initialized {
                left = mid + 1;
                continue;
            }

            let at_or_after = self.get(((mid + 1) % u32::from(cardinality)) as u16);
            let target_at_or_after = lte(time, before_or_at.block_timestamp, target);
            if target_at_or_after && lte(time, target, at_or_after.block_timestamp) {
                return Ok((before_or_at, at_or_after));
            }

            if target_at_or_after {
                left = mid + 1;
            } else {
                if mid == 0 {
                    return Err(PoolError::OracleOld);
                }
                right = mid - 1;
            }
            if left > right {
                return Err(PoolError::OracleOld);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn observed(
        obs: &Observations,
        time: u32,
        ago: u32,
        tick: i32,
        index: u16,
        liquidity: u128,
        cardinality: u16,
    ) -> (i64, U256) {
        let Ok(pair) = obs.observe_single(time, ago, tick, index, liquidity, cardinality) else {
            panic!("observe failed at ago={ago}");
        };
        pair
    }

    // -- initialize ----------------------------------------------------------

    #[test]
    fn initialize_seeds_slot_zero() {
        let mut obs = Observations::new();
        assert_eq!(obs.initialize(1_000), (1, 1));
        let head = obs.get(0);
        assert!(head.initialized);
        assert_eq!(head.block_timestamp, 1_000);
        assert_eq!(head.tick_cumulative, 0);
    }

    // -- write ---------------------------------------------------------------

    #[test]
    fn write_same_timestamp_is_noop() {
        let mut obs = Observations::new();
        obs.initialize(10);
        assert_eq!(obs.write(0, 10, 5, 100, 1, 1), (0, 1));
        assert_eq!(obs.get(0).tick_cumulative, 0);
    }

    #[test]
    fn write_advances_accumulators() {
        let mut obs = Observations::new();
        obs.initialize(10);
        // One slot: head wraps onto itself.
        let (index, cardinality) = obs.write(0, 25, 7, 1_000, 1, 1);
        assert_eq!((index, cardinality), (0, 1));
        let head = obs.get(0);
        assert_eq!(head.block_timestamp, 25);
        assert_eq!(head.tick_cumulative, 7 * 15);
        assert_eq!(
            head.seconds_per_liquidity_cumulative_x128,
            (U256::from(15u64) << 128) / U256::from(1_000u64)
        );
    }

    #[test]
    fn write_grows_into_cardinality_next() {
        let mut obs = Observations::new();
        obs.initialize(10);
        let next = obs.grow(1, 3);
        assert_eq!(next, 3);
        // index == cardinality - 1 triggers the lazy bump.
        let (index, cardinality) = obs.write(0, 20, 1, 1, 1, 3);
        assert_eq!((index, cardinality), (1, 3));
        let (index, cardinality) = obs.write(index, 30, 1, 1, cardinality, 3);
        assert_eq!((index, cardinality), (2, 3));
        // Ring wraps back to slot 0.
        let (index, cardinality) = obs.write(index, 40, 1, 1, cardinality, 3);
        assert_eq!((index, cardinality), (0, 3));
    }

    #[test]
    fn zero_liquidity_counts_as_one() {
        let mut obs = Observations::new();
        obs.initialize(0);
        obs.write(0, 8, 0, 0, 1, 1);
        assert_eq!(
            obs.get(0).seconds_per_liquidity_cumulative_x128,
            U256::from(8u64) << 128
        );
    }

    // -- grow ----------------------------------------------------------------

    #[test]
    fn grow_is_monotone() {
        let mut obs = Observations::new();
        obs.initialize(0);
        assert_eq!(obs.grow(1, 5), 5);
        assert_eq!(obs.grow(5, 3), 5);
        assert_eq!(obs.grow(5, 5), 5);
    }

    #[test]
    fn grow_prepays_sentinel_slots() {
        let mut obs = Observations::new();
        obs.initialize(0);
        obs.grow(1, 4);
        for i in 1..4 {
            let slot = obs.get(i);
            assert!(!slot.initialized);
            assert_eq!(slot.block_timestamp, 1);
        }
    }

    #[test]
    fn grow_caps_at_capacity() {
        let mut obs = Observations::new();
        obs.initialize(0);
        assert_eq!(obs.grow(1, ORACLE_CAPACITY), ORACLE_CAPACITY);
    }

    // -- observe: head and extrapolation -------------------------------------

    #[test]
    fn observe_zero_ago_at_head_timestamp() {
        let mut obs = Observations::new();
        obs.initialize(100);
        obs.write(0, 110, 3, 50, 1, 1);
        let (tc, _) = observed(&obs, 110, 0, 3, 0, 50, 1);
        assert_eq!(tc, 30);
    }

    #[test]
    fn observe_zero_ago_extrapolates_to_now() {
        let mut obs = Observations::new();
        obs.initialize(100);
        // Head at 100, asking at 130 with tick 2 prevailing.
        let (tc, spl) = observed(&obs, 130, 0, 2, 0, 10, 1);
        assert_eq!(tc, 60);
        assert_eq!(spl, (U256::from(30u64) << 128) / U256::from(10u64));
    }

    #[test]
    fn observe_uninitialized_rejected() {
        let obs = Observations::new();
        let result = obs.observe_single(10, 0, 0, 0, 0, 0);
        assert_eq!(result, Err(PoolError::OracleUninitialized));
    }

    // -- observe: history -----------------------------------------------------

    fn three_point_history() -> Observations {
        // Checkpoints at t=0 (tick 0), t=10 (tick ran 5), t=20 (tick ran -3).
        let mut obs = Observations::new();
        obs.initialize(0);
        obs.grow(1, 4);
        let (i, c) = obs.write(0, 10, 5, 100, 1, 4);
        let (i, c) = obs.write(i, 20, -3, 200, c, 4);
        assert_eq!((i, c), (2, 4));
        obs
    }

    #[test]
    fn observe_exact_checkpoints() {
        let obs = three_point_history();
        // At t=25 asking 15s ago → t=10: tick_cumulative = 5*10 = 50.
        let (tc, _) = observed(&obs, 25, 15, -3, 2, 200, 4);
        assert_eq!(tc, 50);
        // 25s ago → t=0.
        let (tc, _) = observed(&obs, 25, 25, -3, 2, 200, 4);
        assert_eq!(tc, 0);
    }

    #[test]
    fn observe_interpolates_between_checkpoints() {
        let obs = three_point_history();
        // Between t=10 (tc=50) and t=20 (tc=50 + -3*10=20): at t=15,
        // tc = 50 + (20-50)/10*5 = 35.
        let (tc, _) = observed(&obs, 25, 10, -3, 2, 200, 4);
        assert_eq!(tc, 35);
    }

    #[test]
    fn observe_head_window_extrapolates() {
        let obs = three_point_history();
        // Target t=22 is after the head (t=20): extrapolate with the
        // current tick.
        let (tc, _) = observed(&obs, 25, 3, 7, 2, 200, 4);
        assert_eq!(tc, 20 + 7 * 2);
    }

    #[test]
    fn observe_too_old_rejected() {
        let obs = three_point_history();
        // Oldest live checkpoint is t=0; 30s before t=25 precedes it.
        let result = obs.observe_single(25, 30, -3, 2, 200, 4);
        assert_eq!(result, Err(PoolError::OracleOld));
    }

    #[test]
    fn observe_batch_matches_singles() {
        let obs = three_point_history();
        let Ok(batch) = obs.observe(25, &[0, 5, 15, 25], -3, 2, 200, 4) else {
            panic!("observe failed");
        };
        for (k, &ago) in [0u32, 5, 15, 25].iter().enumerate() {
            assert_eq!(batch[k], observed(&obs, 25, ago, -3, 2, 200, 4));
        }
    }

    #[test]
    fn observe_skips_prepaid_slots() {
        // Cardinality grown beyond written history: search must skip the
        // sentinel slots rather than treat them as checkpoints.
        let mut obs = Observations::new();
        obs.initialize(50);
        obs.grow(1, 8);
        let (i, c) = obs.write(0, 60, 2, 10, 1, 8);
        let (tc_at_55, _) = observed(&obs, 60, 5, 2, i, 10, c);
        // Interpolated halfway between t=50 (tc=0) and t=60 (tc=20).
        assert_eq!(tc_at_55, 10);
    }

    // -- consecutive-checkpoint invariant -------------------------------------

    #[test]
    fn accumulator_deltas_follow_definitions() {
        let mut obs = Observations::new();
        obs.initialize(0);
        obs.grow(1, 4);
        let ticks = [4i32, -9, 12];
        let liqs = [7u128, 300, 2];
        let times = [13u32, 29, 71];
        let mut index = 0u16;
        let mut cardinality = 1u16;
        let mut prev_time = 0u32;
        let mut prev = obs.get(0);
        for k in 0..3 {
            let (i, c) = obs.write(index, times[k], ticks[k], liqs[k], cardinality, 4);
            index = i;
            cardinality = c;
            let cur = obs.get(index);
            let dt = times[k] - prev_time;
            assert_eq!(
                cur.tick_cumulative - prev.tick_cumulative,
                i64::from(ticks[k]) * i64::from(dt)
            );
            assert_eq!(
                cur.seconds_per_liquidity_cumulative_x128
                    - prev.seconds_per_liquidity_cumulative_x128,
                (U256::from(dt) << 128) / U256::from(liqs[k].max(1))
            );
            prev = cur;
            prev_time = times[k];
        }
    }

    // -- timestamp wrap -------------------------------------------------------

    #[test]
    fn lte_without_wrap() {
        assert!(lte(100, 20, 30));
        assert!(!lte(100, 30, 20));
        assert!(lte(100, 30, 30));
    }

    #[test]
    fn lte_with_wrap() {
        // time = 5 just after wrapping: 2^32 - 10 is "before" 3.
        let old = u32::MAX - 9;
        assert!(lte(5, old, 3));
        assert!(!lte(5, 3, old));
    }

    #[test]
    fn observe_across_timestamp_wrap() {
        let start = u32::MAX - 4;
        let mut obs = Observations::new();
        obs.initialize(start);
        obs.grow(1, 2);
        // 10 seconds later the clock has wrapped to 5.
        let (i, c) = obs.write(0, 5, 3, 10, 1, 2);
        let (tc, _) = observed(&obs, 5, 0, 3, i, 10, c);
        assert_eq!(tc, 30);
        // 7 seconds ago crosses the wrap; interpolation still works.
        let (tc, _) = observed(&obs, 5, 7, 3, i, 10, c);
        assert_eq!(tc, 3 * 3);
    }
}
