//! Word-packed set of initialized ticks.
//!
//! Each 256-bit word covers 256 consecutive compressed ticks
//! (`tick / spacing`); tick `i` maps to
//! `(word, bit) = (i/spacing >> 8, (i/spacing) & 0xff)`. The search
//! helper inspects at most one word per call, so the swap loop consumes
//! no more than 256 compressed ticks per bitmap query.

use std::collections::BTreeMap;

use primitive_types::U256;

use crate::domain::Tick;
use crate::error::{PoolError, Result};

/// Sparse map of bitmap words keyed by word position.
///
/// Absent words are all-zero. Words that become zero after a flip are
/// removed so the map only holds populated regions of the curve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickBitmap {
    words: BTreeMap<i16, U256>,
}

/// Splits a compressed tick into `(word position, bit position)`.
const fn position(compressed: i32) -> (i16, u8) {
    ((compressed >> 8) as i16, (compressed & 0xff) as u8)
}

/// Index of the most significant set bit. `word` must be non-zero.
fn most_significant_bit(word: U256) -> u8 {
    debug_assert!(!word.is_zero());
    (word.bits() - 1) as u8
}

/// Index of the least significant set bit. `word` must be non-zero.
fn least_significant_bit(word: U256) -> u8 {
    debug_assert!(!word.is_zero());
    word.trailing_zeros() as u8
}

impl TickBitmap {
    /// Creates an empty bitmap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn word(&self, word_pos: i16) -> U256 {
        self.words.get(&word_pos).copied().unwrap_or_default()
    }

    /// Toggles the initialized state of `tick`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::TickNotSpaced`] if `tick` is not a multiple
    /// of `spacing`.
    pub fn flip(&mut self, tick: Tick, spacing: i32) -> Result<()> {
        if !tick.is_aligned(spacing) {
            return Err(PoolError::TickNotSpaced("flipped tick"));
        }
        let (word_pos, bit_pos) = position(tick.get() / spacing);
        let mask = U256::one() << bit_pos;
        let word = self.word(word_pos) ^ mask;
        if word.is_zero() {
            self.words.remove(&word_pos);
        } else {
            self.words.insert(word_pos, word);
        }
        Ok(())
    }

    /// Returns `true` if `tick` is marked initialized.
    #[must_use]
    pub fn is_initialized(&self, tick: Tick, spacing: i32) -> bool {
        if !tick.is_aligned(spacing) {
            return false;
        }
        let (word_pos, bit_pos) = position(tick.get() / spacing);
        !(self.word(word_pos) & (U256::one() << bit_pos)).is_zero()
    }

    /// Finds the next initialized tick within one bitmap word.
    ///
    /// With `lte` the search runs downward and includes `tick` itself;
    /// otherwise it runs upward starting strictly above `tick`. When no
    /// initialized tick exists in the inspected word, the word's
    /// boundary tick is returned with `false` so the caller can continue
    /// from there on the next iteration.
    #[must_use]
    pub fn next_initialized_tick_within_one_word(
        &self,
        tick: i32,
        spacing: i32,
        lte: bool,
    ) -> (i32, bool) {
        let mut compressed = tick / spacing;
        if tick < 0 && tick % spacing != 0 {
            compressed -= 1;
        }

        if lte {
            let (word_pos, bit_pos) = position(compressed);
            // Bits at or below bit_pos.
            let mask = (U256::one() << bit_pos) - 1 + (U256::one() << bit_pos);
            let masked = self.word(word_pos) & mask;
            if masked.is_zero() {
                ((compressed - i32::from(bit_pos)) * spacing, false)
            } else {
                let delta = i32::from(bit_pos) - i32::from(most_significant_bit(masked));
                ((compressed - delta) * spacing, true)
            }
        } else {
            // Start from the tick just above the current one.
            let (word_pos, bit_pos) = position(compressed + 1);
            // Bits at or above bit_pos.
            let mask = !((U256::one() << bit_pos) - 1);
            let masked = self.word(word_pos) & mask;
            if masked.is_zero() {
                ((compressed + 1 + i32::from(255 - bit_pos)) * spacing, false)
            } else {
                let delta = i32::from(least_significant_bit(masked)) - i32::from(bit_pos);
                ((compressed + 1 + delta) * spacing, true)
            }
        }
    }
}
