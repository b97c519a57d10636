//! Outcome of a completed swap.

use core::fmt;

use super::{AmountDelta, Liquidity, SqrtPriceX96, Tick};

/// Result of a completed swap, from the pool's point of view.
///
/// The two deltas follow the signed convention of [`AmountDelta`]:
/// positive amounts were paid into the pool, negative amounts were paid
/// out to the recipient. The price/tick/liquidity fields are the values
/// committed at the end of the swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct SwapResult {
    amount0: AmountDelta,
    amount1: AmountDelta,
    sqrt_price_x96: SqrtPriceX96,
    liquidity: Liquidity,
    tick: Tick,
}

impl SwapResult {
    /// Bundles the committed swap outcome.
    pub const fn new(
        amount0: AmountDelta,
        amount1: AmountDelta,
        sqrt_price_x96: SqrtPriceX96,
        liquidity: Liquidity,
        tick: Tick,
    ) -> Self {
        Self {
            amount0,
            amount1,
            sqrt_price_x96,
            liquidity,
            tick,
        }
    }

    /// Signed token0 delta.
    #[must_use]
    pub const fn amount0(&self) -> AmountDelta {
        self.amount0
    }

    /// Signed token1 delta.
    #[must_use]
    pub const fn amount1(&self) -> AmountDelta {
        self.amount1
    }

    /// Pool sqrt price after the swap.
    #[must_use]
    pub const fn sqrt_price_x96(&self) -> SqrtPriceX96 {
        self.sqrt_price_x96
    }

    /// In-range liquidity after the swap.
    #[must_use]
    pub const fn liquidity(&self) -> Liquidity {
        self.liquidity
    }

    /// Pool tick after the swap.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }
}

impl fmt::Display for SwapResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SwapResult(amount0={}, amount1={}, tick={})",
            self.amount0, self.amount1, self.tick
        )
    }
}
