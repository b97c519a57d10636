//! Pool event log.
//!
//! Every externally observable state change appends a [`PoolEvent`].
//! The embedder drains the log with
//! [`Pool::take_events`](crate::pool::Pool::take_events); the pool never
//! reads it back.

use primitive_types::U256;

use crate::domain::{AccountId, Amount, AmountDelta, Liquidity, Tick};

/// An externally observable pool state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    /// The pool was initialized with its starting price.
    Initialize {
        /// Starting sqrt price.
        sqrt_price_x96: U256,
        /// Tick of the starting price.
        tick: Tick,
    },
    /// Liquidity was minted into a range.
    Mint {
        /// Position owner credited with the liquidity.
        owner: AccountId,
        /// Lower bound of the range.
        tick_lower: Tick,
        /// Upper bound of the range.
        tick_upper: Tick,
        /// Liquidity minted.
        amount: Liquidity,
        /// token0 paid in.
        amount0: Amount,
        /// token1 paid in.
        amount1: Amount,
    },
    /// Liquidity was burned from a range.
    Burn {
        /// Position owner.
        owner: AccountId,
        /// Lower bound of the range.
        tick_lower: Tick,
        /// Upper bound of the range.
        tick_upper: Tick,
        /// Liquidity burned.
        amount: Liquidity,
        /// token0 credited to the position.
        amount0: Amount,
        /// token1 credited to the position.
        amount1: Amount,
    },
    /// Owed tokens were collected from a position.
    Collect {
        /// Position owner.
        owner: AccountId,
        /// Transfer recipient.
        recipient: AccountId,
        /// Lower bound of the range.
        tick_lower: Tick,
        /// Upper bound of the range.
        tick_upper: Tick,
        /// token0 transferred out.
        amount0: Amount,
        /// token1 transferred out.
        amount1: Amount,
    },
    /// A swap completed.
    Swap {
        /// Output recipient.
        recipient: AccountId,
        /// Signed token0 delta from the pool's view.
        amount0: AmountDelta,
        /// Signed token1 delta from the pool's view.
        amount1: AmountDelta,
        /// Price after the swap.
        sqrt_price_x96: U256,
        /// In-range liquidity after the swap.
        liquidity: Liquidity,
        /// Tick after the swap.
        tick: Tick,
    },
    /// A flash loan completed.
    Flash {
        /// Borrower that initiated the flash.
        sender: AccountId,
        /// Recipient of the borrowed tokens.
        recipient: AccountId,
        /// token0 borrowed.
        amount0: Amount,
        /// token1 borrowed.
        amount1: Amount,
        /// token0 actually repaid above the borrow.
        paid0: Amount,
        /// token1 actually repaid above the borrow.
        paid1: Amount,
    },
    /// The oracle ring's target size was raised.
    IncreaseObservationCardinalityNext {
        /// Previous target cardinality.
        old: u16,
        /// New target cardinality.
        new: u16,
    },
    /// The protocol-fee split changed.
    SetFeeProtocol {
        /// Previous token0 denominator.
        old0: u8,
        /// Previous token1 denominator.
        old1: u8,
        /// New token0 denominator.
        new0: u8,
        /// New token1 denominator.
        new1: u8,
    },
    /// Protocol fees were withdrawn.
    CollectProtocol {
        /// Factory owner that initiated the withdrawal.
        sender: AccountId,
        /// Transfer recipient.
        recipient: AccountId,
        /// token0 transferred out.
        amount0: Amount,
        /// token1 transferred out.
        amount1: Amount,
    },
}
