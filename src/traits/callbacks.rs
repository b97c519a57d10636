//! Mid-operation settlement callbacks.
//!
//! Mint, swap, and flash all invoke external code in the middle of the
//! operation. The contract is identical for all three: the callback
//! receives the owed amounts and mutable access to the settlement
//! layer, must settle balances before returning, and any error aborts
//! the whole operation. Return values carry no information beyond
//! success.

use crate::domain::{Amount, AmountDelta};
use crate::error::Result;
use crate::traits::Reserves;

/// Counterparty of a `mint`: pays the owed token amounts into the pool.
pub trait MintCallback<R: Reserves> {
    /// Called with the amounts the pool must receive for the minted
    /// liquidity. The pool verifies its balances after this returns.
    ///
    /// # Errors
    ///
    /// Any error aborts the mint.
    fn mint_callback(
        &mut self,
        reserves: &mut R,
        amount0_owed: Amount,
        amount1_owed: Amount,
        data: &[u8],
    ) -> Result<()>;
}

/// Counterparty of a `swap`: pays the input leg into the pool.
///
/// The deltas follow the pool's signed convention: the positive delta
/// is the input owed to the pool, the negative delta was already paid
/// out to the recipient.
pub trait SwapCallback<R: Reserves> {
    /// Called after the output transfer, before the input balance check.
    ///
    /// # Errors
    ///
    /// Any error aborts the swap.
    fn swap_callback(
        &mut self,
        reserves: &mut R,
        amount0_delta: AmountDelta,
        amount1_delta: AmountDelta,
        data: &[u8],
    ) -> Result<()>;
}

/// Counterparty of a `flash` loan: returns principal plus fee.
pub trait FlashCallback<R: Reserves> {
    /// Called with the fees owed on top of the borrowed amounts.
    ///
    /// # Errors
    ///
    /// Any error aborts the flash.
    fn flash_callback(
        &mut self,
        reserves: &mut R,
        fee0: Amount,
        fee1: Amount,
        data: &[u8],
    ) -> Result<()>;
}
