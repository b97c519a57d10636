//! Two-token settlement layer.

use std::collections::HashMap;

use crate::domain::{AccountId, Amount};
use crate::error::{PoolError, Result};

/// The pool's view of its two token balances.
///
/// Balance reads must reflect every transfer settled so far; the pool
/// verifies callback payments by comparing balances before and after.
/// `transfer0`/`transfer1` move tokens **out** of the pool; payments
/// into the pool happen inside callbacks, against whatever settlement
/// mechanics the implementation provides.
pub trait Reserves {
    /// Current pool balance of token0.
    fn balance0(&self) -> Amount;

    /// Current pool balance of token1.
    fn balance1(&self) -> Amount;

    /// Transfers `amount` of token0 from the pool to `to`.
    ///
    /// # Errors
    ///
    /// Implementations fail when the pool balance cannot cover the
    /// transfer.
    fn transfer0(&mut self, to: &AccountId, amount: Amount) -> Result<()>;

    /// Transfers `amount` of token1 from the pool to `to`.
    ///
    /// # Errors
    ///
    /// Implementations fail when the pool balance cannot cover the
    /// transfer.
    fn transfer1(&mut self, to: &AccountId, amount: Amount) -> Result<()>;
}

/// An in-memory double ledger implementing [`Reserves`].
///
/// Tracks the pool's two balances plus a per-account ledger of received
/// tokens. Callbacks settle payments with [`InMemoryReserves::deposit0`]
/// and [`InMemoryReserves::deposit1`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryReserves {
    balance0: Amount,
    balance1: Amount,
    accounts: HashMap<AccountId, (Amount, Amount)>,
}

impl InMemoryReserves {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits the pool with `amount` of token0.
    pub fn deposit0(&mut self, amount: Amount) {
        self.balance0 = self.balance0.saturating_add(&amount);
    }

    /// Credits the pool with `amount` of token1.
    pub fn deposit1(&mut self, amount: Amount) {
        self.balance1 = self.balance1.saturating_add(&amount);
    }

    /// Token balances `(token0, token1)` received by `account`.
    #[must_use]
    pub fn account_balances(&self, account: &AccountId) -> (Amount, Amount) {
        self.accounts
            .get(account)
            .copied()
            .unwrap_or((Amount::ZERO, Amount::ZERO))
    }
}

impl Reserves for InMemoryReserves {
    fn balance0(&self) -> Amount {
        self.balance0
    }

    fn balance1(&self) -> Amount {
        self.balance1
    }

    fn transfer0(&mut self, to: &AccountId, amount: Amount) -> Result<()> {
        self.balance0 = self
            .balance0
            .checked_sub(&amount)
            .ok_or(PoolError::InsufficientPayment(
                "token0 reserve below transfer",
            ))?;
        let entry = self
            .accounts
            .entry(*to)
            .or_insert((Amount::ZERO, Amount::ZERO));
        entry.0 = entry.0.saturating_add(&amount);
        Ok(())
    }

    fn transfer1(&mut self, to: &AccountId, amount: Amount) -> Result<()> {
        self.balance1 = self
            .balance1
            .checked_sub(&amount)
            .ok_or(PoolError::InsufficientPayment(
                "token1 reserve below transfer",
            ))?;
        let entry = self
            .accounts
            .entry(*to)
            .or_insert((Amount::ZERO, Amount::ZERO));
        entry.1 = entry.1.saturating_add(&amount);
        Ok(())
    }
}
