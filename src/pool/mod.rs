//! The single-pool state machine.
//!
//! [`Pool`] ties the books together: it owns the tick book, tick
//! bitmap, position ledger, oracle ring, and root state, and exposes
//! the externally callable operations — `initialize`, `mint`, `burn`,
//! `collect`, `swap`, `flash`, and the protocol-fee controls.
//!
//! # Atomicity
//!
//! Every state-mutating operation is guarded by the reentrancy lock and
//! staged against a snapshot: on any error the pool state is restored
//! wholesale, so partial effects are never observable. Transfers already
//! performed through [`Reserves`] belong to the settlement layer and are
//! its concern, mirroring the external-token model.

mod swap;

#[cfg(test)]
mod proptest_properties;

use primitive_types::U256;
use tracing::debug;

use crate::book::{PositionBook, PositionState, TickBitmap, TickBook};
use crate::config::PoolConfig;
use crate::domain::{
    AccountId, Amount, FeePips, FeeProtocol, Liquidity, Rounding, SqrtPriceX96, Tick, TokenPair,
};
use crate::error::{PoolError, Result};
use crate::events::PoolEvent;
use crate::math::{full_math, liquidity_math, sqrt_price_math, tick_math};
use crate::oracle::Observations;
use crate::traits::{FlashCallback, MintCallback, Reserves};

/// Reentrancy state of the pool.
///
/// `initialize` is the only transition out of `Uninitialized`; every
/// mutating operation afterwards moves `Unlocked -> Locked -> Unlocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No starting price yet; only `initialize` is callable.
    Uninitialized,
    /// At rest between operations.
    Unlocked,
    /// Inside a mutating operation; reentry fails with `Locked`.
    Locked,
}

/// The pool's tightly packed root record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot0 {
    /// Current sqrt price, Q64.96. Zero before initialization.
    pub sqrt_price_x96: U256,
    /// Current tick; always `tick_at_sqrt_ratio(sqrt_price_x96)`.
    pub tick: i32,
    /// Head of the oracle ring.
    pub observation_index: u16,
    /// Live size of the oracle ring.
    pub observation_cardinality: u16,
    /// Target size the ring will grow into.
    pub observation_cardinality_next: u16,
    /// Protocol share of swap fees.
    pub fee_protocol: FeeProtocol,
    /// Reentrancy flag.
    pub lock: LockState,
}

impl Default for Slot0 {
    fn default() -> Self {
        Self {
            sqrt_price_x96: U256::zero(),
            tick: 0,
            observation_index: 0,
            observation_cardinality: 0,
            observation_cardinality_next: 0,
            fee_protocol: FeeProtocol::OFF,
            lock: LockState::Uninitialized,
        }
    }
}

/// Accrued, uncollected protocol fees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProtocolFees {
    /// token0 owed to the protocol.
    pub token0: Amount,
    /// token1 owed to the protocol.
    pub token1: Amount,
}

/// The mutable half of the pool, cloned for snapshot rollback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PoolState {
    pub(crate) slot0: Slot0,
    pub(crate) fee_growth_global_0_x128: U256,
    pub(crate) fee_growth_global_1_x128: U256,
    pub(crate) protocol_fees: ProtocolFees,
    pub(crate) liquidity: u128,
    pub(crate) ticks: TickBook,
    pub(crate) bitmap: TickBitmap,
    pub(crate) positions: PositionBook,
    pub(crate) observations: Observations,
    pub(crate) events: Vec<PoolEvent>,
}

/// A concentrated-liquidity constant-product pool.
///
/// Generic over the [`Reserves`] settlement layer so the engine can run
/// against real token plumbing or the in-memory double ledger.
#[derive(Debug, Clone)]
pub struct Pool<R: Reserves> {
    token_pair: TokenPair,
    fee: FeePips,
    tick_spacing: i32,
    max_liquidity_per_tick: u128,
    factory_owner: AccountId,
    pub(crate) state: PoolState,
    pub(crate) reserves: R,
}

impl<R: Reserves> Pool<R> {
    /// Creates an uninitialized pool from its immutable parameters.
    pub fn new(config: PoolConfig, reserves: R) -> Self {
        Self {
            token_pair: config.token_pair(),
            fee: config.fee(),
            tick_spacing: config.tick_spacing(),
            max_liquidity_per_tick: config.max_liquidity_per_tick(),
            factory_owner: config.factory_owner(),
            state: PoolState::default(),
            reserves,
        }
    }

    // -- accessors -----------------------------------------------------------

    /// The canonical token pair.
    #[must_use]
    pub const fn token_pair(&self) -> TokenPair {
        self.token_pair
    }

    /// The trade fee.
    #[must_use]
    pub const fn fee(&self) -> FeePips {
        self.fee
    }

    /// The tick spacing.
    #[must_use]
    pub const fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    /// The per-tick gross liquidity cap.
    #[must_use]
    pub const fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }

    /// The root record.
    #[must_use]
    pub fn slot0(&self) -> Slot0 {
        self.state.slot0
    }

    /// Current in-range liquidity.
    #[must_use]
    pub fn liquidity(&self) -> Liquidity {
        Liquidity::new(self.state.liquidity)
    }

    /// Global token0 fee growth, Q128.128.
    #[must_use]
    pub fn fee_growth_global_0_x128(&self) -> U256 {
        self.state.fee_growth_global_0_x128
    }

    /// Global token1 fee growth, Q128.128.
    #[must_use]
    pub fn fee_growth_global_1_x128(&self) -> U256 {
        self.state.fee_growth_global_1_x128
    }

    /// Accrued protocol fees.
    #[must_use]
    pub fn protocol_fees(&self) -> ProtocolFees {
        self.state.protocol_fees
    }

    /// A position record, if present.
    #[must_use]
    pub fn position(&self, owner: &AccountId, lower: Tick, upper: Tick) -> Option<&PositionState> {
        self.state.positions.get(owner, lower.get(), upper.get())
    }

    /// Tick record, if initialized.
    #[must_use]
    pub fn tick_state(&self, tick: Tick) -> Option<&crate::book::TickState> {
        self.state.ticks.get(tick.get())
    }

    /// Whether `tick` is set in the bitmap.
    #[must_use]
    pub fn tick_initialized(&self, tick: Tick) -> bool {
        self.state.bitmap.is_initialized(tick, self.tick_spacing)
    }

    /// Read-only view of the position ledger.
    #[must_use]
    pub fn positions(&self) -> &PositionBook {
        &self.state.positions
    }

    /// Read-only view of the tick book.
    #[must_use]
    pub fn ticks(&self) -> &TickBook {
        &self.state.ticks
    }

    /// Read-only access to the settlement layer.
    #[must_use]
    pub fn reserves(&self) -> &R {
        &self.reserves
    }

    /// Drains the pending event log.
    pub fn take_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.state.events)
    }

    // -- lock / snapshot ------------------------------------------------------

    /// Takes the mutex and snapshots the state for rollback.
    fn begin(&mut self) -> Result<PoolState> {
        match self.state.slot0.lock {
            LockState::Unlocked => {
                let saved = self.state.clone();
                self.state.slot0.lock = LockState::Locked;
                Ok(saved)
            }
            LockState::Uninitialized | LockState::Locked => Err(PoolError::Locked),
        }
    }

    /// Releases the mutex after a successful operation.
    pub(crate) fn commit(&mut self) {
        self.state.slot0.lock = LockState::Unlocked;
    }

    // -- lifecycle ------------------------------------------------------------

    /// Sets the starting price and seeds the oracle. Single shot.
    ///
    /// # Errors
    ///
    /// - [`PoolError::AlreadyInitialized`] on a second call.
    /// - [`PoolError::BadSqrtPriceLimit`] via the price validation in
    ///   [`SqrtPriceX96`].
    pub fn initialize(&mut self, sqrt_price_x96: SqrtPriceX96, time: u32) -> Result<Tick> {
        if self.state.slot0.lock != LockState::Uninitialized {
            return Err(PoolError::AlreadyInitialized);
        }
        let tick = tick_math::tick_at_sqrt_ratio(sqrt_price_x96.get())?;
        let (cardinality, cardinality_next) = self.state.observations.initialize(time);
        self.state.slot0 = Slot0 {
            sqrt_price_x96: sqrt_price_x96.get(),
            tick,
            observation_index: 0,
            observation_cardinality: cardinality,
            observation_cardinality_next: cardinality_next,
            fee_protocol: FeeProtocol::OFF,
            lock: LockState::Unlocked,
        };
        self.state.events.push(PoolEvent::Initialize {
            sqrt_price_x96: sqrt_price_x96.get(),
            tick: Tick::new(tick)?,
        });
        debug!(tick, %sqrt_price_x96, "pool initialized");
        Ok(Tick::new(tick)?)
    }

    // -- liquidity operations -------------------------------------------------

    /// Mints `amount` liquidity into `[lower, upper)` for `recipient`.
    ///
    /// The callback must pay the returned token amounts into the pool
    /// before it returns; the pool verifies its balances afterwards.
    ///
    /// Returns `(amount0, amount1)` paid in.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ZeroAmount`] for a zero mint.
    /// - [`PoolError::TickMisordered`] / [`PoolError::TickNotSpaced`]
    ///   for a bad range.
    /// - [`PoolError::InsufficientPayment`] if the callback settles
    ///   short.
    #[allow(clippy::too_many_arguments)]
    pub fn mint<C: MintCallback<R>>(
        &mut self,
        recipient: AccountId,
        lower: Tick,
        upper: Tick,
        amount: Liquidity,
        data: &[u8],
        callback: &mut C,
        time: u32,
    ) -> Result<(Amount, Amount)> {
        let saved = self.begin()?;
        match self.mint_inner(recipient, lower, upper, amount, data, callback, time) {
            Ok(v) => {
                self.commit();
                Ok(v)
            }
            Err(e) => {
                self.state = saved;
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn mint_inner<C: MintCallback<R>>(
        &mut self,
        recipient: AccountId,
        lower: Tick,
        upper: Tick,
        amount: Liquidity,
        data: &[u8],
        callback: &mut C,
        time: u32,
    ) -> Result<(Amount, Amount)> {
        if amount.is_zero() {
            return Err(PoolError::ZeroAmount("minted liquidity"));
        }
        let delta = liquidity_to_delta(amount)?;
        let (amount0_int, amount1_int) = self.modify_position(recipient, lower, upper, delta, time)?;
        let amount0 = Amount::new(amount0_int.unsigned_abs());
        let amount1 = Amount::new(amount1_int.unsigned_abs());

        let balance0_before = self.reserves.balance0();
        let balance1_before = self.reserves.balance1();
        callback.mint_callback(&mut self.reserves, amount0, amount1, data)?;
        if !amount0.is_zero() {
            let required = balance0_before
                .checked_add(&amount0)
                .ok_or(PoolError::MathOverflow("token0 balance"))?;
            if self.reserves.balance0() < required {
                return Err(PoolError::InsufficientPayment("token0 for mint"));
            }
        }
        if !amount1.is_zero() {
            let required = balance1_before
                .checked_add(&amount1)
                .ok_or(PoolError::MathOverflow("token1 balance"))?;
            if self.reserves.balance1() < required {
                return Err(PoolError::InsufficientPayment("token1 for mint"));
            }
        }

        self.state.events.push(PoolEvent::Mint {
            owner: recipient,
            tick_lower: lower,
            tick_upper: upper,
            amount,
            amount0,
            amount1,
        });
        debug!(%amount, %amount0, %amount1, lower = lower.get(), upper = upper.get(), "mint");
        Ok((amount0, amount1))
    }

    /// Burns `amount` liquidity from the caller's position and credits
    /// the proceeds to its owed counters. No tokens move here; they are
    /// withdrawn later with [`Pool::collect`].
    ///
    /// A zero `amount` is a poke: it settles fees into the owed
    /// counters without changing liquidity.
    ///
    /// # Errors
    ///
    /// Range errors as in [`Pool::mint`];
    /// [`PoolError::LiquidityOverflow`] when burning more than the
    /// position holds.
    pub fn burn(
        &mut self,
        owner: AccountId,
        lower: Tick,
        upper: Tick,
        amount: Liquidity,
        time: u32,
    ) -> Result<(Amount, Amount)> {
        let saved = self.begin()?;
        match self.burn_inner(owner, lower, upper, amount, time) {
            Ok(v) => {
                self.commit();
                Ok(v)
            }
            Err(e) => {
                self.state = saved;
                Err(e)
            }
        }
    }

    fn burn_inner(
        &mut self,
        owner: AccountId,
        lower: Tick,
        upper: Tick,
        amount: Liquidity,
        time: u32,
    ) -> Result<(Amount, Amount)> {
        let delta = liquidity_to_delta(amount)?;
        let (amount0_int, amount1_int) =
            self.modify_position(owner, lower, upper, -delta, time)?;
        let amount0 = Amount::new(amount0_int.unsigned_abs());
        let amount1 = Amount::new(amount1_int.unsigned_abs());

        if !amount0.is_zero() || !amount1.is_zero() {
            self.state
                .positions
                .credit_owed(&owner, lower.get(), upper.get(), amount0, amount1);
        }

        self.state.events.push(PoolEvent::Burn {
            owner,
            tick_lower: lower,
            tick_upper: upper,
            amount,
            amount0,
            amount1,
        });
        debug!(%amount, %amount0, %amount1, lower = lower.get(), upper = upper.get(), "burn");
        Ok((amount0, amount1))
    }

    /// Transfers up to the requested owed amounts out of a position.
    ///
    /// The range is not validated: collecting from a dead or never
    /// existing position yields zero.
    ///
    /// # Errors
    ///
    /// [`PoolError::Locked`] on reentry; settlement errors from the
    /// reserves.
    #[allow(clippy::too_many_arguments)]
    pub fn collect(
        &mut self,
        owner: AccountId,
        recipient: AccountId,
        lower: Tick,
        upper: Tick,
        amount0_requested: Amount,
        amount1_requested: Amount,
    ) -> Result<(Amount, Amount)> {
        let saved = self.begin()?;
        let result = self.collect_inner(
            owner,
            recipient,
            lower,
            upper,
            amount0_requested,
            amount1_requested,
        );
        match result {
            Ok(v) => {
                self.commit();
                Ok(v)
            }
            Err(e) => {
                self.state = saved;
                Err(e)
            }
        }
    }

    fn collect_inner(
        &mut self,
        owner: AccountId,
        recipient: AccountId,
        lower: Tick,
        upper: Tick,
        amount0_requested: Amount,
        amount1_requested: Amount,
    ) -> Result<(Amount, Amount)> {
        let (amount0, amount1) = self.state.positions.collect(
            &owner,
            lower.get(),
            upper.get(),
            amount0_requested,
            amount1_requested,
        );
        if !amount0.is_zero() {
            self.reserves.transfer0(&recipient, amount0)?;
        }
        if !amount1.is_zero() {
            self.reserves.transfer1(&recipient, amount1)?;
        }
        self.state.events.push(PoolEvent::Collect {
            owner,
            recipient,
            tick_lower: lower,
            tick_upper: upper,
            amount0,
            amount1,
        });
        debug!(%amount0, %amount1, "collect");
        Ok((amount0, amount1))
    }

    // -- flash -----------------------------------------------------------------

    /// Lends `amount0`/`amount1` for the duration of the callback.
    ///
    /// The callback must return the principal plus the pip fee on each
    /// borrowed amount; any surplus actually paid is distributed to the
    /// protocol (per the fee-protocol split) and to in-range liquidity.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InsufficientLiquidity`] with no in-range
    ///   liquidity.
    /// - [`PoolError::InsufficientPayment`] if the repayment is short.
    #[allow(clippy::too_many_arguments)]
    pub fn flash<C: FlashCallback<R>>(
        &mut self,
        sender: AccountId,
        recipient: AccountId,
        amount0: Amount,
        amount1: Amount,
        data: &[u8],
        callback: &mut C,
    ) -> Result<()> {
        let saved = self.begin()?;
        match self.flash_inner(sender, recipient, amount0, amount1, data, callback) {
            Ok(()) => {
                self.commit();
                Ok(())
            }
            Err(e) => {
                self.state = saved;
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn flash_inner<C: FlashCallback<R>>(
        &mut self,
        sender: AccountId,
        recipient: AccountId,
        amount0: Amount,
        amount1: Amount,
        data: &[u8],
        callback: &mut C,
    ) -> Result<()> {
        if self.state.liquidity == 0 {
            return Err(PoolError::InsufficientLiquidity);
        }
        let fee0 = pip_fee(amount0, self.fee)?;
        let fee1 = pip_fee(amount1, self.fee)?;
        let balance0_before = self.reserves.balance0();
        let balance1_before = self.reserves.balance1();

        if !amount0.is_zero() {
            self.reserves.transfer0(&recipient, amount0)?;
        }
        if !amount1.is_zero() {
            self.reserves.transfer1(&recipient, amount1)?;
        }
        callback.flash_callback(&mut self.reserves, fee0, fee1, data)?;

        let balance0_after = self.reserves.balance0();
        let balance1_after = self.reserves.balance1();
        let owed0 = balance0_before
            .checked_add(&fee0)
            .ok_or(PoolError::MathOverflow("token0 balance"))?;
        let owed1 = balance1_before
            .checked_add(&fee1)
            .ok_or(PoolError::MathOverflow("token1 balance"))?;
        if balance0_after < owed0 {
            return Err(PoolError::InsufficientPayment("token0 for flash"));
        }
        if balance1_after < owed1 {
            return Err(PoolError::InsufficientPayment("token1 for flash"));
        }

        // The surplus actually paid, fee floor included.
        let paid0 = balance0_after
            .checked_sub(&balance0_before)
            .unwrap_or(Amount::ZERO);
        let paid1 = balance1_after
            .checked_sub(&balance1_before)
            .unwrap_or(Amount::ZERO);

        if !paid0.is_zero() {
            let protocol_share = self.state.slot0.fee_protocol.token0();
            let fees0 = if protocol_share == 0 {
                Amount::ZERO
            } else {
                Amount::new(paid0.get() / u128::from(protocol_share))
            };
            if !fees0.is_zero() {
                self.state.protocol_fees.token0 =
                    self.state.protocol_fees.token0.saturating_add(&fees0);
            }
            let growth = full_math::mul_div(
                U256::from(paid0.get() - fees0.get()),
                crate::math::Q128,
                U256::from(self.state.liquidity),
            )?;
            self.state.fee_growth_global_0_x128 = self
                .state
                .fee_growth_global_0_x128
                .overflowing_add(growth)
                .0;
        }
        if !paid1.is_zero() {
            let protocol_share = self.state.slot0.fee_protocol.token1();
            let fees1 = if protocol_share == 0 {
                Amount::ZERO
            } else {
                Amount::new(paid1.get() / u128::from(protocol_share))
            };
            if !fees1.is_zero() {
                self.state.protocol_fees.token1 =
                    self.state.protocol_fees.token1.saturating_add(&fees1);
            }
            let growth = full_math::mul_div(
                U256::from(paid1.get() - fees1.get()),
                crate::math::Q128,
                U256::from(self.state.liquidity),
            )?;
            self.state.fee_growth_global_1_x128 = self
                .state
                .fee_growth_global_1_x128
                .overflowing_add(growth)
                .0;
        }

        self.state.events.push(PoolEvent::Flash {
            sender,
            recipient,
            amount0,
            amount1,
            paid0,
            paid1,
        });
        debug!(%amount0, %amount1, %paid0, %paid1, "flash");
        Ok(())
    }

    // -- protocol-fee controls -------------------------------------------------

    /// Sets the protocol's share of swap fees. Factory owner only.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Unauthorized`] for any other caller.
    /// - [`PoolError::BadFeeProtocol`] for nibbles outside 0 or 4..=10.
    pub fn set_fee_protocol(&mut self, caller: AccountId, fee0: u8, fee1: u8) -> Result<()> {
        let saved = self.begin()?;
        let result = (|| {
            if caller != self.factory_owner {
                return Err(PoolError::Unauthorized);
            }
            let new = FeeProtocol::from_parts(fee0, fee1)?;
            let old = self.state.slot0.fee_protocol;
            self.state.slot0.fee_protocol = new;
            self.state.events.push(PoolEvent::SetFeeProtocol {
                old0: old.token0(),
                old1: old.token1(),
                new0: fee0,
                new1: fee1,
            });
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.commit();
                Ok(())
            }
            Err(e) => {
                self.state = saved;
                Err(e)
            }
        }
    }

    /// Withdraws accrued protocol fees. Factory owner only.
    ///
    /// A fully drained side keeps a residual unit in the slot, so the
    /// accumulator never returns to zero once used.
    ///
    /// # Errors
    ///
    /// [`PoolError::Unauthorized`] for any other caller.
    pub fn collect_protocol(
        &mut self,
        caller: AccountId,
        recipient: AccountId,
        amount0_requested: Amount,
        amount1_requested: Amount,
    ) -> Result<(Amount, Amount)> {
        let saved = self.begin()?;
        let result = self.collect_protocol_inner(
            caller,
            recipient,
            amount0_requested,
            amount1_requested,
        );
        match result {
            Ok(v) => {
                self.commit();
                Ok(v)
            }
            Err(e) => {
                self.state = saved;
                Err(e)
            }
        }
    }

    fn collect_protocol_inner(
        &mut self,
        caller: AccountId,
        recipient: AccountId,
        amount0_requested: Amount,
        amount1_requested: Amount,
    ) -> Result<(Amount, Amount)> {
        if caller != self.factory_owner {
            return Err(PoolError::Unauthorized);
        }
        let mut amount0 = amount0_requested.min(self.state.protocol_fees.token0);
        let mut amount1 = amount1_requested.min(self.state.protocol_fees.token1);

        if !amount0.is_zero() {
            if amount0 == self.state.protocol_fees.token0 {
                // Leave a residual unit in the slot.
                amount0 = amount0.checked_sub(&Amount::new(1)).unwrap_or(Amount::ZERO);
            }
            self.state.protocol_fees.token0 = self
                .state
                .protocol_fees
                .token0
                .checked_sub(&amount0)
                .unwrap_or(Amount::ZERO);
            if !amount0.is_zero() {
                self.reserves.transfer0(&recipient, amount0)?;
            }
        }
        if !amount1.is_zero() {
            if amount1 == self.state.protocol_fees.token1 {
                amount1 = amount1.checked_sub(&Amount::new(1)).unwrap_or(Amount::ZERO);
            }
            self.state.protocol_fees.token1 = self
                .state
                .protocol_fees
                .token1
                .checked_sub(&amount1)
                .unwrap_or(Amount::ZERO);
            if !amount1.is_zero() {
                self.reserves.transfer1(&recipient, amount1)?;
            }
        }

        self.state.events.push(PoolEvent::CollectProtocol {
            sender: caller,
            recipient,
            amount0,
            amount1,
        });
        Ok((amount0, amount1))
    }

    /// Raises the oracle ring's target size.
    ///
    /// Emits an event only when the target actually changed.
    ///
    /// # Errors
    ///
    /// [`PoolError::Locked`] on reentry or before initialization.
    pub fn increase_observation_cardinality_next(&mut self, next: u16) -> Result<()> {
        let saved = self.begin()?;
        let result: Result<()> = {
            let old = self.state.slot0.observation_cardinality_next;
            let new = self.state.observations.grow(old, next);
            self.state.slot0.observation_cardinality_next = new;
            if old != new {
                self.state
                    .events
                    .push(PoolEvent::IncreaseObservationCardinalityNext { old, new });
            }
            Ok(())
        };
        match result {
            Ok(()) => {
                self.commit();
                Ok(())
            }
            Err(e) => {
                self.state = saved;
                Err(e)
            }
        }
    }

    // -- read-only views --------------------------------------------------------

    /// Observes the oracle accumulators `seconds_agos` before `time`.
    ///
    /// # Errors
    ///
    /// - [`PoolError::OracleUninitialized`] before `initialize`.
    /// - [`PoolError::OracleOld`] for windows beyond stored history.
    pub fn observe(&self, time: u32, seconds_agos: &[u32]) -> Result<Vec<(i64, U256)>> {
        if self.state.slot0.lock == LockState::Uninitialized {
            return Err(PoolError::OracleUninitialized);
        }
        self.state.observations.observe(
            time,
            seconds_agos,
            self.state.slot0.tick,
            self.state.slot0.observation_index,
            self.state.liquidity,
            self.state.slot0.observation_cardinality,
        )
    }

    /// Snapshots `(tick_cumulative, seconds_per_liquidity, seconds)`
    /// inside `[lower, upper)`.
    ///
    /// The snapshots are only comparable against others taken while the
    /// range holds liquidity.
    ///
    /// # Errors
    ///
    /// - [`PoolError::TickMisordered`] for a bad range.
    /// - [`PoolError::PositionNotFound`] if either bound is
    ///   uninitialized.
    pub fn snapshot_cumulatives_inside(
        &self,
        lower: Tick,
        upper: Tick,
        time: u32,
    ) -> Result<(i64, U256, u32)> {
        if lower >= upper {
            return Err(PoolError::TickMisordered("snapshot range"));
        }
        let lower_state = self
            .state
            .ticks
            .get(lower.get())
            .filter(|s| s.initialized)
            .ok_or(PoolError::PositionNotFound("lower bound uninitialized"))?
            .clone();
        let upper_state = self
            .state
            .ticks
            .get(upper.get())
            .filter(|s| s.initialized)
            .ok_or(PoolError::PositionNotFound("upper bound uninitialized"))?
            .clone();

        let tick = self.state.slot0.tick;
        if tick < lower.get() {
            Ok((
                lower_state
                    .tick_cumulative_outside
                    .wrapping_sub(upper_state.tick_cumulative_outside),
                lower_state
                    .seconds_per_liquidity_outside_x128
                    .overflowing_sub(upper_state.seconds_per_liquidity_outside_x128)
                    .0,
                lower_state
                    .seconds_outside
                    .wrapping_sub(upper_state.seconds_outside),
            ))
        } else if tick < upper.get() {
            let (tick_cumulative, seconds_per_liquidity) =
                self.state.observations.observe_single(
                    time,
                    0,
                    tick,
                    self.state.slot0.observation_index,
                    self.state.liquidity,
                    self.state.slot0.observation_cardinality,
                )?;
            Ok((
                tick_cumulative
                    .wrapping_sub(lower_state.tick_cumulative_outside)
                    .wrapping_sub(upper_state.tick_cumulative_outside),
                seconds_per_liquidity
                    .overflowing_sub(lower_state.seconds_per_liquidity_outside_x128)
                    .0
                    .overflowing_sub(upper_state.seconds_per_liquidity_outside_x128)
                    .0,
                time.wrapping_sub(lower_state.seconds_outside)
                    .wrapping_sub(upper_state.seconds_outside),
            ))
        } else {
            Ok((
                upper_state
                    .tick_cumulative_outside
                    .wrapping_sub(lower_state.tick_cumulative_outside),
                upper_state
                    .seconds_per_liquidity_outside_x128
                    .overflowing_sub(lower_state.seconds_per_liquidity_outside_x128)
                    .0,
                upper_state
                    .seconds_outside
                    .wrapping_sub(lower_state.seconds_outside),
            ))
        }
    }

    // -- position plumbing -------------------------------------------------------

    /// Validates a range and applies a signed liquidity delta, returning
    /// the signed token amounts from the pool's point of view.
    pub(crate) fn modify_position(
        &mut self,
        owner: AccountId,
        lower: Tick,
        upper: Tick,
        liquidity_delta: i128,
        time: u32,
    ) -> Result<(i128, i128)> {
        if lower >= upper {
            return Err(PoolError::TickMisordered("position range"));
        }
        if !lower.is_aligned(self.tick_spacing) {
            return Err(PoolError::TickNotSpaced("lower tick"));
        }
        if !upper.is_aligned(self.tick_spacing) {
            return Err(PoolError::TickNotSpaced("upper tick"));
        }

        self.update_position(owner, lower, upper, liquidity_delta, time)?;

        let mut amount0 = 0i128;
        let mut amount1 = 0i128;
        if liquidity_delta != 0 {
            let tick = self.state.slot0.tick;
            let sqrt_lower = tick_math::sqrt_ratio_at_tick(lower.get())?;
            let sqrt_upper = tick_math::sqrt_ratio_at_tick(upper.get())?;
            if tick < lower.get() {
                // Range entirely above the price: all token0.
                amount0 = signed_amount0(sqrt_lower, sqrt_upper, liquidity_delta)?;
            } else if tick < upper.get() {
                // Range straddles the price: both tokens, and the
                // in-range liquidity moves. Checkpoint the oracle first.
                let (index, cardinality) = self.state.observations.write(
                    self.state.slot0.observation_index,
                    time,
                    tick,
                    self.state.liquidity,
                    self.state.slot0.observation_cardinality,
                    self.state.slot0.observation_cardinality_next,
                );
                self.state.slot0.observation_index = index;
                self.state.slot0.observation_cardinality = cardinality;

                let sqrt_current = self.state.slot0.sqrt_price_x96;
                amount0 = signed_amount0(sqrt_current, sqrt_upper, liquidity_delta)?;
                amount1 = signed_amount1(sqrt_lower, sqrt_current, liquidity_delta)?;
                self.state.liquidity =
                    liquidity_math::add_delta(self.state.liquidity, liquidity_delta)?;
            } else {
                // Range entirely below the price: all token1.
                amount1 = signed_amount1(sqrt_lower, sqrt_upper, liquidity_delta)?;
            }
        }
        Ok((amount0, amount1))
    }

    /// Updates the position record and both tick bounds, flipping bitmap
    /// bits and clearing emptied ticks as needed.
    fn update_position(
        &mut self,
        owner: AccountId,
        lower: Tick,
        upper: Tick,
        liquidity_delta: i128,
        time: u32,
    ) -> Result<()> {
        let tick = self.state.slot0.tick;
        let fee_growth_global_0 = self.state.fee_growth_global_0_x128;
        let fee_growth_global_1 = self.state.fee_growth_global_1_x128;

        let mut flipped_lower = false;
        let mut flipped_upper = false;
        if liquidity_delta != 0 {
            let (tick_cumulative, seconds_per_liquidity) =
                self.state.observations.observe_single(
                    time,
                    0,
                    tick,
                    self.state.slot0.observation_index,
                    self.state.liquidity,
                    self.state.slot0.observation_cardinality,
                )?;

            flipped_lower = self.state.ticks.update(
                lower.get(),
                tick,
                liquidity_delta,
                fee_growth_global_0,
                fee_growth_global_1,
                seconds_per_liquidity,
                tick_cumulative,
                time,
                false,
                self.max_liquidity_per_tick,
            )?;
            flipped_upper = self.state.ticks.update(
                upper.get(),
                tick,
                liquidity_delta,
                fee_growth_global_0,
                fee_growth_global_1,
                seconds_per_liquidity,
                tick_cumulative,
                time,
                true,
                self.max_liquidity_per_tick,
            )?;
            if flipped_lower {
                self.state.bitmap.flip(lower, self.tick_spacing)?;
            }
            if flipped_upper {
                self.state.bitmap.flip(upper, self.tick_spacing)?;
            }
        }

        let (inside0, inside1) = self.state.ticks.fee_growth_inside(
            lower.get(),
            upper.get(),
            tick,
            fee_growth_global_0,
            fee_growth_global_1,
        );
        self.state.positions.update(
            &owner,
            lower.get(),
            upper.get(),
            liquidity_delta,
            inside0,
            inside1,
        )?;

        if liquidity_delta < 0 {
            if flipped_lower {
                self.state.ticks.clear(lower.get());
            }
            if flipped_upper {
                self.state.ticks.clear(upper.get());
            }
        }
        Ok(())
    }
}

// -- free helpers --------------------------------------------------------------

/// Converts a liquidity amount to a signed delta.
fn liquidity_to_delta(amount: Liquidity) -> Result<i128> {
    i128::try_from(amount.get()).map_err(|_| PoolError::MathOverflow("liquidity delta"))
}

/// Fee on a flash borrow: `ceil(amount * fee / 10^6)`.
fn pip_fee(amount: Amount, fee: FeePips) -> Result<Amount> {
    let fee = full_math::mul_div_rounding_up(
        U256::from(amount.get()),
        U256::from(fee.get()),
        U256::from(crate::domain::FEE_DENOMINATOR),
    )?;
    if fee > U256::from(u128::MAX) {
        return Err(PoolError::MathOverflow("flash fee"));
    }
    Ok(Amount::new(fee.low_u128()))
}

/// Signed token0 amount for a liquidity delta between two sqrt prices.
///
/// Positive deltas round up (owed to the pool), negative round down
/// (paid out by the pool).
fn signed_amount0(sqrt_a: U256, sqrt_b: U256, liquidity_delta: i128) -> Result<i128> {
    if liquidity_delta < 0 {
        let amount = sqrt_price_math::amount0_delta(
            sqrt_a,
            sqrt_b,
            liquidity_delta.unsigned_abs(),
            Rounding::Down,
        )?;
        Ok(-to_i128(amount)?)
    } else {
        let amount =
            sqrt_price_math::amount0_delta(sqrt_a, sqrt_b, liquidity_delta as u128, Rounding::Up)?;
        to_i128(amount)
    }
}

/// Signed token1 amount for a liquidity delta between two sqrt prices.
fn signed_amount1(sqrt_a: U256, sqrt_b: U256, liquidity_delta: i128) -> Result<i128> {
    if liquidity_delta < 0 {
        let amount = sqrt_price_math::amount1_delta(
            sqrt_a,
            sqrt_b,
            liquidity_delta.unsigned_abs(),
            Rounding::Down,
        )?;
        Ok(-to_i128(amount)?)
    } else {
        let amount =
            sqrt_price_math::amount1_delta(sqrt_a, sqrt_b, liquidity_delta as u128, Rounding::Up)?;
        to_i128(amount)
    }
}

/// Narrows a non-negative U256 amount into the signed accounting range.
pub(crate) fn to_i128(value: U256) -> Result<i128> {
    if value > U256::from(i128::MAX as u128) {
        return Err(PoolError::MathOverflow("amount exceeds signed range"));
    }
    Ok(value.low_u128() as i128)
}
