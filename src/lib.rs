//! # Tidepool
//!
//! A concentrated-liquidity constant-product pool engine: the
//! single-pool state machine that maintains a two-asset reserve, prices
//! trades along a tick-partitioned curve, distributes fees pro-rata to
//! in-range liquidity providers, and exposes a running price/liquidity
//! oracle.
//!
//! All arithmetic is deterministic fixed point — Q64.96 sqrt prices and
//! Q128.128 fee accumulators over 256-bit integers, with 512-bit
//! intermediates where products demand it. No floating point appears
//! anywhere.
//!
//! # Quick Start
//!
//! ```rust
//! use primitive_types::U256;
//! use tidepool::config::PoolConfig;
//! use tidepool::domain::{
//!     AccountId, Amount, FeePips, Liquidity, SqrtPriceX96, Tick, TokenId, TokenPair,
//! };
//! use tidepool::pool::Pool;
//! use tidepool::traits::{InMemoryReserves, MintCallback};
//!
//! // A counterparty that settles exactly what the pool asks for.
//! struct Settler;
//! impl MintCallback<InMemoryReserves> for Settler {
//!     fn mint_callback(
//!         &mut self,
//!         reserves: &mut InMemoryReserves,
//!         amount0: Amount,
//!         amount1: Amount,
//!         _data: &[u8],
//!     ) -> tidepool::error::Result<()> {
//!         reserves.deposit0(amount0);
//!         reserves.deposit1(amount1);
//!         Ok(())
//!     }
//! }
//!
//! // 1. Fix the immutable parameters: pair, fee tier, tick spacing.
//! let pair = TokenPair::new(
//!     TokenId::from_bytes([1u8; 32]),
//!     TokenId::from_bytes([2u8; 32]),
//! )
//! .expect("distinct tokens");
//! let config = PoolConfig::new(
//!     pair,
//!     FeePips::new(3_000).expect("valid fee"),
//!     60,
//!     AccountId::from_bytes([0xff; 32]),
//! )
//! .expect("valid config");
//!
//! // 2. Create and initialize the pool at price 1.0.
//! let mut pool = Pool::new(config, InMemoryReserves::new());
//! let parity = SqrtPriceX96::new(U256::from(1u128) << 96).expect("valid price");
//! pool.initialize(parity, 0).expect("single-shot init");
//!
//! // 3. Mint liquidity around the current price.
//! let alice = AccountId::from_bytes([0xa1; 32]);
//! let lower = Tick::new(-600).expect("valid tick");
//! let upper = Tick::new(600).expect("valid tick");
//! let (amount0, amount1) = pool
//!     .mint(alice, lower, upper, Liquidity::new(1_000_000_000), &[], &mut Settler, 1)
//!     .expect("mint");
//!
//! assert!(amount0.get() > 0);
//! assert!(amount1.get() > 0);
//! assert_eq!(pool.liquidity(), Liquidity::new(1_000_000_000));
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   Embedder    │  owns callbacks + settlement (Reserves)
//! └──────┬───────┘
//!        │ initialize / mint / burn / collect / swap / flash
//!        ▼
//! ┌──────────────┐
//! │  Pool façade  │  lock, snapshot rollback, payment checks
//! └──────┬───────┘
//!        │
//!   ┌────┴─────┬──────────┬───────────┐
//!   ▼          ▼          ▼           ▼
//! ┌──────┐ ┌────────┐ ┌─────────┐ ┌────────┐
//! │ book │ │ oracle │ │  math   │ │ events │
//! └──────┘ └────────┘ └─────────┘ └────────┘
//! ```
//!
//! # Module Guide
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`domain`] | Newtype value types: [`Amount`](domain::Amount), [`Tick`](domain::Tick), [`SqrtPriceX96`](domain::SqrtPriceX96), … |
//! | [`math`] | Q64.96 / Q128.128 fixed-point arithmetic, tick conversion, swap steps |
//! | [`book`] | Tick bitmap, per-tick records, position ledger |
//! | [`oracle`] | Circular observation ring with time-weighted accumulators |
//! | [`pool`] | The pool façade and swap engine |
//! | [`config`] | Immutable pool parameters |
//! | [`traits`] | [`Reserves`](traits::Reserves) settlement seam and settlement callbacks |
//! | [`events`] | [`PoolEvent`](events::PoolEvent) log of observable changes |
//! | [`error`] | [`PoolError`](error::PoolError) unified error enum |
//! | [`prelude`] | Convenience re-exports |

pub mod book;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod math;
pub mod oracle;
pub mod pool;
pub mod prelude;
pub mod traits;
