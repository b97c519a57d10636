//! Fundamental domain value types used throughout the pool engine.
//!
//! This module contains the core value types that model the pool domain:
//! tokens, amounts, ticks, prices, fees, and swap specifications.
//! All types use newtypes with validated constructors to enforce
//! invariants; raw integers appear only behind `get()`.

mod account;
mod amount;
mod amount_delta;
mod fee;
mod liquidity;
mod rounding;
mod sqrt_price;
mod swap_result;
mod swap_spec;
mod tick;
mod token;
mod token_pair;

pub use account::AccountId;
pub use amount::Amount;
pub use amount_delta::AmountDelta;
pub use fee::{FeePips, FeeProtocol, FEE_DENOMINATOR};
pub use liquidity::Liquidity;
pub use rounding::Rounding;
pub use sqrt_price::{SqrtPriceX96, MAX_SQRT_RATIO, MIN_SQRT_RATIO};
pub use swap_result::SwapResult;
pub use swap_spec::SwapSpec;
pub use tick::Tick;
pub use token::TokenId;
pub use token_pair::TokenPair;
