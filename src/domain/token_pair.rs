//! Ordered pair of distinct tokens.

use super::TokenId;
use crate::error::PoolError;

/// An ordered pair of distinct tokens, canonically sorted by identifier.
///
/// The canonical ordering guarantees `token0 < token1`, so a given pair
/// of assets always produces the same pool orientation: token0 is the
/// base of the price quote and token1 the quote.
///
/// # Examples
///
/// ```
/// use tidepool::domain::{TokenId, TokenPair};
///
/// let usdc = TokenId::from_bytes([1u8; 32]);
/// let weth = TokenId::from_bytes([2u8; 32]);
///
/// // Order is enforced automatically:
/// let pair = TokenPair::new(weth, usdc).expect("distinct tokens");
/// assert_eq!(pair.token0(), usdc);
/// assert_eq!(pair.token1(), weth);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenPair {
    token0: TokenId,
    token1: TokenId,
}

impl TokenPair {
    /// Creates a new canonically-ordered `TokenPair`.
    ///
    /// The two tokens are automatically sorted so that
    /// `token0 < token1`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfiguration`] if both tokens have
    /// the same identifier.
    pub fn new(a: TokenId, b: TokenId) -> crate::error::Result<Self> {
        if a == b {
            return Err(PoolError::InvalidConfiguration(
                "token pair requires two distinct identifiers",
            ));
        }
        let (token0, token1) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { token0, token1 })
    }

    /// Returns the first token (lower identifier).
    #[must_use]
    pub const fn token0(&self) -> TokenId {
        self.token0
    }

    /// Returns the second token (higher identifier).
    #[must_use]
    pub const fn token1(&self) -> TokenId {
        self.token1
    }

    /// Returns `true` if the given token is part of this pair.
    #[must_use]
    pub fn contains(&self, token: &TokenId) -> bool {
        self.token0 == *token || self.token1 == *token
    }
}
