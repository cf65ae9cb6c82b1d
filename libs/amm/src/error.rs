//! Error types for weighted-pool calculations
//!
//! Every failure the engine can produce is a typed outcome; validation errors
//! are returned before any balance mutation is staged.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during pool math and pool state mutation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AmmError {
    /// Input and output denomination are identical
    #[error("cannot trade the same denomination in and out: {denom}")]
    SameDenomination { denom: String },

    /// A requested denomination is not an asset of the pool
    #[error("denomination {denom} is not an asset of pool {pool_id}")]
    UnknownDenomination { pool_id: u64, denom: String },

    /// Operation attempted outside the pool's active time window
    #[error("pool {pool_id} is outside its active window")]
    PoolInactive { pool_id: u64 },

    /// A computed amount truncated to zero or negative; the trade or join is
    /// too small or numerically degenerate to execute
    #[error("computed amount is zero or negative after truncation")]
    InvalidMathApprox,

    /// Requested exact-out amount is not strictly less than the pool balance
    #[error("cannot swap out {requested} {denom}: pool only holds {available}")]
    TooManyTokensOut {
        denom: String,
        requested: Decimal,
        available: Decimal,
    },

    /// Slippage protection: computed output below the caller's minimum, or
    /// computed input above the caller's maximum
    #[error("slippage limit exceeded for {denom}: computed {computed}, limit {limit}")]
    LimitExceeded {
        denom: String,
        computed: Decimal,
        limit: Decimal,
    },

    /// Exit request covers the entire share supply or more
    #[error("cannot redeem {requested} shares: total supply is {total}")]
    ExcessiveShareRedemption { requested: Decimal, total: Decimal },

    /// Join called with an asset count the pool does not accept
    #[error(
        "join with {supplied} assets is unsupported: supply exactly one asset, \
         or all {pool_assets} pool assets"
    )]
    UnsupportedJoinShape {
        supplied: usize,
        pool_assets: usize,
    },

    /// Proportional all-asset join is reserved but not implemented
    #[error("proportional all-asset join is not implemented")]
    NotImplemented,

    /// Pool state violates a construction invariant
    #[error("invalid pool: {reason}")]
    InvalidPool { reason: String },

    /// A quantity that must be strictly positive was not
    #[error("{what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: Decimal },

    /// Decimal arithmetic overflowed the 96-bit representation
    #[error("decimal overflow in pool arithmetic")]
    Overflow,
}
