//! # Tidepool AMM Library - Weighted Constant-Function Pool Mathematics
//!
//! ## Purpose
//!
//! Exact arithmetic for weighted multi-asset liquidity pools: the generalized
//! constant-product invariant solver, exact-in/exact-out swap calculators,
//! spot-price computation, and liquidity-share accounting for joins and
//! exits. Every computation runs on fixed-point `Decimal` values with pinned
//! truncation rules so independent hosts replaying the same operations agree
//! bit-for-bit.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Pool state loaded by the orchestrating engine
//! - **Output Destinations**: `tidepool-engine`, which stages and commits the
//!   computed balance deltas
//! - **Precision**: 96-bit decimal arithmetic; amounts truncate toward zero
//!   to [`AMOUNT_SCALE`] decimal places
//! - **Determinism**: fractional powers use a fixed iterative series bounded
//!   by [`POW_PRECISION`]; no platform math library is involved
//!
//! ## Architecture Role
//!
//! This crate is the pure computational core: it never performs I/O, never
//! blocks, and mutates pool state only through operations that stage their
//! full delta or fail with a typed error and no observable change.

pub mod decimal_math;
pub mod error;
pub mod liquidity;
pub mod pool;
pub mod weighted_math;

pub use decimal_math::{pow, round_up_amount, truncate_amount, AMOUNT_SCALE, POW_PRECISION};
pub use error::AmmError;
pub use liquidity::calc_shares_given_single_in;
pub use pool::{ActiveWindow, Coin, Pool, PoolAsset};
pub use weighted_math::{
    calc_in_given_out, calc_out_given_in, calc_spot_price, calc_spot_price_with_fee,
    solve_constant_function_invariant,
};

/// Common types for pool calculations
pub use rust_decimal::Decimal;
