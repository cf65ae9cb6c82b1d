//! Invariant solver and swap calculators
//!
//! The generalized constant-function invariant relates a balance change on
//! one side of the pool to the balance change on the other, given the two
//! assets' weights. Everything here is a pure computation over the state it
//! is given; truncation to amount precision happens once, at the `Pool`-level
//! entry points.

use rust_decimal::Decimal;

use crate::decimal_math::{pow, round_up_amount, truncate_amount};
use crate::error::AmmError;
use crate::pool::{Coin, Pool, PoolAsset};

/// Solve the constant-function invariant for the unknown side's balance delta
///
/// For a fixed-side balance moving from `balance_fixed_before` to
/// `balance_fixed_after`, the unknown side must move by
///
/// `delta = balance_unknown * (1 - (balance_fixed_before / balance_fixed_after) ^ (weight_fixed / weight_unknown))`
///
/// The delta is positive when the unknown side's liquidity decreases and
/// negative when it increases.
pub fn solve_constant_function_invariant(
    balance_fixed_before: Decimal,
    balance_fixed_after: Decimal,
    weight_fixed: Decimal,
    balance_unknown: Decimal,
    weight_unknown: Decimal,
) -> Result<Decimal, AmmError> {
    if balance_fixed_after <= Decimal::ZERO {
        return Err(AmmError::NonPositive {
            what: "post-trade fixed-side balance",
            value: balance_fixed_after,
        });
    }
    if weight_unknown <= Decimal::ZERO {
        return Err(AmmError::NonPositive {
            what: "unknown-side weight",
            value: weight_unknown,
        });
    }

    let weight_ratio = weight_fixed / weight_unknown;
    let balance_ratio = balance_fixed_before / balance_fixed_after;
    let ratio_to_weight = pow(balance_ratio, weight_ratio)?;

    balance_unknown
        .checked_mul(Decimal::ONE - ratio_to_weight)
        .ok_or(AmmError::Overflow)
}

/// Untruncated output amount for an exact-in swap, fee deducted on the input
pub fn calc_out_given_in(
    asset_in: &PoolAsset,
    asset_out: &PoolAsset,
    amount_in: Decimal,
    swap_fee: Decimal,
) -> Result<Decimal, AmmError> {
    let amount_in_after_fee = amount_in * (Decimal::ONE - swap_fee);
    let post_swap_in_balance = asset_in.balance + amount_in_after_fee;

    // delta is positive: the out side's liquidity decreases
    solve_constant_function_invariant(
        asset_in.balance,
        post_swap_in_balance,
        asset_in.weight,
        asset_out.balance,
        asset_out.weight,
    )
}

/// Untruncated input amount for an exact-out swap, fee grossed up on the input
pub fn calc_in_given_out(
    asset_out: &PoolAsset,
    asset_in: &PoolAsset,
    amount_out: Decimal,
    swap_fee: Decimal,
) -> Result<Decimal, AmmError> {
    let post_swap_out_balance = asset_out.balance - amount_out;
    if post_swap_out_balance <= Decimal::ZERO {
        return Err(AmmError::TooManyTokensOut {
            denom: asset_out.denom.clone(),
            requested: amount_out,
            available: asset_out.balance,
        });
    }

    // The in side's liquidity increases, so the solver's delta is negative;
    // negate it to get the positive charge.
    let amount_in_after_fee = -solve_constant_function_invariant(
        asset_out.balance,
        post_swap_out_balance,
        asset_out.weight,
        asset_in.balance,
        asset_in.weight,
    )?;

    // The invariant was solved on the post-fee input, so the fee is grossed
    // back up on the input side.
    let fee_complement = Decimal::ONE - swap_fee;
    if fee_complement <= Decimal::ZERO {
        return Err(AmmError::NonPositive {
            what: "swap fee complement",
            value: fee_complement,
        });
    }
    Ok(amount_in_after_fee / fee_complement)
}

/// Weight-adjusted exchange ratio implied by current balances
///
/// `spot_price = (base.balance / base.weight) / (quote.balance / quote.weight)`
pub fn calc_spot_price(quote: &PoolAsset, base: &PoolAsset) -> Result<Decimal, AmmError> {
    if quote.balance <= Decimal::ZERO {
        return Err(AmmError::NonPositive {
            what: "quote-side balance",
            value: quote.balance,
        });
    }
    Ok((base.balance / base.weight) / (quote.balance / quote.weight))
}

/// Spot price scaled by `1 / (1 - fee)`: the effective marginal price an
/// infinitesimal trade pays
pub fn calc_spot_price_with_fee(
    quote: &PoolAsset,
    base: &PoolAsset,
    swap_fee: Decimal,
) -> Result<Decimal, AmmError> {
    let fee_complement = Decimal::ONE - swap_fee;
    if fee_complement <= Decimal::ZERO {
        return Err(AmmError::NonPositive {
            what: "swap fee complement",
            value: fee_complement,
        });
    }
    Ok(calc_spot_price(quote, base)? / fee_complement)
}

impl Pool {
    /// Token amount received for an exact-in swap, truncated to amount
    /// precision
    pub fn calc_out_given_in(
        &self,
        token_in: &Coin,
        token_out_denom: &str,
        swap_fee: Decimal,
    ) -> Result<Decimal, AmmError> {
        if token_in.denom == token_out_denom {
            return Err(AmmError::SameDenomination {
                denom: token_out_denom.to_string(),
            });
        }
        let asset_in = self.asset(&token_in.denom)?;
        let asset_out = self.asset(token_out_denom)?;

        let amount_out = truncate_amount(calc_out_given_in(
            asset_in,
            asset_out,
            token_in.amount,
            swap_fee,
        )?);
        if amount_out <= Decimal::ZERO {
            return Err(AmmError::InvalidMathApprox);
        }
        Ok(amount_out)
    }

    /// Token amount charged for an exact-out swap, rounded up to amount
    /// precision so the pool is never under-paid
    pub fn calc_in_given_out(
        &self,
        token_out: &Coin,
        token_in_denom: &str,
        swap_fee: Decimal,
    ) -> Result<Decimal, AmmError> {
        if token_out.denom == token_in_denom {
            return Err(AmmError::SameDenomination {
                denom: token_in_denom.to_string(),
            });
        }
        let asset_out = self.asset(&token_out.denom)?;
        let asset_in = self.asset(token_in_denom)?;

        if token_out.amount >= asset_out.balance {
            return Err(AmmError::TooManyTokensOut {
                denom: token_out.denom.clone(),
                requested: token_out.amount,
                available: asset_out.balance,
            });
        }

        let amount_in = round_up_amount(calc_in_given_out(
            asset_out,
            asset_in,
            token_out.amount,
            swap_fee,
        )?);
        if amount_in <= Decimal::ZERO {
            return Err(AmmError::InvalidMathApprox);
        }
        Ok(amount_in)
    }

    /// Spot price of `base_denom` quoted in `quote_denom`
    pub fn spot_price(&self, quote_denom: &str, base_denom: &str) -> Result<Decimal, AmmError> {
        let quote = self.asset(quote_denom)?;
        let base = self.asset(base_denom)?;
        calc_spot_price(quote, base)
    }

    /// Fee-adjusted spot price of `base_denom` quoted in `quote_denom`
    pub fn spot_price_with_fee(
        &self,
        quote_denom: &str,
        base_denom: &str,
        swap_fee: Decimal,
    ) -> Result<Decimal, AmmError> {
        let quote = self.asset(quote_denom)?;
        let base = self.asset(base_denom)?;
        calc_spot_price_with_fee(quote, base, swap_fee)
    }
}
