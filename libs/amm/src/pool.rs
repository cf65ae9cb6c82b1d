//! Weighted pool state model
//!
//! In-memory representation of a multi-asset liquidity pool: per-asset
//! balances and unnormalized weights, total issued shares, fee parameters,
//! and an optional active trading window. The asset set is fixed at
//! construction; every mutation goes through the swap/liquidity operations,
//! which stage their deltas on a copy and never leave a partially applied
//! state behind.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal_math::pow;
use crate::error::AmmError;

/// A denominated token amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Decimal,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: Decimal) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// One asset held by a pool: its balance and its unnormalized weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolAsset {
    pub denom: String,
    pub balance: Decimal,
    pub weight: Decimal,
}

impl PoolAsset {
    pub fn new(denom: impl Into<String>, balance: Decimal, weight: Decimal) -> Self {
        Self {
            denom: denom.into(),
            balance,
            weight,
        }
    }
}

/// Half-open `[start, end)` time bound within which a pool accepts swaps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ActiveWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// A weighted constant-function pool
///
/// Construction validates the state invariants (unique denoms, positive
/// weights, non-negative balances, fees in `[0, 1)`, positive share supply);
/// after that, balances and shares change only through the swap, join, and
/// exit operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    pub(crate) assets: Vec<PoolAsset>,
    pub(crate) total_shares: Decimal,
    pub swap_fee: Decimal,
    pub exit_fee: Decimal,
    pub active_window: Option<ActiveWindow>,
}

impl Pool {
    pub fn new(
        id: u64,
        assets: Vec<PoolAsset>,
        total_shares: Decimal,
        swap_fee: Decimal,
        exit_fee: Decimal,
        active_window: Option<ActiveWindow>,
    ) -> Result<Self, AmmError> {
        if assets.len() < 2 {
            return Err(AmmError::InvalidPool {
                reason: format!("pool needs at least two assets, got {}", assets.len()),
            });
        }
        for (i, asset) in assets.iter().enumerate() {
            if asset.weight <= Decimal::ZERO {
                return Err(AmmError::InvalidPool {
                    reason: format!("asset {} has non-positive weight", asset.denom),
                });
            }
            if asset.balance < Decimal::ZERO {
                return Err(AmmError::InvalidPool {
                    reason: format!("asset {} has negative balance", asset.denom),
                });
            }
            if assets[..i].iter().any(|a| a.denom == asset.denom) {
                return Err(AmmError::InvalidPool {
                    reason: format!("duplicate asset denomination {}", asset.denom),
                });
            }
        }
        for (name, fee) in [("swap fee", swap_fee), ("exit fee", exit_fee)] {
            if fee < Decimal::ZERO || fee >= Decimal::ONE {
                return Err(AmmError::InvalidPool {
                    reason: format!("{name} {fee} is outside [0, 1)"),
                });
            }
        }
        if total_shares <= Decimal::ZERO {
            return Err(AmmError::InvalidPool {
                reason: format!("total shares {total_shares} must be positive"),
            });
        }
        Ok(Self {
            id,
            assets,
            total_shares,
            swap_fee,
            exit_fee,
            active_window,
        })
    }

    pub fn assets(&self) -> &[PoolAsset] {
        &self.assets
    }

    pub fn total_shares(&self) -> Decimal {
        self.total_shares
    }

    /// Look up a pool asset by denomination
    pub fn asset(&self, denom: &str) -> Result<&PoolAsset, AmmError> {
        self.assets
            .iter()
            .find(|a| a.denom == denom)
            .ok_or_else(|| AmmError::UnknownDenomination {
                pool_id: self.id,
                denom: denom.to_string(),
            })
    }

    pub(crate) fn asset_mut(&mut self, denom: &str) -> Result<&mut PoolAsset, AmmError> {
        let pool_id = self.id;
        self.assets
            .iter_mut()
            .find(|a| a.denom == denom)
            .ok_or_else(|| AmmError::UnknownDenomination {
                pool_id,
                denom: denom.to_string(),
            })
    }

    /// Sum of all unnormalized asset weights
    pub fn total_weight(&self) -> Decimal {
        self.assets.iter().map(|a| a.weight).sum()
    }

    /// `weight / totalWeight` for the named asset
    pub fn normalized_weight(&self, denom: &str) -> Result<Decimal, AmmError> {
        let total = self.total_weight();
        Ok(self.asset(denom)?.weight / total)
    }

    /// Whether the pool accepts swaps at the given instant
    pub fn is_active(&self, at: DateTime<Utc>) -> bool {
        match &self.active_window {
            Some(window) => window.contains(at),
            None => true,
        }
    }

    /// The weighted geometric invariant `k = Π balance_i ^ normalizedWeight_i`
    ///
    /// Diagnostic quantity: fee-free trades hold it constant (up to the power
    /// approximation bound) and fee-bearing trades strictly increase it.
    /// Requires every balance to be positive.
    pub fn invariant(&self) -> Result<Decimal, AmmError> {
        let total_weight = self.total_weight();
        let mut product = Decimal::ONE;
        for asset in &self.assets {
            let factor = pow(asset.balance, asset.weight / total_weight)?;
            product = product.checked_mul(factor).ok_or(AmmError::Overflow)?;
        }
        Ok(product)
    }

    /// Apply a computed swap's balance deltas: credit the in amount, debit the
    /// out amount
    ///
    /// Rejects a debit that is not strictly covered by the current balance, so
    /// a miscomputed trade can never take a balance negative.
    pub fn apply_swap(&mut self, token_in: &Coin, token_out: &Coin) -> Result<(), AmmError> {
        let out_balance = self.asset(&token_out.denom)?.balance;
        if token_out.amount >= out_balance {
            return Err(AmmError::TooManyTokensOut {
                denom: token_out.denom.clone(),
                requested: token_out.amount,
                available: out_balance,
            });
        }
        self.asset_mut(&token_in.denom)?.balance += token_in.amount;
        self.asset_mut(&token_out.denom)?.balance -= token_out.amount;
        Ok(())
    }
}
