//! # Pool Engine - Swap/Liquidity Orchestration
//!
//! ## Purpose
//!
//! Drives each pool operation through its full lifecycle:
//! validate -> compute -> stage -> commit. Validation and computation run on
//! the pool loaded from the repository; staging mutates that in-memory copy;
//! commit runs the ledger legs and persists the staged pool only after every
//! transfer succeeded. A failure at any step returns a typed error with zero
//! observable state change.
//!
//! ## Integration Points
//!
//! - **Input Sources**: operation requests from the embedding host, pool
//!   state from the [`PoolRepository`]
//! - **Output Destinations**: persisted pool state, token movements via the
//!   [`Ledger`], post-commit notifications to the registered [`PoolObserver`]
//! - **Concurrency**: none internally; the host serializes operations per
//!   pool and wraps commit in its own transaction boundary
//!
//! ## Architecture Role
//!
//! The engine owns orchestration and atomicity; all pricing and share math
//! lives in `tidepool-amm` and is invoked read-only until staging.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use tidepool_amm::{AmmError, Coin, Pool};

use crate::error::EngineError;
use crate::traits::{pool_account, AccountId, Ledger, PoolObserver, PoolRepository};

/// Orchestrates swaps, joins, and exits over a pool repository and a ledger
pub struct PoolEngine<R: PoolRepository, L: Ledger> {
    repository: R,
    ledger: L,
    observer: Option<Box<dyn PoolObserver>>,
}

impl<R: PoolRepository, L: Ledger> PoolEngine<R, L> {
    pub fn new(repository: R, ledger: L) -> Self {
        Self {
            repository,
            ledger,
            observer: None,
        }
    }

    /// Register the post-commit observer; at most one is supported
    pub fn with_observer(mut self, observer: Box<dyn PoolObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Swap an exact input amount for as much output as the curve yields
    ///
    /// Fails without mutation if the pool is inactive, the denominations
    /// match, the computed output is non-positive, or it falls below
    /// `token_out_min_amount`.
    pub fn swap_exact_amount_in(
        &mut self,
        now: DateTime<Utc>,
        sender: &AccountId,
        pool_id: u64,
        token_in: &Coin,
        token_out_denom: &str,
        token_out_min_amount: Decimal,
    ) -> Result<Decimal, EngineError> {
        let mut pool = self.load_active(pool_id, now)?;

        let amount_out = pool.calc_out_given_in(token_in, token_out_denom, pool.swap_fee)?;
        if amount_out < token_out_min_amount {
            warn!(
                pool_id,
                %token_in,
                computed = %amount_out,
                minimum = %token_out_min_amount,
                "swap rejected below minimum out"
            );
            return Err(AmmError::LimitExceeded {
                denom: token_out_denom.to_string(),
                computed: amount_out,
                limit: token_out_min_amount,
            }
            .into());
        }

        let token_out = Coin::new(token_out_denom, amount_out);
        pool.apply_swap(token_in, &token_out)?;
        self.commit_swap(pool, sender, token_in, &token_out)?;
        Ok(amount_out)
    }

    /// Swap as little input as the curve allows for an exact output amount
    ///
    /// Fails without mutation if the pool is inactive, the denominations
    /// match, the requested output is not strictly below the pool balance,
    /// or the computed input exceeds `token_in_max_amount`.
    pub fn swap_exact_amount_out(
        &mut self,
        now: DateTime<Utc>,
        sender: &AccountId,
        pool_id: u64,
        token_in_denom: &str,
        token_in_max_amount: Decimal,
        token_out: &Coin,
    ) -> Result<Decimal, EngineError> {
        let mut pool = self.load_active(pool_id, now)?;

        let amount_in = pool.calc_in_given_out(token_out, token_in_denom, pool.swap_fee)?;
        if amount_in > token_in_max_amount {
            warn!(
                pool_id,
                %token_out,
                computed = %amount_in,
                maximum = %token_in_max_amount,
                "swap rejected above maximum in"
            );
            return Err(AmmError::LimitExceeded {
                denom: token_in_denom.to_string(),
                computed: amount_in,
                limit: token_in_max_amount,
            }
            .into());
        }

        let token_in = Coin::new(token_in_denom, amount_in);
        pool.apply_swap(&token_in, token_out)?;
        self.commit_swap(pool, sender, &token_in, token_out)?;
        Ok(amount_in)
    }

    /// Deposit liquidity and mint shares to the sender
    pub fn join_pool(
        &mut self,
        sender: &AccountId,
        pool_id: u64,
        tokens_in: &[Coin],
    ) -> Result<Decimal, EngineError> {
        let mut pool = self.repository.load(pool_id)?;
        let swap_fee = pool.swap_fee;
        let shares_out = pool.join_pool(tokens_in, swap_fee)?;
        debug!(pool_id, shares = %shares_out, "join staged");

        let pool_acct = pool_account(pool_id);
        for coin in tokens_in {
            self.ledger.transfer(sender, &pool_acct, coin)?;
        }
        self.repository.store(&pool)?;
        info!(pool_id, sender = %sender, shares = %shares_out, "join committed");

        if let Some(observer) = self.observer.as_mut() {
            observer.after_join(sender, pool_id, tokens_in, shares_out);
        }
        Ok(shares_out)
    }

    /// Redeem shares for a pro-rata withdrawal across every pool asset
    pub fn exit_pool(
        &mut self,
        sender: &AccountId,
        pool_id: u64,
        exiting_shares: Decimal,
    ) -> Result<Vec<Coin>, EngineError> {
        let mut pool = self.repository.load(pool_id)?;
        let exit_fee = pool.exit_fee;
        let tokens_out = pool.exit_pool(exiting_shares, exit_fee)?;
        debug!(pool_id, shares = %exiting_shares, assets = tokens_out.len(), "exit staged");

        let pool_acct = pool_account(pool_id);
        for coin in &tokens_out {
            self.ledger.transfer(&pool_acct, sender, coin)?;
        }
        self.repository.store(&pool)?;
        info!(pool_id, sender = %sender, shares = %exiting_shares, "exit committed");

        if let Some(observer) = self.observer.as_mut() {
            observer.after_exit(sender, pool_id, exiting_shares, &tokens_out);
        }
        Ok(tokens_out)
    }

    /// Current spot price of `base_denom` quoted in `quote_denom`
    pub fn spot_price(
        &self,
        pool_id: u64,
        quote_denom: &str,
        base_denom: &str,
    ) -> Result<Decimal, EngineError> {
        let pool = self.repository.load(pool_id)?;
        Ok(pool.spot_price(quote_denom, base_denom)?)
    }

    /// Spot price adjusted for the pool's swap fee
    pub fn spot_price_with_fee(
        &self,
        pool_id: u64,
        quote_denom: &str,
        base_denom: &str,
    ) -> Result<Decimal, EngineError> {
        let pool = self.repository.load(pool_id)?;
        Ok(pool.spot_price_with_fee(quote_denom, base_denom, pool.swap_fee)?)
    }

    fn load_active(&self, pool_id: u64, now: DateTime<Utc>) -> Result<Pool, EngineError> {
        let pool = self.repository.load(pool_id)?;
        if !pool.is_active(now) {
            return Err(AmmError::PoolInactive { pool_id }.into());
        }
        Ok(pool)
    }

    /// Commit a staged swap: both ledger legs, then the pool state, then the
    /// observer. The staged pool is persisted only after both transfers
    /// succeeded, so a ledger failure leaves the stored state untouched.
    fn commit_swap(
        &mut self,
        pool: Pool,
        sender: &AccountId,
        token_in: &Coin,
        token_out: &Coin,
    ) -> Result<(), EngineError> {
        let pool_acct = pool_account(pool.id);
        self.ledger.transfer(sender, &pool_acct, token_in)?;
        self.ledger.transfer(&pool_acct, sender, token_out)?;
        self.repository.store(&pool)?;
        info!(
            pool_id = pool.id,
            sender = %sender,
            %token_in,
            %token_out,
            "swap committed"
        );

        if let Some(observer) = self.observer.as_mut() {
            observer.after_swap(sender, pool.id, token_in, token_out);
        }
        Ok(())
    }
}
