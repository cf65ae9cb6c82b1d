//! Collaborator seams for the pool engine
//!
//! The engine never touches ambient state: the pool store, the token ledger,
//! and the post-commit observer are all explicit interfaces passed in at
//! construction, so every state dependency is visible at the call site.
//! HashMap-backed reference implementations are provided for tests and for
//! hosts that keep everything in memory.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tidepool_amm::{Coin, Pool};

use crate::error::{EngineError, LedgerError};

/// Account identifier on the external ledger
pub type AccountId = String;

/// The ledger account that holds a pool's reserves
pub fn pool_account(pool_id: u64) -> AccountId {
    format!("pool/{pool_id}")
}

/// Load/store access to persisted pool state
///
/// `store` is called exactly once per committed operation, after every
/// ledger transfer has succeeded; a failure at any earlier point leaves the
/// persisted pool untouched.
pub trait PoolRepository {
    fn load(&self, pool_id: u64) -> Result<Pool, EngineError>;
    fn store(&mut self, pool: &Pool) -> Result<(), EngineError>;
}

/// The external mechanism that physically moves tokens between accounts
pub trait Ledger {
    fn transfer(&mut self, from: &AccountId, to: &AccountId, coin: &Coin)
        -> Result<(), LedgerError>;
}

/// Post-commit notification hooks
///
/// Invoked synchronously, exactly once per committed operation, never on a
/// rejected one. No return value is consumed.
pub trait PoolObserver {
    fn after_swap(
        &mut self,
        _sender: &AccountId,
        _pool_id: u64,
        _token_in: &Coin,
        _token_out: &Coin,
    ) {
    }

    fn after_join(
        &mut self,
        _sender: &AccountId,
        _pool_id: u64,
        _tokens_in: &[Coin],
        _shares_out: Decimal,
    ) {
    }

    fn after_exit(
        &mut self,
        _sender: &AccountId,
        _pool_id: u64,
        _shares_in: Decimal,
        _tokens_out: &[Coin],
    ) {
    }
}

/// In-memory pool store
#[derive(Debug, Default)]
pub struct MemoryPoolRepository {
    pools: HashMap<u64, Pool>,
}

impl MemoryPoolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pool: Pool) {
        self.pools.insert(pool.id, pool);
    }
}

impl PoolRepository for MemoryPoolRepository {
    fn load(&self, pool_id: u64) -> Result<Pool, EngineError> {
        self.pools
            .get(&pool_id)
            .cloned()
            .ok_or(EngineError::PoolNotFound { pool_id })
    }

    fn store(&mut self, pool: &Pool) -> Result<(), EngineError> {
        self.pools.insert(pool.id, pool.clone());
        Ok(())
    }
}

/// In-memory token ledger
#[derive(Debug, Default)]
pub struct MemoryLedger {
    balances: HashMap<(AccountId, String), Decimal>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account out of thin air; test/bootstrap use only
    pub fn mint(&mut self, account: &str, coin: &Coin) {
        *self
            .balances
            .entry((account.to_string(), coin.denom.clone()))
            .or_insert(Decimal::ZERO) += coin.amount;
    }

    pub fn balance(&self, account: &str, denom: &str) -> Decimal {
        self.balances
            .get(&(account.to_string(), denom.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

impl Ledger for MemoryLedger {
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        coin: &Coin,
    ) -> Result<(), LedgerError> {
        let available = self.balance(from, &coin.denom);
        if available < coin.amount {
            return Err(LedgerError::InsufficientFunds {
                account: from.clone(),
                denom: coin.denom.clone(),
                required: coin.amount,
                available,
            });
        }
        *self
            .balances
            .entry((from.clone(), coin.denom.clone()))
            .or_insert(Decimal::ZERO) -= coin.amount;
        *self
            .balances
            .entry((to.clone(), coin.denom.clone()))
            .or_insert(Decimal::ZERO) += coin.amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn memory_ledger_transfers_and_rejects_overdraft() {
        let mut ledger = MemoryLedger::new();
        ledger.mint("alice", &Coin::new("atom", dec!(100)));

        ledger
            .transfer(
                &"alice".to_string(),
                &"bob".to_string(),
                &Coin::new("atom", dec!(40)),
            )
            .unwrap();
        assert_eq!(ledger.balance("alice", "atom"), dec!(60));
        assert_eq!(ledger.balance("bob", "atom"), dec!(40));

        let err = ledger
            .transfer(
                &"alice".to_string(),
                &"bob".to_string(),
                &Coin::new("atom", dec!(61)),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        // Failed transfer moved nothing
        assert_eq!(ledger.balance("alice", "atom"), dec!(60));
    }
}
