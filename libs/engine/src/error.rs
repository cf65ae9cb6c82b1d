//! Orchestration-level errors
//!
//! Everything the math layer reports passes through unchanged; the engine
//! adds the failures of its collaborators (pool repository, ledger).

use rust_decimal::Decimal;
use thiserror::Error;
use tidepool_amm::AmmError;

/// Errors from the external ledger collaborator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// The paying account does not hold enough of the denomination
    #[error("account {account} holds {available} {denom}, needs {required}")]
    InsufficientFunds {
        account: String,
        denom: String,
        required: Decimal,
        available: Decimal,
    },
}

/// Errors that can occur while orchestrating a pool operation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Pool math or validation failure
    #[error(transparent)]
    Amm(#[from] AmmError),

    /// The repository holds no pool under the requested identifier
    #[error("pool {pool_id} not found")]
    PoolNotFound { pool_id: u64 },

    /// A ledger transfer failed; no pool state was persisted
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The repository failed to persist the staged pool state
    #[error("failed to store pool {pool_id}: {reason}")]
    Storage { pool_id: u64, reason: String },
}
