//! # Tidepool Engine - Transactional Pool Operation Orchestration
//!
//! ## Purpose
//!
//! Wraps the pure pool mathematics of `tidepool-amm` in the transactional
//! shell a host needs: per-operation validation, slippage limits, staged
//! balance deltas, ledger transfers, and exactly-once persistence of the
//! mutated pool. Collaborators (pool store, token ledger, post-commit
//! observer) are explicit trait seams supplied by the host.
//!
//! ## Integration Points
//!
//! - **Input Sources**: operation calls from the host, which serializes all
//!   traffic per pool identifier
//! - **Output Destinations**: [`PoolRepository`] for state,
//!   [`Ledger`] for token movement, [`PoolObserver`] for notifications
//! - **Atomicity**: pool state is stored only after every ledger leg
//!   succeeds; cross-system atomicity beyond that is the host transaction
//!   boundary's responsibility
//!
//! ## Architecture Role
//!
//! The engine is the single write path to pool state: every balance or share
//! mutation flows through one of its operations, and every failure leaves
//! both the repository and the pool untouched.

pub mod error;
pub mod orchestrator;
pub mod traits;

pub use error::{EngineError, LedgerError};
pub use orchestrator::PoolEngine;
pub use traits::{
    pool_account, AccountId, Ledger, MemoryLedger, MemoryPoolRepository, PoolObserver,
    PoolRepository,
};
