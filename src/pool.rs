// src/pool.rs
//! Miner-pool collaborator contracts
//!
//! Per-miner connection state, registration and payout accounting live
//! outside this crate. The coordinator only distributes tasks, reports
//! share statistics and notifies the award ledger of round boundaries.

use crate::pow::task::Task;
use crate::types::Hash256;
use std::sync::Arc;

/// Opaque back-reference to the miner that submitted a share
///
/// Used purely for statistics attribution; the coordinator never
/// inspects it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MinerRef(pub u64);

/// Miner-distribution and statistics collaborator
pub trait MinerRegistry: Send + Sync {
    /// Publishes a freshly built task to all connected miners.
    fn distribute_task(&self, task: &Arc<Task>);

    /// Records a share's resulting hash for contribution/difficulty
    /// accounting. Called for every successfully hashed share, winning
    /// or not.
    fn record_share_statistics(&self, miner: MinerRef, hash: &Hash256, task: &Task);
}

/// Payout-award collaborator
///
/// Uses the same epoch-to-index mapping as the coordinator's history
/// ring to retroactively credit miners once an epoch is finalized.
pub trait AwardLedger: Send + Sync {
    /// Notifies the ledger that a new round (task) has begun.
    fn on_round_start(&self, task: &Task);

    /// Notifies the ledger of a finalized block: the round's best share,
    /// the block hash and the block timestamp.
    fn on_round_finalized(&self, best_share: &Hash256, block_hash: &Hash256, timestamp: i64);
}
