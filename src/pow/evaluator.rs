// src/pow/evaluator.rs
//! Per-share scoring
//!
//! Every share submitted by a miner is hashed under the round's
//! algorithm and compared against the running minimum. Strictly smaller
//! hashes replace the best share and overwrite the candidate block's
//! nonce; ties keep the first-seen winner. Statistics are reported for
//! every successfully hashed share, winning or not.

use std::sync::Arc;

use crate::engine::HashEngine;
use crate::pool::{MinerRegistry, MinerRef};
use crate::pow::task::{Round, Task};
use crate::types::{Hash256, reversed};
use crate::utils::error::PowError;

/// Number of slots in the round-history ring.
pub const HISTORY_SLOTS: usize = 16;

/// Fixed-capacity history of per-epoch best shares and block hashes
///
/// Indexed by the masked task epoch; read by the award collaborator to
/// retroactively credit miners once an epoch finalizes. Empty slots are
/// explicit `None`s, not placeholder values.
#[derive(Clone, Debug)]
pub struct RoundHistory {
    /// Best share recorded per epoch bucket.
    pub min_shares: [Option<Hash256>; HISTORY_SLOTS],
    /// Block hash recorded alongside each best share.
    pub block_hashes: [Option<Hash256>; HISTORY_SLOTS],
}

impl Default for RoundHistory {
    fn default() -> Self {
        RoundHistory {
            min_shares: [None; HISTORY_SLOTS],
            block_hashes: [None; HISTORY_SLOTS],
        }
    }
}

impl RoundHistory {
    /// Creates an empty history ring.
    pub fn new() -> Self {
        RoundHistory::default()
    }

    /// Maps a task epoch to its ring slot
    ///
    /// Must stay identical to the mapping the award collaborator uses,
    /// or credits are misattributed. The mask is applied verbatim.
    pub fn slot_index(epoch: i64, award_epoch_mask: u32) -> usize {
        ((epoch >> 16) & i64::from(award_epoch_mask)) as usize
    }
}

/// Scores submitted shares against the active round
pub struct ShareEvaluator {
    engine: Arc<dyn HashEngine>,
    registry: Arc<dyn MinerRegistry>,
    award_epoch_mask: u32,
}

impl ShareEvaluator {
    /// Creates an evaluator
    ///
    /// # Arguments
    /// * `engine` - Hashing primitives
    /// * `registry` - Statistics sink, reported to for every hashed share
    /// * `award_epoch_mask` - Epoch mask for history-ring indexing
    pub fn new(
        engine: Arc<dyn HashEngine>,
        registry: Arc<dyn MinerRegistry>,
        award_epoch_mask: u32,
    ) -> Self {
        ShareEvaluator {
            engine,
            registry,
            award_epoch_mask,
        }
    }

    /// Computes the hash a share payload yields under the task's algorithm
    ///
    /// The payload is byte-reversed before hashing (wire endianness is
    /// the opposite of hashing endianness). RandomX results are reversed
    /// back to mining endianness after the heavy hash.
    ///
    /// # Errors
    /// [`PowError::MalformedShare`] if the payload is not exactly 32
    /// bytes; any engine failure is propagated.
    pub fn hash_share(&self, data: &[u8], task: &Task) -> Result<Hash256, PowError> {
        let share: &Hash256 = data.try_into().map_err(|_| {
            PowError::MalformedShare(format!("expected 32 byte payload, got {}", data.len()))
        })?;
        let rev = reversed(share);

        match &task.digest {
            Some(digest) => self.engine.legacy_digest_finish(digest, &rev),
            None => {
                let mut preimage = [0u8; 64];
                preimage[..32].copy_from_slice(&task.preimage[0]);
                preimage[32..].copy_from_slice(&rev);
                let hash = self.engine.randomx_hash(&preimage, task.epoch)?;
                Ok(reversed(&hash))
            }
        }
    }

    /// Scores one share against the active round
    ///
    /// A strictly smaller hash (unsigned big-endian comparison) replaces
    /// the round's best hash/share, overwrites the block nonce and
    /// updates both history-ring slots for the task's epoch bucket.
    /// Statistics are recorded regardless of improvement. Errors leave
    /// the round untouched; the caller logs and drops the share.
    pub fn process(
        &self,
        data: &[u8],
        miner: MinerRef,
        round: &mut Round,
        history: &mut RoundHistory,
    ) -> Result<Hash256, PowError> {
        let hash = self.hash_share(data, &round.task)?;

        if hash < round.min_hash {
            round.min_hash = hash;
            // data is known to be 32 bytes here; hash_share validated it.
            let mut share = [0u8; 32];
            share.copy_from_slice(data);
            round.min_share = reversed(&share);
            round.block.set_nonce(&round.min_share);

            let index = RoundHistory::slot_index(round.task.epoch, self.award_epoch_mask);
            history.min_shares[index] = Some(round.min_share);
            history.block_hashes[index] = Some(self.engine.block_hash(round.block.as_bytes()));

            log::debug!("new min hash {}", hex::encode(hash));
            log::debug!("new min share {}", hex::encode(round.min_share));
        }

        self.registry.record_share_statistics(miner, &hash, &round.task);
        Ok(hash)
    }
}
