// src/pow/task.rs
//! Mining task construction (round start)
//!
//! Each round hands miners an immutable [`Task`]: two 32-byte pre-image
//! fields whose meaning depends on the algorithm selected for the round,
//! plus the round's epoch and a monotonically increasing index. Tasks
//! are never mutated; the next round's task supersedes them.

use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::chain::{Block, Chain, Signer};
use crate::engine::{DatasetPair, DigestState, HashEngine};
use crate::pool::{AwardLedger, MinerRegistry};
use crate::types::{AlgorithmKind, Hash256, MAX_HASH};
use crate::utils::time::epoch_of;

/// One 32-byte task pre-image field.
pub type TaskField = [u8; 32];

/// Prefix length of the block image consumed into the legacy midstate.
const LEGACY_MIDSTATE_BYTES: usize = 448;
/// Prefix length of the block image hashed into the RandomX pre-image.
const RANDOMX_PREIMAGE_BYTES: usize = 480;
/// Index of the raw block field shipped as the legacy task's second field.
const LEGACY_TAIL_FIELD: usize = 14;

/// An immutable mining assignment handed to miners
///
/// Legacy rounds: `preimage[0]` is the SHA-256 midstate after the first
/// 448 block bytes and `preimage[1]` is the raw 15th block field; the
/// retained digest lets each share finish the hash cheaply. RandomX
/// rounds: `preimage[0]` is a secondary SHA-256 of the first 480 block
/// bytes and `preimage[1]` is the active dataset seed; no digest exists
/// because completion requires the full RandomX function.
#[derive(Clone, Debug)]
pub struct Task {
    /// The two algorithm-dependent pre-image fields.
    pub preimage: [TaskField; 2],
    /// The round's time bucket, derived from the send time.
    pub epoch: i64,
    /// Monotonically increasing round counter, unique per process.
    pub index: u64,
    /// Partially-consumed hash state; present only on the legacy path.
    pub digest: Option<DigestState>,
}

impl Task {
    /// Which algorithm this task was built for.
    pub fn algorithm(&self) -> AlgorithmKind {
        if self.digest.is_some() {
            AlgorithmKind::LegacySha256
        } else {
            AlgorithmKind::RandomX
        }
    }
}

/// Everything a new round replaces at once: the candidate block, its
/// task and the seeded best-share state. The coordinator swaps in the
/// whole struct so no round ever observes a mix of old and new fields.
#[derive(Debug)]
pub struct Round {
    /// The candidate block being mined.
    pub block: Block,
    /// The published task.
    pub task: Arc<Task>,
    /// Running minimum hash over shares seen this round.
    pub min_hash: Hash256,
    /// The share that produced `min_hash` (currently in the block nonce).
    pub min_share: Hash256,
}

/// Builds one mining round: candidate block, task and seeded best-share
/// state, publishing the task to miners and the award ledger.
pub struct TaskBuilder {
    chain: Arc<dyn Chain>,
    signer: Arc<dyn Signer>,
    engine: Arc<dyn HashEngine>,
    datasets: Arc<DatasetPair>,
    registry: Arc<dyn MinerRegistry>,
    awards: Arc<dyn AwardLedger>,
    task_index: u64,
}

impl TaskBuilder {
    /// Creates a builder with its round counter at zero.
    pub fn new(
        chain: Arc<dyn Chain>,
        signer: Arc<dyn Signer>,
        engine: Arc<dyn HashEngine>,
        datasets: Arc<DatasetPair>,
        registry: Arc<dyn MinerRegistry>,
        awards: Arc<dyn AwardLedger>,
    ) -> Self {
        TaskBuilder {
            chain,
            signer,
            engine,
            datasets,
            registry,
            awards,
            task_index: 0,
        }
    }

    /// Starts a new round at `send_time`
    ///
    /// Builds and signs a fresh candidate, seeds a pseudo-random
    /// provisional nonce, constructs the algorithm-appropriate task and
    /// publishes it. Returns the complete [`Round`] for the coordinator
    /// to swap in.
    pub fn start_round(&mut self, send_time: i64) -> Round {
        self.task_index += 1;
        let epoch = epoch_of(send_time);

        let mut block = self.chain.create_candidate_block();
        self.signer.sign(&mut block);

        let min_share: Hash256 = rand::random();
        block.set_nonce(&min_share);

        let (task, min_hash) = if self.engine.is_randomx_fork(epoch) {
            self.randomx_task(&block, epoch)
        } else {
            self.legacy_task(&block, epoch)
        };
        let task = Arc::new(task);

        log::debug!(
            "round {}: sending {} task to miners, epoch {}",
            task.index,
            task.algorithm(),
            task.epoch
        );
        self.registry.distribute_task(&task);
        self.awards.on_round_start(&task);

        Round {
            block,
            task,
            min_hash,
            min_share,
        }
    }

    /// Legacy path: best-hash seeded to the unmined block's own hash, so
    /// any submitted improvement must strictly beat it.
    fn legacy_task(&self, block: &Block, epoch: i64) -> (Task, Hash256) {
        let bytes = block.as_bytes();

        let mut digest = self.engine.legacy_digest_init(&bytes[..LEGACY_MIDSTATE_BYTES]);
        let midstate = digest.midstate();
        let tail_field = block.field(LEGACY_TAIL_FIELD);
        digest.update(&tail_field);

        let min_hash = self.engine.block_hash(bytes);
        let task = Task {
            preimage: [midstate, tail_field],
            epoch,
            index: self.task_index,
            digest: Some(digest),
        };
        (task, min_hash)
    }

    /// RandomX path: best-hash seeded to the maximal value, so the first
    /// share that hashes cleanly is always accepted.
    fn randomx_task(&self, block: &Block, epoch: i64) -> (Task, Hash256) {
        let slot = self.datasets.select_active(epoch);
        if self.datasets.mark_switched(slot, epoch) {
            log::debug!("RandomX dataset slot {} switched at epoch {}", slot, epoch);
        }
        let seed = self.datasets.seed(slot).unwrap_or_else(|| {
            log::warn!("no RandomX dataset installed in slot {}", slot);
            [0u8; 32]
        });

        let preimage_hash: Hash256 =
            Sha256::digest(&block.as_bytes()[..RANDOMX_PREIMAGE_BYTES]).into();

        let task = Task {
            preimage: [preimage_hash, seed],
            epoch,
            index: self.task_index,
            digest: None,
        };
        (task, MAX_HASH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MockAwards, MockChain, MockEngine, MockRegistry, NoopSigner};
    use crate::types::MAX_HASH;

    fn builder(engine: Arc<dyn HashEngine>, datasets: Arc<DatasetPair>) -> (TaskBuilder, Arc<MockRegistry>, Arc<MockAwards>) {
        let registry = Arc::new(MockRegistry::default());
        let awards = Arc::new(MockAwards::default());
        let builder = TaskBuilder::new(
            Arc::new(MockChain::default()),
            Arc::new(NoopSigner),
            engine,
            datasets,
            registry.clone(),
            awards.clone(),
        );
        (builder, registry, awards)
    }

    #[test]
    fn test_legacy_round_seeds_self_hash() {
        let engine = Arc::new(crate::engine::StdHashEngine::new(
            None,
            Arc::new(DatasetPair::new()),
        ));
        let (mut builder, registry, awards) = builder(engine.clone(), Arc::new(DatasetPair::new()));

        let round = builder.start_round(0x1_0000);
        assert_eq!(round.task.index, 1);
        assert_eq!(round.task.epoch, 1);
        assert_eq!(round.task.algorithm(), AlgorithmKind::LegacySha256);

        // Seeded best-hash is the unmined block's own hash.
        assert_eq!(round.min_hash, engine.block_hash(round.block.as_bytes()));
        // The provisional nonce is already in the block.
        assert_eq!(round.block.nonce(), round.min_share);
        // field1 is the raw 15th structured field.
        assert_eq!(round.task.preimage[1], round.block.field(14));

        // Published to miners and the award ledger.
        assert_eq!(registry.distributed.lock().unwrap().len(), 1);
        assert_eq!(awards.started.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_legacy_midstate_matches_digest_init() {
        let engine: Arc<dyn HashEngine> = Arc::new(crate::engine::StdHashEngine::new(
            None,
            Arc::new(DatasetPair::new()),
        ));
        let (mut builder, _, _) = builder(engine.clone(), Arc::new(DatasetPair::new()));
        let round = builder.start_round(0x1_0000);

        let expected = engine
            .legacy_digest_init(&round.block.as_bytes()[..448])
            .midstate();
        assert_eq!(round.task.preimage[0], expected);
    }

    #[test]
    fn test_randomx_round_seeds_max_hash() {
        let datasets = Arc::new(DatasetPair::new());
        datasets.install(0, [0x10; 32], 0);
        datasets.install(1, [0x20; 32], 5);
        let engine = Arc::new(MockEngine::randomx());
        let (mut builder, _, _) = builder(engine, datasets.clone());

        // Epoch 9 (= send_time >> 16) is past both switch times: slot 1.
        let round = builder.start_round(9 << 16);
        assert_eq!(round.task.algorithm(), AlgorithmKind::RandomX);
        assert_eq!(round.min_hash, MAX_HASH);
        assert_eq!(round.task.preimage[1], [0x20; 32]);

        let expected: Hash256 = Sha256::digest(&round.block.as_bytes()[..480]).into();
        assert_eq!(round.task.preimage[0], expected);
    }

    #[test]
    fn test_randomx_switch_flips_exactly_once_across_rounds() {
        let datasets = Arc::new(DatasetPair::new());
        datasets.install(0, [0x10; 32], 5);
        datasets.install(1, [0x20; 32], 9);
        let engine = Arc::new(MockEngine::randomx());
        let (mut builder, _, _) = builder(engine, datasets.clone());

        builder.start_round(10 << 16);
        assert_eq!(datasets.is_switched(1), Some(true));
        // A second round at the same epoch does not flip again.
        builder.start_round(10 << 16);
        assert_eq!(datasets.is_switched(1), Some(true));
        assert_eq!(datasets.is_switched(0), Some(false));
    }

    #[test]
    fn test_round_index_is_monotonic() {
        let engine = Arc::new(crate::engine::StdHashEngine::new(
            None,
            Arc::new(DatasetPair::new()),
        ));
        let (mut builder, _, _) = builder(engine, Arc::new(DatasetPair::new()));
        assert_eq!(builder.start_round(0x1_0000).task.index, 1);
        assert_eq!(builder.start_round(0x2_0000).task.index, 2);
        assert_eq!(builder.start_round(0x3_0000).task.index, 3);
    }
}
