// src/testutil.rs
//! Shared mock collaborators for unit tests.

use std::sync::{Arc, Mutex};

use crate::chain::{BLOCK_SIZE, Block, Chain, NodeStateSource, Signer};
use crate::engine::{DigestState, HashEngine};
use crate::network::{BlockWrapper, NetworkChannels};
use crate::pool::{AwardLedger, MinerRegistry, MinerRef};
use crate::pow::task::Task;
use crate::types::{Hash256, SyncState};
use crate::utils::error::PowError;

/// Chain stub producing a deterministic candidate block and recording
/// every connect attempt.
#[derive(Default)]
pub struct MockChain {
    /// Blocks handed to `try_connect`, in order.
    pub connected: Mutex<Vec<Block>>,
    fail_connect: bool,
}

impl MockChain {
    /// A chain whose `try_connect` always fails.
    pub fn failing_connect() -> Self {
        MockChain {
            connected: Mutex::new(Vec::new()),
            fail_connect: true,
        }
    }
}

impl Chain for MockChain {
    fn create_candidate_block(&self) -> Block {
        let mut data = [0u8; BLOCK_SIZE];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
        Block::from_bytes(data, 0x4_0000)
    }

    fn try_connect(&self, block: &Block) -> Result<(), PowError> {
        if self.fail_connect {
            return Err(PowError::ChainConnect("mock connect failure".into()));
        }
        self.connected.lock().unwrap().push(block.clone());
        Ok(())
    }

    fn pre_top(&self) -> Hash256 {
        [0x9c; 32]
    }
}

/// Signer stub; leaves the block unchanged.
pub struct NoopSigner;

impl Signer for NoopSigner {
    fn sign(&self, _block: &mut Block) {}
}

/// Registry stub recording distributed tasks and share statistics.
#[derive(Default)]
pub struct MockRegistry {
    /// Tasks published via `distribute_task`, in order.
    pub distributed: Mutex<Vec<Arc<Task>>>,
    /// One `(miner, hash, task index)` entry per recorded share.
    pub stats: Mutex<Vec<(MinerRef, Hash256, u64)>>,
}

impl MinerRegistry for MockRegistry {
    fn distribute_task(&self, task: &Arc<Task>) {
        self.distributed.lock().unwrap().push(task.clone());
    }

    fn record_share_statistics(&self, miner: MinerRef, hash: &Hash256, task: &Task) {
        self.stats.lock().unwrap().push((miner, *hash, task.index));
    }
}

/// Award-ledger stub recording round boundaries.
#[derive(Default)]
pub struct MockAwards {
    /// Task indices seen at round start.
    pub started: Mutex<Vec<u64>>,
    /// `(best share, block hash, timestamp)` per finalized round.
    pub finalized: Mutex<Vec<(Hash256, Hash256, i64)>>,
}

impl AwardLedger for MockAwards {
    fn on_round_start(&self, task: &Task) {
        self.started.lock().unwrap().push(task.index);
    }

    fn on_round_finalized(&self, best_share: &Hash256, block_hash: &Hash256, timestamp: i64) {
        self.finalized
            .lock()
            .unwrap()
            .push((*best_share, *block_hash, timestamp));
    }
}

/// Network stub capturing everything the broadcaster sends.
#[derive(Default)]
pub struct MockNetwork {
    /// Blocks forwarded to peers, in order.
    pub sent: Mutex<Vec<BlockWrapper>>,
}

impl NetworkChannels for MockNetwork {
    fn send_new_block(&self, block: &BlockWrapper) {
        self.sent.lock().unwrap().push(block.clone());
    }
}

/// Settable sync-state source.
pub struct MockNodeState {
    state: Mutex<SyncState>,
}

impl MockNodeState {
    pub fn new(state: SyncState) -> Self {
        MockNodeState {
            state: Mutex::new(state),
        }
    }

    pub fn set(&self, state: SyncState) {
        *self.state.lock().unwrap() = state;
    }
}

impl NodeStateSource for MockNodeState {
    fn sync_state(&self) -> SyncState {
        *self.state.lock().unwrap()
    }
}

/// Hash engine with the legacy path backed by the real digest and the
/// RandomX path replaced by a cheap deterministic stand-in, so tests
/// never pay for dataset initialization.
pub struct MockEngine {
    fork: bool,
}

impl MockEngine {
    /// An engine reporting every epoch as past the RandomX fork.
    pub fn randomx() -> Self {
        MockEngine { fork: true }
    }
}

impl HashEngine for MockEngine {
    fn legacy_digest_init(&self, data: &[u8]) -> DigestState {
        let mut digest = DigestState::new();
        digest.update(data);
        digest
    }

    fn legacy_digest_finish(&self, state: &DigestState, tail: &[u8]) -> Result<Hash256, PowError> {
        let mut digest = state.clone();
        digest.update(tail);
        Ok(digest.finish_double())
    }

    fn block_hash(&self, data: &[u8]) -> Hash256 {
        let mut digest = DigestState::new();
        digest.update(data);
        digest.finish_double()
    }

    fn randomx_hash(&self, data: &[u8], epoch: i64) -> Result<Hash256, PowError> {
        let mut digest = DigestState::new();
        digest.update(data);
        digest.update(&epoch.to_le_bytes());
        Ok(digest.finish_double())
    }

    fn is_randomx_fork(&self, _epoch: i64) -> bool {
        self.fork
    }
}
