// src/engine/mod.rs
//! Hashing primitives behind the mining coordinator
//!
//! The coordinator never implements proof-of-work primitives itself; it
//! calls through the [`HashEngine`] seam. Two paths exist:
//! - the legacy incremental double-SHA-256 digest with midstate export
//! - the memory-hard RandomX function with epoch-keyed dataset rotation
//!
//! [`StdHashEngine`] is the production implementation, backed by `sha2`
//! and `rust-randomx`.

/// Incremental double-SHA-256 digest with midstate export
///
/// Contains [`DigestState`], the cloneable partially-consumed hash state
/// retained per round so shares only need a cheap finish step.
pub mod sha256;

/// RandomX dataset rotation and hashing
///
/// Contains the double-buffered [`DatasetPair`], the pure slot-selection
/// function and the context cache wrapping `rust-randomx`.
pub mod randomx;

// Re-export main components for cleaner imports
pub use randomx::{DatasetPair, DatasetSlot, RandomXVmCache, select_active_slot};
pub use sha256::DigestState;

use crate::types::Hash256;
use crate::utils::error::PowError;
use std::sync::Arc;

/// Common interface to the node's hashing primitives
///
/// All methods must be callable from any thread: the coordinator hashes
/// from its event loop while miners and verification paths may hash
/// concurrently.
pub trait HashEngine: Send + Sync {
    /// Starts a legacy digest over `data` and returns the retained state.
    fn legacy_digest_init(&self, data: &[u8]) -> DigestState;

    /// Finishes a clone of `state` with `tail` appended, yielding the
    /// 256-bit double-SHA-256 result. The passed state is not consumed.
    fn legacy_digest_finish(&self, state: &DigestState, tail: &[u8]) -> Result<Hash256, PowError>;

    /// Computes a block's self-hash under the legacy algorithm.
    fn block_hash(&self, data: &[u8]) -> Hash256;

    /// Computes the RandomX hash of `data`, keyed by the dataset that is
    /// active at `epoch`.
    fn randomx_hash(&self, data: &[u8], epoch: i64) -> Result<Hash256, PowError>;

    /// Whether the RandomX activation condition holds for `epoch`.
    fn is_randomx_fork(&self, epoch: i64) -> bool;
}

/// Production hash engine
///
/// Legacy hashing is pure `sha2`; RandomX hashing goes through a per-slot
/// context cache keyed by the shared [`DatasetPair`].
pub struct StdHashEngine {
    fork_epoch: Option<i64>,
    datasets: Arc<DatasetPair>,
    vm: RandomXVmCache,
}

impl StdHashEngine {
    /// Creates an engine
    ///
    /// # Arguments
    /// * `fork_epoch` - Epoch at which RandomX activates; `None` disables it
    /// * `datasets` - The dataset pair shared with the rotation logic
    pub fn new(fork_epoch: Option<i64>, datasets: Arc<DatasetPair>) -> Self {
        StdHashEngine {
            fork_epoch,
            datasets,
            vm: RandomXVmCache::new(),
        }
    }
}

impl HashEngine for StdHashEngine {
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
        self.vm.hash(&self.datasets, data, epoch)
    }

    fn is_randomx_fork(&self, epoch: i64) -> bool {
        self.fork_epoch.is_some_and(|fork| epoch >= fork)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fork_gate() {
        let engine = StdHashEngine::new(Some(100), Arc::new(DatasetPair::new()));
        assert!(!engine.is_randomx_fork(99));
        assert!(engine.is_randomx_fork(100));
        assert!(engine.is_randomx_fork(101));

        let disabled = StdHashEngine::new(None, Arc::new(DatasetPair::new()));
        assert!(!disabled.is_randomx_fork(i64::MAX));
    }

    #[test]
    fn test_digest_finish_does_not_consume_state() {
        let engine = StdHashEngine::new(None, Arc::new(DatasetPair::new()));
        let state = engine.legacy_digest_init(&[0x42; 480]);
        let a = engine.legacy_digest_finish(&state, &[0x01; 32]).unwrap();
        let b = engine.legacy_digest_finish(&state, &[0x02; 32]).unwrap();
        let a_again = engine.legacy_digest_finish(&state, &[0x01; 32]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a_again);
    }

    #[test]
    fn test_block_hash_matches_digest_path() {
        let engine = StdHashEngine::new(None, Arc::new(DatasetPair::new()));
        let data = vec![0x5a; 512];
        let state = engine.legacy_digest_init(&data[..480]);
        let via_finish = engine.legacy_digest_finish(&state, &data[480..]).unwrap();
        assert_eq!(engine.block_hash(&data), via_finish);
    }

    #[test]
    fn test_randomx_without_dataset_fails() {
        let engine = StdHashEngine::new(Some(0), Arc::new(DatasetPair::new()));
        assert!(engine.randomx_hash(&[0u8; 64], 1).is_err());
    }
}
