// src/chain.rs
//! Candidate blocks and chain-side collaborator contracts
//!
//! The coordinator never validates, stores or selects blocks itself; it
//! only drives a fixed-size candidate block through a mining round. The
//! [`Chain`] and [`Signer`] traits are the seams to the surrounding node,
//! and [`NodeStateSource`] exposes the sync-state gate for round
//! transitions.

use crate::types::{Hash256, SyncState};
use crate::utils::error::PowError;
use std::fmt;

/// Serialized size of a block in bytes.
pub const BLOCK_SIZE: usize = 512;
/// Size of one structured block field in bytes.
pub const FIELD_SIZE: usize = 32;
/// Number of structured fields per block.
pub const FIELD_COUNT: usize = BLOCK_SIZE / FIELD_SIZE;
/// Index of the field holding the mining nonce (the last field).
pub const NONCE_FIELD: usize = FIELD_COUNT - 1;

/// A candidate block being mined
///
/// A fixed 512-byte image of 16 structured 32-byte fields plus the send
/// timestamp. Built fresh each round by the [`Chain`] collaborator and
/// signed once; the coordinator owns it exclusively for the lifetime of
/// the round and overwrites the nonce field whenever a better share
/// arrives.
#[derive(Clone, PartialEq, Eq)]
pub struct Block {
    data: [u8; BLOCK_SIZE],
    timestamp: i64,
}

impl Block {
    /// Creates an all-zero block with the given timestamp.
    pub fn new(timestamp: i64) -> Self {
        Block {
            data: [0u8; BLOCK_SIZE],
            timestamp,
        }
    }

    /// Creates a block from a full serialized image.
    pub fn from_bytes(data: [u8; BLOCK_SIZE], timestamp: i64) -> Self {
        Block { data, timestamp }
    }

    /// Returns the full serialized block image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns a copy of structured field `index`.
    ///
    /// # Panics
    /// Panics if `index >= FIELD_COUNT`.
    pub fn field(&self, index: usize) -> [u8; FIELD_SIZE] {
        let start = index * FIELD_SIZE;
        let mut field = [0u8; FIELD_SIZE];
        field.copy_from_slice(&self.data[start..start + FIELD_SIZE]);
        field
    }

    /// Overwrites structured field `index`.
    ///
    /// # Panics
    /// Panics if `index >= FIELD_COUNT`.
    pub fn set_field(&mut self, index: usize, field: &[u8; FIELD_SIZE]) {
        let start = index * FIELD_SIZE;
        self.data[start..start + FIELD_SIZE].copy_from_slice(field);
    }

    /// Returns the current mining nonce (the last block field).
    pub fn nonce(&self) -> Hash256 {
        self.field(NONCE_FIELD)
    }

    /// Overwrites the mining nonce field.
    pub fn set_nonce(&mut self, nonce: &Hash256) {
        self.set_field(NONCE_FIELD, nonce);
    }

    /// Returns the block's send timestamp (XDAG format).
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("timestamp", &self.timestamp)
            .field("nonce", &hex::encode(self.nonce()))
            .finish()
    }
}

/// Chain storage and candidate construction collaborator
///
/// Implementations live in the surrounding node; the coordinator only
/// calls these three operations.
pub trait Chain: Send + Sync {
    /// Builds a fresh candidate block from current chain state (empty
    /// payload, no extra data, auto-selected timestamp).
    fn create_candidate_block(&self) -> Block;

    /// Attempts to connect a finalized block to the chain. Failure is
    /// non-fatal to the coordinator.
    fn try_connect(&self, block: &Block) -> Result<(), PowError>;

    /// Returns the current best-known-but-not-yet-final chain tip.
    fn pre_top(&self) -> Hash256;
}

/// Signing collaborator; signs each candidate block once at round start.
pub trait Signer: Send + Sync {
    /// Signs the block in place with the node's default key.
    fn sign(&self, block: &mut Block);
}

/// Node-wide sync-state query
///
/// Gates timeout and pretop handling: rounds only advance while the
/// returned state [`can_produce_blocks`](SyncState::can_produce_blocks).
pub trait NodeStateSource: Send + Sync {
    /// Returns the node's current synchronization state.
    fn sync_state(&self) -> SyncState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_is_last_field() {
        let mut block = Block::new(0);
        let nonce = [0xabu8; 32];
        block.set_nonce(&nonce);
        assert_eq!(block.nonce(), nonce);
        assert_eq!(&block.as_bytes()[480..512], &nonce[..]);
        // The rest of the block is untouched.
        assert!(block.as_bytes()[..480].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_field_roundtrip() {
        let mut block = Block::new(7);
        let field = [0x11u8; 32];
        block.set_field(14, &field);
        assert_eq!(block.field(14), field);
        assert_eq!(block.field(13), [0u8; 32]);
        assert_eq!(block.timestamp(), 7);
    }
}
