// src/network.rs
//! Network-side collaborator contract
//!
//! The coordinator never performs network I/O itself: finished blocks
//! are handed to the [`BlockBroadcaster`](crate::pow::BlockBroadcaster),
//! whose thread forwards them through [`NetworkChannels`] to the peer
//! fan-out of the surrounding node.

use crate::chain::Block;

/// A block queued for network delivery, together with its relay TTL.
#[derive(Clone, Debug)]
pub struct BlockWrapper {
    /// The serialized block being sent.
    pub block: Block,
    /// Remaining relay hops.
    pub ttl: u8,
}

impl BlockWrapper {
    /// Wraps a block for delivery with the given TTL.
    pub fn new(block: Block, ttl: u8) -> Self {
        BlockWrapper { block, ttl }
    }
}

/// Peer-to-peer transport collaborator
///
/// Called only from the broadcaster's thread; sends never block the
/// mining loop.
pub trait NetworkChannels: Send + Sync {
    /// Fans a new block out to connected peers.
    fn send_new_block(&self, block: &BlockWrapper);
}
