// src/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 256-bit value: block hashes, share payloads and mining nonces all
/// use this width. Comparison is unsigned big-endian lexicographic,
/// which is exactly what array ordering gives us.
pub type Hash256 = [u8; 32];

/// The maximal 256-bit value, used to seed the best-hash of a RandomX
/// round so that the first cleanly hashing share always wins.
pub const MAX_HASH: Hash256 = [0xff; 32];

/// Returns a byte-reversed copy of a 256-bit value.
///
/// Shares arrive over the wire with the opposite endianness to the one
/// the hashing primitives consume, so every share payload is reversed
/// before hashing and RandomX results are reversed back afterwards.
pub fn reversed(value: &Hash256) -> Hash256 {
    let mut out = *value;
    out.reverse();
    out
}

/// Proof-of-work algorithms a mining round can run under
///
/// The algorithm is selected once per round, when the task is built,
/// and never mixed within a round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmKind {
    /// Legacy incremental double-SHA-256 path
    ///
    /// Shares are completed cheaply from a retained midstate digest
    /// instead of re-hashing the whole block.
    LegacySha256,

    /// RandomX path (memory-hard, epoch-keyed dataset rotation)
    ///
    /// Shares require the full RandomX function over a 64-byte
    /// pre-image; no cheap finish step exists.
    RandomX,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmKind::LegacySha256 => write!(f, "sha256"),
            AlgorithmKind::RandomX => write!(f, "randomx"),
        }
    }
}

/// Node-wide synchronization state
///
/// Queried by the coordinator to gate round transitions: blocks are only
/// produced while the node is synced or actively syncing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    /// Node is starting up
    Initializing,
    /// Connecting to peers, no chain view yet
    Connecting,
    /// Downloading and verifying the chain
    Syncing,
    /// Fully synchronized with the network
    Synced,
}

impl SyncState {
    /// Whether timeout and pretop events may advance mining rounds in
    /// this state. Share evaluation is never gated.
    pub fn can_produce_blocks(self) -> bool {
        matches!(self, SyncState::Syncing | SyncState::Synced)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Initializing => write!(f, "initializing"),
            SyncState::Connecting => write!(f, "connecting"),
            SyncState::Syncing => write!(f, "syncing"),
            SyncState::Synced => write!(f, "synced"),
        }
    }
}
