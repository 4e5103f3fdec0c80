//! XDAG PoW - Proof-of-work mining round coordinator in Rust
//!
//! This crate drives the block-production side of an XDAG node:
//! - 64-second mining rounds driven by a single-writer event loop
//! - Dual hashing paths (legacy double-SHA-256 midstate and RandomX)
//! - Share evaluation with strict-improvement best-share tracking
//! - Epoch-keyed RandomX dataset rotation
//! - Decoupled block broadcasting
//!
//! Chain storage, signing, the miner pool and the network transport are
//! collaborator traits implemented by the surrounding node.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Candidate blocks and chain-side collaborator contracts
pub mod chain;

/// Configuration management
pub mod config;

/// Hashing primitives (legacy SHA-256 midstate and RandomX)
pub mod engine;

/// Network-side collaborator contract
pub mod network;

/// Miner-pool collaborator contracts
pub mod pool;

/// Proof-of-work round machinery
pub mod pow;

/// Shared type definitions
pub mod types;

/// Utility functions and error handling
pub mod utils;

#[cfg(test)]
mod testutil;

// Core exports
pub use chain::{Block, Chain, NodeStateSource, Signer};
pub use config::PowConfig;
pub use engine::{DatasetPair, HashEngine, StdHashEngine};
pub use network::{BlockWrapper, NetworkChannels};
pub use pool::{AwardLedger, MinerRef, MinerRegistry};
pub use pow::{Collaborators, PowCoordinator, Task};
pub use types::{AlgorithmKind, Hash256, SyncState};
pub use utils::{PowError, init_logging};
