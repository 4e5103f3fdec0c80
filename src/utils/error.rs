// src/utils/error.rs
use std::io;
use thiserror::Error;

/// Main error type for the PoW coordinator
///
/// This enum represents all failure conditions that can occur while
/// coordinating mining rounds. None of these are fatal to the hosting
/// node: a failure inside one event's handling is contained within that
/// handling and the event loop continues.
#[derive(Error, Debug)]
pub enum PowError {
    /// A submitted share could not be hashed (e.g. truncated payload);
    /// the share is dropped and the round continues
    #[error("malformed share: {0}")]
    MalformedShare(String),

    /// Invalid configuration value, rejected at the call boundary and
    /// never silently clamped (e.g. a negative timer deadline)
    #[error("configuration error: {0}")]
    Config(String),

    /// The broadcaster's outbound queue is saturated; the block is
    /// dropped without retry (the next round's block supersedes it)
    #[error("broadcast queue full: {0}")]
    BroadcastQueueFull(String),

    /// The finalized block could not be connected to the chain;
    /// logged and non-fatal, broadcast still proceeds
    #[error("chain connect failed: {0}")]
    ChainConnect(String),

    /// A hashing primitive failed (e.g. no active RandomX dataset)
    #[error("hashing error: {0}")]
    Hash(String),

    /// Inter-thread channel errors
    #[error("channel error: {0}")]
    Channel(String),

    /// Standard I/O operation errors (configuration file loading)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
