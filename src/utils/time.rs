// src/utils/time.rs
//! XDAG timestamp and epoch arithmetic
//!
//! XDAG timestamps carry a 1/1024-second fractional part: the low 10 bits
//! are the sub-second fraction, so one wall-clock second spans 1024 ticks.
//! Epochs are 64-second buckets (`timestamp >> 16`), and every main block
//! is stamped with the end of its epoch.

use std::time::{SystemTime, UNIX_EPOCH};

/// Converts a unix-millisecond timestamp into the XDAG timestamp format.
pub fn xdag_timestamp(unix_ms: i64) -> i64 {
    (unix_ms << 10) / 1000
}

/// Returns the current wall-clock time as an XDAG timestamp.
pub fn current_timestamp() -> i64 {
    let unix_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64;
    xdag_timestamp(unix_ms)
}

/// Returns the epoch (64-second bucket) a timestamp falls into.
pub fn epoch_of(timestamp: i64) -> i64 {
    timestamp >> 16
}

/// Returns the last timestamp of the epoch containing `timestamp`.
pub fn end_of_epoch(timestamp: i64) -> i64 {
    timestamp | 0xffff
}

/// Returns the main-block time for the current epoch, i.e. the epoch
/// boundary at/after now.
pub fn main_time() -> i64 {
    end_of_epoch(current_timestamp())
}
