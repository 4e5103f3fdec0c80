// src/utils/mod.rs
//! Utilities module for common functionality
//!
//! This module contains shared utilities used throughout the PoW
//! coordinator, including error handling, logging infrastructure and
//! XDAG timestamp arithmetic.

/// Error types and handling utilities
///
/// Contains the [`PowError`] enum which defines all possible error
/// conditions for the mining coordinator.
pub mod error;

/// Logging configuration and utilities
///
/// Provides logging initialization and configuration for the hosting
/// process, including formatting and output destinations.
pub mod logging;

/// XDAG timestamp and epoch math
///
/// Conversions between wall-clock time, XDAG's 1/1024-second timestamp
/// format and 64-second epochs.
pub mod time;

// Re-export for easier access
pub use error::PowError;
pub use logging::init_logging;
