// src/config/mod.rs
//! Configuration management for the PoW coordinator
//!
//! This module handles all configuration-related functionality including:
//! - Loading and parsing configuration files
//! - Validating award-epoch masking and timer settings
//!
//! The configuration uses TOML format with per-field defaults, so an
//! empty file yields a fully working setup.

/// Core configuration implementation
///
/// Contains the [`PowConfig`] struct that defines the coordinator's
/// configuration structure and validation rules.
pub mod config;

// Re-export key items for easy access
pub use config::PowConfig;

use crate::utils::error::PowError;
use std::path::PathBuf;

/// Loads coordinator configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the configuration file (anything convertible to PathBuf)
///
/// # Returns
/// * `Ok(PowConfig)` - Successfully loaded configuration
/// * `Err(PowError)` - If the file couldn't be read or parsed
pub fn load(path: impl Into<PathBuf>) -> Result<PowConfig, PowError> {
    PowConfig::load(path)
}
