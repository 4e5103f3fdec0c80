// src/config/config.rs
use crate::utils::error::PowError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the PoW coordinator
///
/// Contains all settings that drive the mining round lifecycle: timer
/// cadence, award-epoch masking, broadcast queue sizing and the RandomX
/// activation epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowConfig {
    /// Bitmask applied to the task epoch when selecting a slot in the
    /// 16-entry round-history ring (default: 0xf)
    ///
    /// The value is used verbatim as a mask (`& award_epoch_mask`); the
    /// award collaborator must use the same epoch-to-index mapping or
    /// retroactive credits are misattributed.
    #[serde(default = "default_award_epoch_mask")]
    pub award_epoch_mask: u32,

    /// Time-to-live attached to broadcast blocks (default: 5)
    #[serde(default = "default_block_ttl")]
    pub block_ttl: u8,

    /// Poll interval of the coordinator event loop in milliseconds
    /// (default: 10); bounds shutdown latency
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Poll interval of the block broadcaster thread in milliseconds
    /// (default: 50)
    #[serde(default = "default_broadcast_poll_ms")]
    pub broadcast_poll_ms: u64,

    /// Capacity of the broadcaster's outbound queue (default: 1024);
    /// enqueueing onto a full queue drops the block
    #[serde(default = "default_broadcast_queue_capacity")]
    pub broadcast_queue_capacity: usize,

    /// Grace window added to the current time when arming the first
    /// round timeout, in XDAG timestamp ticks (default: 64)
    #[serde(default = "default_startup_grace")]
    pub startup_grace: i64,

    /// Epoch at which the RandomX algorithm activates; `None` keeps
    /// every round on the legacy SHA-256 path
    #[serde(default)]
    pub randomx_fork_epoch: Option<i64>,
}

fn default_award_epoch_mask() -> u32 {
    0xf
}

fn default_block_ttl() -> u8 {
    5
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_broadcast_poll_ms() -> u64 {
    50
}

fn default_broadcast_queue_capacity() -> usize {
    1024
}

fn default_startup_grace() -> i64 {
    64
}

impl Default for PowConfig {
    fn default() -> Self {
        PowConfig {
            award_epoch_mask: default_award_epoch_mask(),
            block_ttl: default_block_ttl(),
            poll_interval_ms: default_poll_interval_ms(),
            broadcast_poll_ms: default_broadcast_poll_ms(),
            broadcast_queue_capacity: default_broadcast_queue_capacity(),
            startup_grace: default_startup_grace(),
            randomx_fork_epoch: None,
        }
    }
}

impl PowConfig {
    /// Loads configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Ok(PowConfig)` - Successfully loaded and validated configuration
    /// * `Err(PowError)` - If the file couldn't be read, parsed or validated
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PowError> {
        let path = path.into();
        let config_str = std::fs::read_to_string(&path).map_err(|e| {
            PowError::Config(format!(
                "Failed to read config at {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: PowConfig = toml::from_str(&config_str)
            .map_err(|e| PowError::Config(format!("Invalid config format: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// Rejects masks that would index past the 16-slot history ring.
    /// A mask that is not of the form `2^k - 1` selects non-contiguous
    /// slots; that shape is accepted for compatibility but flagged in
    /// the logs.
    pub fn validate(&self) -> Result<(), PowError> {
        if self.award_epoch_mask >= 16 {
            return Err(PowError::Config(format!(
                "award_epoch_mask {:#x} exceeds the 16-slot history ring",
                self.award_epoch_mask
            )));
        }
        if !(self.award_epoch_mask + 1).is_power_of_two() {
            log::warn!(
                "award_epoch_mask {:#x} is not 2^k - 1; history slots will be used non-contiguously",
                self.award_epoch_mask
            );
        }
        if self.startup_grace < 0 {
            return Err(PowError::Config(format!(
                "startup_grace must not be negative, got {}",
                self.startup_grace
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PowConfig::default();
        assert_eq!(config.award_epoch_mask, 0xf);
        assert_eq!(config.block_ttl, 5);
        assert_eq!(config.poll_interval_ms, 10);
        assert_eq!(config.broadcast_poll_ms, 50);
        assert_eq!(config.broadcast_queue_capacity, 1024);
        assert_eq!(config.startup_grace, 64);
        assert_eq!(config.randomx_fork_epoch, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: PowConfig = toml::from_str("").unwrap();
        assert_eq!(config.award_epoch_mask, 0xf);
        assert!(config.randomx_fork_epoch.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: PowConfig =
            toml::from_str("award_epoch_mask = 7\nrandomx_fork_epoch = 1000\n").unwrap();
        assert_eq!(config.award_epoch_mask, 7);
        assert_eq!(config.randomx_fork_epoch, Some(1000));
        assert_eq!(config.block_ttl, 5);
    }

    #[test]
    fn test_oversized_mask_rejected() {
        let config = PowConfig {
            award_epoch_mask: 16,
            ..PowConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_contiguous_mask_accepted() {
        // 0b1010 selects non-contiguous slots; accepted, only warned about.
        let config = PowConfig {
            award_epoch_mask: 0b1010,
            ..PowConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_grace_rejected() {
        let config = PowConfig {
            startup_grace: -1,
            ..PowConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
