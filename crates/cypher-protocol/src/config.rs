//! Codec configuration

use serde::{Deserialize, Serialize};

/// Default upper bound on a single frame payload (64 MiB)
pub const DEFAULT_MAX_PAYLOAD_LEN: u64 = 64 * 1024 * 1024;

/// Framing limits
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest payload a reader will allocate for
    pub max_payload_len: u64,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

impl CodecConfig {
    /// Create with a payload limit
    pub fn with_max_payload_len(max_payload_len: u64) -> Self {
        Self { max_payload_len }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_payload_len == 0 {
            return Err("max_payload_len must be greater than 0".to_string());
        }
        if usize::try_from(self.max_payload_len).is_err() {
            return Err("max_payload_len does not fit in memory on this platform".to_string());
        }
        Ok(())
    }
}
