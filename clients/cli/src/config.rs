//! CLI configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use cypher_crypto::prime::DEFAULT_ROUNDS;
use cypher_crypto::rsa::MIN_PRIME_BITS;
use cypher_protocol::CodecConfig;

/// How session AES keys are drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AesKeyMode {
    /// Length selector then scaled value, compatible with older peers
    #[default]
    Legacy,
    /// Uniform over all 128-bit keys
    Uniform,
}

/// CLI configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Size in bits of each RSA prime
    pub rsa_bits: u64,
    /// Miller–Rabin rounds per prime candidate
    pub primality_rounds: u32,
    /// AES key generation mode
    pub aes_key_mode: AesKeyMode,
    /// Socket read/write timeout in seconds, 0 disables it
    pub socket_timeout_secs: u64,
    /// Directory that received files are written to
    pub output_dir: PathBuf,
    /// Framing limits
    pub codec: CodecConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rsa_bits: 512,
            primality_rounds: DEFAULT_ROUNDS,
            aes_key_mode: AesKeyMode::default(),
            socket_timeout_secs: 30,
            output_dir: PathBuf::from("."),
            codec: CodecConfig::default(),
        }
    }
}

impl CliConfig {
    /// Default location: `<config dir>/cypher/config.toml`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("cypher");
        path.push("config.toml");
        path
    }

    /// Load config from file or create default
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: CliConfig = toml::from_str(&content)?;
            config.validate().map_err(anyhow::Error::msg)?;
            Ok(config)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.rsa_bits < MIN_PRIME_BITS {
            return Err(format!("rsa_bits must be at least {MIN_PRIME_BITS}"));
        }
        if self.primality_rounds == 0 {
            return Err("primality_rounds must be greater than 0".to_string());
        }
        self.codec.validate()
    }

    /// Socket timeout, `None` when disabled
    pub fn socket_timeout(&self) -> Option<Duration> {
        (self.socket_timeout_secs > 0).then(|| Duration::from_secs(self.socket_timeout_secs))
    }
}
