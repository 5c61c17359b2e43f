//! Error types for cryptographic operations

use cypher_core::CoreError;
use thiserror::Error;

/// Result type alias for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during key generation, encryption or key I/O
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Failure in the underlying number theory or random source
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Key generation could not produce a usable key
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Serialized or textual key could not be parsed
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Buffer is not a whole number of cipher blocks
    #[error("Invalid block length: {len} is not a multiple of {block}")]
    InvalidBlockLength { len: usize, block: usize },

    /// Reading or writing a key file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rand_core::Error> for CryptoError {
    fn from(err: rand_core::Error) -> Self {
        CryptoError::Core(CoreError::from(err))
    }
}
