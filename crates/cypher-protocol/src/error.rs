//! Protocol error types

use cypher_core::CoreError;
use cypher_crypto::CryptoError;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Crypto error
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Transport failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream before a known-length transfer finished
    #[error("Peer closed during {stage}: {received} of {expected} bytes transferred")]
    PeerClosed {
        stage: &'static str,
        received: u64,
        expected: u64,
    },

    /// Declared payload exceeds the configured limit
    #[error("Payload too large: {len} bytes exceeds maximum {max}")]
    PayloadTooLarge { len: u64, max: u64 },

    /// Pad size in the header is out of range for the payload
    #[error("Invalid padding: {0}")]
    InvalidPadding(String),

    /// Header tags do not match the expected message kind
    #[error("Unexpected frame: {0}")]
    UnexpectedFrame(String),

    /// Payload contents could not be parsed
    #[error("Malformed payload: {0}")]
    Malformed(String),
}
