//! # Cypher Protocol
//!
//! Binary framing used to move keys and ciphertext over a byte stream.
//!
//! ## Wire Format
//!
//! Every message is a 16-byte [`FrameHeader`] followed by `payload_len`
//! payload bytes. There is no magic number or version field; both peers
//! are expected to run the same sequence of messages.
//!
//! ## Modules
//!
//! - [`header`]: header layout and typed tag accessors
//! - [`frame`]: header plus payload
//! - [`padding`]: 16-byte block padding for AES payloads
//! - [`codec`]: blocking full-read/full-write loops and the decode state machine
//! - [`message`]: public key, sealed AES key and data frames
//! - `async_codec`: the same transfers over tokio streams (feature `tokio`)

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

#[cfg(feature = "tokio")]
pub mod async_codec;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod header;
pub mod message;
pub mod padding;

pub use codec::{read_frame, write_frame, DecodeState, FrameDecoder};
pub use config::CodecConfig;
pub use error::{ProtocolError, Result};
pub use frame::Frame;
pub use header::{EncryptionType, FrameHeader, KeyType, HEADER_SIZE};

#[cfg(feature = "tokio")]
pub use async_codec::{read_frame_async, write_frame_async};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::codec::{read_frame, write_frame};
    pub use crate::config::CodecConfig;
    pub use crate::error::{ProtocolError, Result};
    pub use crate::frame::Frame;
    pub use crate::header::{EncryptionType, FrameHeader, KeyType};
    pub use crate::message::{
        data_frame, decode_public_key, open_data_frame, open_sealed_key, public_key_frame,
        sealed_key_frame, MessageKind,
    };
}
