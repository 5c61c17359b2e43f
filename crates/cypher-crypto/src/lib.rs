//! # Cypher Cryptographic Library
//!
//! From-scratch RSA and AES-128 for the Cypher toolkit.
//!
//! ## Core Components
//!
//! - [`prime`]: probable-prime testing and generation on big integers
//! - [`rsa`]: keypair generation and per-byte textbook RSA
//! - [`aes`]: AES-128 key schedule, block transform and ECB helpers
//! - [`tables`]: S-boxes and round constants
//!
//! Neither cipher is authenticated and per-byte RSA leaks the plaintext
//! byte distribution. These primitives exist for the Cypher transfer tool
//! and for study; they are not a general-purpose encryption scheme.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod aes;
pub mod error;
pub mod prime;
pub mod rsa;
pub mod tables;

pub use aes::{Aes128, AesKey, RoundKeySchedule};
pub use error::{CryptoError, Result};
pub use rsa::{RsaKeyPair, RsaPrivateKey, RsaPublicKey};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::aes::{Aes128, AesKey, BLOCK_SIZE, KEY_SIZE};
    pub use crate::error::{CryptoError, Result};
    pub use crate::rsa::{
        decrypt_byte, decrypt_bytes, encrypt_byte, encrypt_bytes, RsaKeyPair, RsaPrivateKey,
        RsaPublicKey,
    };
}
