//! # Cypher Core
//!
//! Machine-width arithmetic shared by the rest of the Cypher toolkit.
//!
//! ## Core Components
//!
//! - [`number`]: gcd, modular inverse, Miller–Rabin and CRT on `u64`
//! - [`gf2`]: carry-less polynomial arithmetic over GF(2)
//! - [`random`]: unbiased bounded random integers
//! - [`buffer`]: owned, zeroize-on-drop key bytes
//! - [`wire`]: length-prefixed field encoding

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod buffer;
pub mod error;
pub mod gf2;
pub mod number;
pub mod random;
pub mod wire;

pub use buffer::KeyBuffer;
pub use error::{CoreError, Result};
pub use number::{PrimalityVerdict, Residue};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::buffer::KeyBuffer;
    pub use crate::error::{CoreError, Result};
    pub use crate::gf2;
    pub use crate::number::{
        crt, extended_miller_rabin, gcd, miller_rabin_round, mod_inverse, PrimalityVerdict,
        Residue,
    };
}
