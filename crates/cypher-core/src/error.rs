//! Error types for core arithmetic and buffer operations

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    /// An argument is outside the operation's domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No multiplicative inverse exists
    #[error("No inverse: gcd({a}, {n}) != 1")]
    NoInverse { a: u64, n: u64 },

    /// CRT moduli share a common factor
    #[error("Moduli not coprime: gcd({a}, {b}) = {gcd}")]
    NotCoprime { a: u64, b: u64, gcd: u64 },

    /// A residue was given with modulus zero
    #[error("Modulus must be non-zero")]
    ZeroModulus,

    /// Intermediate value does not fit the working width
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Polynomial division by the zero polynomial
    #[error("Division by zero polynomial")]
    DivisionByZero,

    /// A length-prefixed field ran past the end of its buffer
    #[error("Truncated field: needed {needed} bytes, {available} available")]
    Truncated { needed: u64, available: usize },

    /// The random source failed
    #[error("Random number generation failed: {0}")]
    Rng(String),

    /// I/O failure while reading or writing key material
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rand_core::Error> for CoreError {
    fn from(err: rand_core::Error) -> Self {
        CoreError::Rng(err.to_string())
    }
}
