//! Polynomial arithmetic over GF(2)
//!
//! A polynomial is stored as an integer whose bit `i` is the coefficient of
//! `x^i`. Addition is XOR, multiplication is carry-less shift-and-xor, and
//! division is degree-driven long division.

use crate::error::{CoreError, Result};

/// The AES field polynomial `x^8 + x^4 + x^3 + x + 1`
pub const AES_POLY: u128 = 0x11B;

/// Degree of `f`, or `None` for the zero polynomial.
#[inline]
pub fn degree(f: u128) -> Option<u32> {
    if f == 0 {
        None
    } else {
        Some(127 - f.leading_zeros())
    }
}

/// `f + g`
#[inline]
pub fn add(f: u128, g: u128) -> u128 {
    f ^ g
}

/// `f - g`, identical to addition in characteristic 2
#[inline]
pub fn sub(f: u128, g: u128) -> u128 {
    f ^ g
}

/// Carry-less product of two polynomials of degree below 64.
pub fn mul(f: u64, g: u64) -> u128 {
    let f = f as u128;
    let mut g = g;
    let mut product = 0u128;
    let mut shift = 0u32;
    while g != 0 {
        if g & 1 == 1 {
            product ^= f << shift;
        }
        g >>= 1;
        shift += 1;
    }
    product
}

fn long_division(f: u128, g: u128, deg_g: u32) -> (u128, u128) {
    let mut quotient = 0u128;
    let mut remainder = f;
    while let Some(deg_r) = degree(remainder) {
        if deg_r < deg_g {
            break;
        }
        let shift = deg_r - deg_g;
        remainder ^= g << shift;
        quotient |= 1u128 << shift;
    }
    (quotient, remainder)
}

/// Quotient and remainder of `f / g`.
pub fn divmod(f: u128, g: u128) -> Result<(u128, u128)> {
    let deg_g = degree(g).ok_or(CoreError::DivisionByZero)?;
    Ok(long_division(f, g, deg_g))
}

/// Remainder of `f / g`.
pub fn rem(f: u128, g: u128) -> Result<u128> {
    divmod(f, g).map(|(_, r)| r)
}

/// Greatest common divisor by the Euclidean algorithm.
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while let Some(deg_b) = degree(b) {
        let (_, r) = long_division(a, b, deg_b);
        a = b;
        b = r;
    }
    a
}

/// `f * g mod m`
pub fn mul_mod(f: u64, g: u64, m: u128) -> Result<u128> {
    rem(mul(f, g), m)
}

/// Multiplication in GF(2^8) reduced by [`AES_POLY`].
#[inline]
pub fn gf256_mul(a: u8, b: u8) -> u8 {
    let (_, r) = long_division(mul(a as u64, b as u64), AES_POLY, 8);
    r as u8
}
