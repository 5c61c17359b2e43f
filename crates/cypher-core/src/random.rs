//! Uniform random integers below a bound
//!
//! Values are drawn by rejection sampling: raw words at or above the largest
//! multiple of the bound are discarded, so the reduction is unbiased.

use rand_core::RngCore;

use crate::error::{CoreError, Result};

/// Draw a value uniformly from `[0, n)`.
pub fn uniform_u64_below<R: RngCore + ?Sized>(n: u64, rng: &mut R) -> Result<u64> {
    if n == 0 {
        return Err(CoreError::InvalidArgument("bound must be non-zero".to_string()));
    }
    let limit = u64::MAX - (u64::MAX % n);
    let mut buf = [0u8; 8];
    loop {
        rng.try_fill_bytes(&mut buf)?;
        let raw = u64::from_le_bytes(buf);
        if raw < limit {
            return Ok(raw % n);
        }
    }
}

/// Draw a value uniformly from `[0, n)`.
pub fn uniform_u128_below<R: RngCore + ?Sized>(n: u128, rng: &mut R) -> Result<u128> {
    if n == 0 {
        return Err(CoreError::InvalidArgument("bound must be non-zero".to_string()));
    }
    let limit = u128::MAX - (u128::MAX % n);
    let mut buf = [0u8; 16];
    loop {
        rng.try_fill_bytes(&mut buf)?;
        let raw = u128::from_le_bytes(buf);
        if raw < limit {
            return Ok(raw % n);
        }
    }
}

/// Draw a value uniformly from `[low, high]`.
pub fn uniform_u64_inclusive<R: RngCore + ?Sized>(low: u64, high: u64, rng: &mut R) -> Result<u64> {
    if low > high {
        return Err(CoreError::InvalidArgument(format!(
            "empty range [{low}, {high}]"
        )));
    }
    match (high - low).checked_add(1) {
        Some(span) => Ok(low + uniform_u64_below(span, rng)?),
        None => {
            let mut buf = [0u8; 8];
            rng.try_fill_bytes(&mut buf)?;
            Ok(u64::from_le_bytes(buf))
        }
    }
}
