//! Probable primes of arbitrary size
//!
//! Candidates are filtered by trial division against a short table of small
//! primes before the Miller–Rabin rounds, which rejects most composites for
//! the cost of a few word divisions.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use rand_core::RngCore;
use tracing::{debug, trace};

use cypher_core::CoreError;

use crate::error::Result;

/// Miller–Rabin rounds used when the caller does not choose
pub const DEFAULT_ROUNDS: u32 = 100;

const SMALL_PRIMES: [u32; 46] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193,
    197, 199,
];

/// Draw `bits` random bits as a big-endian integer.
pub(crate) fn random_bits<R: RngCore + ?Sized>(bits: u64, rng: &mut R) -> Result<BigUint> {
    let len = bits.div_ceil(8) as usize;
    let mut bytes = vec![0u8; len];
    rng.try_fill_bytes(&mut bytes)?;
    let excess = (len as u64 * 8 - bits) as u32;
    if let Some(top) = bytes.first_mut() {
        *top &= 0xff >> excess;
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

/// Draw a value uniformly from `[0, bound)` by rejection sampling.
pub(crate) fn random_below<R: RngCore + ?Sized>(bound: &BigUint, rng: &mut R) -> Result<BigUint> {
    if bound.is_zero() {
        return Err(CoreError::InvalidArgument("bound must be non-zero".to_string()).into());
    }
    let bits = bound.bits();
    loop {
        let candidate = random_bits(bits, rng)?;
        if &candidate < bound {
            return Ok(candidate);
        }
    }
}

fn small_prime_verdict(n: &BigUint) -> Option<bool> {
    for &p in SMALL_PRIMES.iter() {
        if let Some(small) = n.to_u32() {
            if small == p {
                return Some(true);
            }
        }
        if (n % p).is_zero() {
            return Some(false);
        }
    }
    None
}

/// Miller–Rabin test of `n` with `rounds` random witnesses.
///
/// Returns `false` for `n < 2` and for every composite caught by a witness.
/// Only a failing random source is reported as an error.
pub fn is_probable_prime<R: RngCore + ?Sized>(
    n: &BigUint,
    rounds: u32,
    rng: &mut R,
) -> Result<bool> {
    if n < &BigUint::from(2u8) {
        return Ok(false);
    }
    if let Some(verdict) = small_prime_verdict(n) {
        return Ok(verdict);
    }

    let one = BigUint::one();
    let n_minus_1 = n - &one;
    let s = n_minus_1.trailing_zeros().unwrap_or(0);
    let d = &n_minus_1 >> s;
    // witnesses are drawn from [2, n - 2]
    let span = n - BigUint::from(3u8);

    'witness: for _ in 0..rounds.max(1) {
        let a = random_below(&span, rng)? + 2u8;
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_1 {
            continue;
        }
        for _ in 1..s {
            x = &x * &x % n;
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return Ok(false);
    }
    Ok(true)
}

/// Generate a probable prime of exactly `bits` bits.
///
/// The top bit is forced so the size is exact and the bottom bit so the
/// candidate is odd.
pub fn generate_probable_prime<R: RngCore + ?Sized>(
    bits: u64,
    rounds: u32,
    rng: &mut R,
) -> Result<BigUint> {
    if bits < 2 {
        return Err(CoreError::InvalidArgument(format!(
            "a prime needs at least 2 bits, got {bits}"
        ))
        .into());
    }

    let mut attempts = 0u64;
    loop {
        attempts += 1;
        let mut candidate = random_bits(bits, rng)?;
        candidate.set_bit(bits - 1, true);
        candidate.set_bit(0, true);

        if is_probable_prime(&candidate, rounds, rng)? {
            debug!(bits, attempts, "found probable prime");
            return Ok(candidate);
        }
        trace!(bits, attempts, "candidate rejected");
    }
}
