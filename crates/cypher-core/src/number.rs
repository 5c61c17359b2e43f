//! Number theory on machine-width integers
//!
//! All operands are `u64`; products are formed in `u128` so modular
//! multiplication never overflows, and the extended Euclidean algorithm
//! tracks its Bézout coefficients as `i128`.

use rand_core::RngCore;
use tracing::trace;

use crate::error::{CoreError, Result};
use crate::random::uniform_u64_inclusive;

/// One congruence class `value (mod modulus)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Residue {
    /// Representative of the class
    pub value: u64,
    /// Modulus, never zero
    pub modulus: u64,
}

impl Residue {
    /// Create a residue, rejecting a zero modulus
    pub fn new(value: u64, modulus: u64) -> Result<Self> {
        if modulus == 0 {
            return Err(CoreError::ZeroModulus);
        }
        Ok(Self { value, modulus })
    }
}

/// Outcome of a Miller–Rabin test.
///
/// `Inconclusive` only means no witness proved the number composite; it is a
/// probable prime, not a proven one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimalityVerdict {
    /// Not proven composite
    Inconclusive,
    /// Proven composite
    Composite,
    /// The candidate is even
    Even,
    /// The test could not run (candidate below 3, bad witness, or RNG failure)
    Error,
}

impl PrimalityVerdict {
    /// True when the candidate survived every round
    pub fn is_probable_prime(self) -> bool {
        self == PrimalityVerdict::Inconclusive
    }

    /// True when the candidate is known not to be prime
    pub fn is_composite(self) -> bool {
        matches!(self, PrimalityVerdict::Composite | PrimalityVerdict::Even)
    }
}

/// Greatest common divisor. `gcd(0, x) == x`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Multiplicative inverse of `a` modulo `n`, normalized into `[0, n)`.
pub fn mod_inverse(a: u64, n: u64) -> Result<u64> {
    if n == 0 {
        return Err(CoreError::InvalidArgument("modulus must be non-zero".to_string()));
    }
    if gcd(a, n) != 1 {
        return Err(CoreError::NoInverse { a, n });
    }

    let (mut old_r, mut r) = (a as i128, n as i128);
    let (mut old_x, mut x) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_x, x) = (x, old_x - q * x);
    }

    Ok(old_x.rem_euclid(n as i128) as u64)
}

/// `(a * b) mod m` without overflow.
#[inline]
pub fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

/// `base^exp mod m` by square-and-multiply.
pub fn pow_mod(base: u64, mut exp: u64, m: u64) -> u64 {
    if m == 1 {
        return 0;
    }
    let mut result = 1u64;
    let mut base = base % m;
    while exp != 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    result
}

/// Strong-pseudoprime check of `n` against a fixed witness in `[2, n - 2]`.
pub fn strong_probable_prime(n: u64, witness: u64) -> PrimalityVerdict {
    if n < 3 {
        return PrimalityVerdict::Error;
    }
    if n % 2 == 0 {
        return PrimalityVerdict::Even;
    }
    if n == 3 {
        return PrimalityVerdict::Inconclusive;
    }
    if witness < 2 || witness > n - 2 {
        return PrimalityVerdict::Error;
    }

    let mut d = n - 1;
    let mut s = 0u32;
    while d % 2 == 0 {
        d >>= 1;
        s += 1;
    }

    let mut x = pow_mod(witness, d, n);
    if x == 1 || x == n - 1 {
        return PrimalityVerdict::Inconclusive;
    }
    for _ in 1..s {
        x = mul_mod(x, x, n);
        if x == n - 1 {
            return PrimalityVerdict::Inconclusive;
        }
    }
    PrimalityVerdict::Composite
}

/// One Miller–Rabin round with a witness drawn from `rng`.
pub fn miller_rabin_round<R: RngCore + ?Sized>(n: u64, rng: &mut R) -> PrimalityVerdict {
    if n < 3 {
        return PrimalityVerdict::Error;
    }
    if n % 2 == 0 {
        return PrimalityVerdict::Even;
    }
    if n == 3 {
        return PrimalityVerdict::Inconclusive;
    }
    match uniform_u64_inclusive(2, n - 2, rng) {
        Ok(witness) => strong_probable_prime(n, witness),
        Err(_) => PrimalityVerdict::Error,
    }
}

/// Repeated Miller–Rabin. A zero round count still runs one round.
///
/// The false-positive probability for an odd composite is at most
/// `(1/4)^rounds`. Even candidates of 4 and above are reported `Composite`.
pub fn extended_miller_rabin<R: RngCore + ?Sized>(
    n: u64,
    rounds: u32,
    rng: &mut R,
) -> PrimalityVerdict {
    if n < 3 {
        return PrimalityVerdict::Error;
    }
    if n % 2 == 0 {
        return PrimalityVerdict::Composite;
    }
    for round in 0..rounds.max(1) {
        match miller_rabin_round(n, rng) {
            PrimalityVerdict::Inconclusive => continue,
            PrimalityVerdict::Composite => {
                trace!(n, round, "witness proved compositeness");
                return PrimalityVerdict::Composite;
            }
            other => return other,
        }
    }
    PrimalityVerdict::Inconclusive
}

/// Probable-prime check using the thread-local RNG. Accepts 2.
pub fn is_probable_prime(n: u64, rounds: u32) -> bool {
    if n == 2 {
        return true;
    }
    extended_miller_rabin(n, rounds, &mut rand::thread_rng()).is_probable_prime()
}

/// Chinese Remainder reconstruction over pairwise-coprime moduli.
///
/// Returns the unique solution in `[0, M)` where `M` is the product of the moduli.
pub fn crt(residues: &[Residue]) -> Result<u64> {
    if residues.is_empty() {
        return Err(CoreError::InvalidArgument("no residues given".to_string()));
    }
    if residues.iter().any(|r| r.modulus == 0) {
        return Err(CoreError::ZeroModulus);
    }
    for (i, a) in residues.iter().enumerate() {
        for b in &residues[i + 1..] {
            let g = gcd(a.modulus, b.modulus);
            if g != 1 {
                return Err(CoreError::NotCoprime { a: a.modulus, b: b.modulus, gcd: g });
            }
        }
    }

    let product = residues.iter().try_fold(1u64, |acc, r| {
        acc.checked_mul(r.modulus).ok_or_else(|| {
            CoreError::Overflow(format!("modulus product exceeds {}", u64::MAX))
        })
    })?;
    let m = product as u128;

    let mut acc = 0u128;
    for r in residues {
        let partial = product / r.modulus;
        let inverse = mod_inverse(partial % r.modulus, r.modulus)?;
        let term = (partial as u128 * inverse as u128) % m;
        let term = (term * (r.value % r.modulus) as u128) % m;
        acc = (acc + term) % m;
    }

    Ok(acc as u64)
}
