//! Textbook RSA over single bytes
//!
//! Each plaintext byte is raised to the public exponent on its own, so a
//! message of `k` bytes becomes `k` independent ciphertext integers. Keys
//! serialize either as two length-prefixed big-endian fields (exponent,
//! then modulus) or as two decimal lines in a key file.

use std::fmt;
use std::path::Path;

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;
use rand_core::RngCore;
use tracing::debug;

use cypher_core::number::extended_miller_rabin;
use cypher_core::random::uniform_u64_below;
use cypher_core::{wire, CoreError, KeyBuffer};

use crate::error::{CryptoError, Result};
use crate::prime::{generate_probable_prime, DEFAULT_ROUNDS};

/// Smallest prime size accepted for a keypair
pub const MIN_PRIME_BITS: u64 = 8;

/// Exponent draws tried against one pair of primes before new primes are drawn
const EXPONENT_ATTEMPTS: u32 = 32;

/// Draws of `q` allowed to repeat `p` before generation gives up
const DISTINCT_PRIME_ATTEMPTS: u32 = 64;

/// Every byte value must stay below the modulus to survive encryption
const MIN_MODULUS: u32 = 256;

/// Public half of a keypair: `(e, n)`
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    e: BigUint,
    n: BigUint,
}

/// Private half of a keypair: `(d, n)`
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    d: BigUint,
    n: BigUint,
}

/// A matching public and private key
#[derive(Clone, Debug)]
pub struct RsaKeyPair {
    /// Public key `(e, n)`
    pub public: RsaPublicKey,
    /// Private key `(d, n)`
    pub private: RsaPrivateKey,
}

/// Modular inverse of `a` modulo `m` over arbitrary-size integers.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() {
        return None;
    }
    let m_int = BigInt::from(m.clone());
    let egcd = BigInt::from(a.clone()).extended_gcd(&m_int);
    if !egcd.gcd.is_one() {
        return None;
    }
    egcd.x.mod_floor(&m_int).to_biguint()
}

fn draw_exponent<R: RngCore + ?Sized>(bits: u64, rounds: u32, rng: &mut R) -> Result<BigUint> {
    if bits > 63 {
        return generate_probable_prime(bits, rounds, rng);
    }
    let top = 1u64 << (bits - 1);
    loop {
        let e = top | uniform_u64_below(top, rng)? | 1;
        if extended_miller_rabin(e, rounds, rng).is_probable_prime() {
            return Ok(BigUint::from(e));
        }
    }
}

fn distinct_prime<R: RngCore + ?Sized>(
    p: &BigUint,
    bits: u64,
    rounds: u32,
    rng: &mut R,
) -> Result<BigUint> {
    for _ in 0..DISTINCT_PRIME_ATTEMPTS {
        let q = generate_probable_prime(bits, rounds, rng)?;
        if &q != p {
            return Ok(q);
        }
    }
    Err(CryptoError::KeyGeneration(format!(
        "random source repeated the same {bits}-bit prime {DISTINCT_PRIME_ATTEMPTS} times"
    )))
}

impl RsaKeyPair {
    /// Generate a keypair from two `bits`-bit primes using the OS random source.
    pub fn generate(bits: u64) -> Result<Self> {
        Self::generate_with(bits, DEFAULT_ROUNDS, &mut OsRng)
    }

    /// Generate a keypair with a chosen round count and random source.
    ///
    /// The public exponent is a prime of `max(bits / 10, 2)` bits, redrawn
    /// until it is invertible modulo `φ(n)`.
    pub fn generate_with<R: RngCore + ?Sized>(bits: u64, rounds: u32, rng: &mut R) -> Result<Self> {
        if bits < MIN_PRIME_BITS {
            return Err(CoreError::InvalidArgument(format!(
                "prime size must be at least {MIN_PRIME_BITS} bits, got {bits}"
            ))
            .into());
        }
        let e_bits = (bits / 10).max(2);

        loop {
            let p = generate_probable_prime(bits, rounds, rng)?;
            let q = distinct_prime(&p, bits, rounds, rng)?;
            let n = &p * &q;
            let phi = (&p - 1u8) * (&q - 1u8);

            for _ in 0..EXPONENT_ATTEMPTS {
                let e = draw_exponent(e_bits, rounds, rng)?;
                if let Some(d) = mod_inverse(&e, &phi) {
                    debug!(bits, modulus_bits = n.bits(), "generated RSA keypair");
                    return Ok(Self {
                        public: RsaPublicKey { e, n: n.clone() },
                        private: RsaPrivateKey { d, n },
                    });
                }
            }
            debug!(bits, "no invertible exponent for this prime pair, redrawing");
        }
    }
}

/// Encrypt one byte: `byte^e mod n`.
pub fn encrypt_byte(byte: u8, public: &RsaPublicKey) -> BigUint {
    BigUint::from(byte).modpow(&public.e, &public.n)
}

/// Decrypt one ciphertext integer: `cipher^d mod n`, truncated to its low byte.
pub fn decrypt_byte(cipher: &BigUint, private: &RsaPrivateKey) -> u8 {
    let plain = cipher.modpow(&private.d, &private.n);
    plain.iter_u32_digits().next().unwrap_or(0) as u8
}

/// Encrypt every byte of `plaintext` independently.
pub fn encrypt_bytes(plaintext: &[u8], public: &RsaPublicKey) -> Vec<BigUint> {
    plaintext.iter().map(|&b| encrypt_byte(b, public)).collect()
}

/// Decrypt a sequence produced by [`encrypt_bytes`].
pub fn decrypt_bytes(ciphertext: &[BigUint], private: &RsaPrivateKey) -> Vec<u8> {
    ciphertext.iter().map(|c| decrypt_byte(c, private)).collect()
}

fn encode_pair(exponent: &BigUint, modulus: &BigUint) -> KeyBuffer {
    let exponent = exponent.to_bytes_be();
    let modulus = modulus.to_bytes_be();
    let mut out =
        Vec::with_capacity(wire::encoded_len(exponent.len()) + wire::encoded_len(modulus.len()));
    wire::put_field(&mut out, &exponent);
    wire::put_field(&mut out, &modulus);
    KeyBuffer::new(out)
}

fn decode_pair(bytes: &[u8]) -> Result<(BigUint, BigUint)> {
    let mut cursor = bytes;
    let malformed = |err: CoreError| CryptoError::MalformedKey(err.to_string());
    let exponent = BigUint::from_bytes_be(wire::take_field(&mut cursor).map_err(malformed)?);
    let modulus = BigUint::from_bytes_be(wire::take_field(&mut cursor).map_err(malformed)?);
    if !cursor.is_empty() {
        return Err(CryptoError::MalformedKey(format!(
            "{} trailing bytes after key",
            cursor.len()
        )));
    }
    check_modulus(&modulus)?;
    Ok((exponent, modulus))
}

fn check_modulus(modulus: &BigUint) -> Result<()> {
    if modulus < &BigUint::from(MIN_MODULUS) {
        return Err(CryptoError::MalformedKey(format!(
            "modulus {modulus} cannot carry byte values, need at least {MIN_MODULUS}"
        )));
    }
    Ok(())
}

fn pair_from_decimal(text: &str) -> Result<(BigUint, BigUint)> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let mut next = |what: &str| -> Result<BigUint> {
        let line = lines
            .next()
            .ok_or_else(|| CryptoError::MalformedKey(format!("missing {what} line")))?;
        line.parse::<BigUint>()
            .map_err(|err| CryptoError::MalformedKey(format!("bad {what}: {err}")))
    };
    let exponent = next("exponent")?;
    let modulus = next("modulus")?;
    if lines.next().is_some() {
        return Err(CryptoError::MalformedKey("unexpected text after modulus".to_string()));
    }
    check_modulus(&modulus)?;
    Ok((exponent, modulus))
}

fn save_text(path: &Path, text: String) -> Result<()> {
    std::fs::write(path, text)?;
    debug!(path = %path.display(), "saved RSA key");
    Ok(())
}

impl RsaPublicKey {
    /// Build a key from its parts, rejecting a modulus below 256
    pub fn new(e: BigUint, n: BigUint) -> Result<Self> {
        check_modulus(&n)?;
        Ok(Self { e, n })
    }

    /// Public exponent
    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    /// Modulus
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// Serialize as length-prefixed exponent and modulus
    pub fn to_bytes(&self) -> KeyBuffer {
        encode_pair(&self.e, &self.n)
    }

    /// Parse the output of [`RsaPublicKey::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (e, n) = decode_pair(bytes)?;
        Ok(Self { e, n })
    }

    /// Exponent and modulus as decimal lines
    pub fn to_decimal_string(&self) -> String {
        format!("{}\n{}\n", self.e, self.n)
    }

    /// Parse the output of [`RsaPublicKey::to_decimal_string`]
    pub fn from_decimal_str(text: &str) -> Result<Self> {
        let (e, n) = pair_from_decimal(text)?;
        Ok(Self { e, n })
    }

    /// Write the key file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_text(path.as_ref(), self.to_decimal_string())
    }

    /// Read a key file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_decimal_str(&std::fs::read_to_string(path)?)
    }

    /// Low eight bytes of the modulus, shown when comparing keys by eye
    pub fn fingerprint(&self) -> Vec<u8> {
        let bytes = self.n.to_bytes_be();
        let tail = bytes.len().saturating_sub(8);
        bytes[tail..].to_vec()
    }
}

impl RsaPrivateKey {
    /// Build a key from its parts, rejecting a modulus below 256
    pub fn new(d: BigUint, n: BigUint) -> Result<Self> {
        check_modulus(&n)?;
        Ok(Self { d, n })
    }

    /// Private exponent
    pub fn exponent(&self) -> &BigUint {
        &self.d
    }

    /// Modulus
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// Serialize as length-prefixed exponent and modulus
    pub fn to_bytes(&self) -> KeyBuffer {
        encode_pair(&self.d, &self.n)
    }

    /// Parse the output of [`RsaPrivateKey::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (d, n) = decode_pair(bytes)?;
        Ok(Self { d, n })
    }

    /// Exponent and modulus as decimal lines
    pub fn to_decimal_string(&self) -> String {
        format!("{}\n{}\n", self.d, self.n)
    }

    /// Parse the output of [`RsaPrivateKey::to_decimal_string`]
    pub fn from_decimal_str(text: &str) -> Result<Self> {
        let (d, n) = pair_from_decimal(text)?;
        Ok(Self { d, n })
    }

    /// Write the key file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_text(path.as_ref(), self.to_decimal_string())
    }

    /// Read a key file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_decimal_str(&std::fs::read_to_string(path)?)
    }
}

impl fmt::Debug for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPublicKey")
            .field("e", &self.e)
            .field("modulus_bits", &self.n.bits())
            .finish()
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("modulus_bits", &self.n.bits())
            .finish_non_exhaustive()
    }
}
