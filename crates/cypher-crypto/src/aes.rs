//! AES-128 block cipher
//!
//! A straightforward implementation of FIPS-197 for 128-bit keys. Blocks
//! enter and leave as big-endian `u128` values; in between they live in a
//! 4×4 `state[row][col]` array filled column by column. MixColumns works
//! through [`gf256_mul`], i.e. polynomial products reduced by `0x11B`.
//!
//! The cipher applies no padding and no chaining of its own. [`Aes128::encrypt_ecb`]
//! simply runs the block transform over each 16-byte chunk.

use std::fmt;
use std::path::Path;

use rand::rngs::OsRng;
use rand_core::RngCore;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use cypher_core::gf2::gf256_mul;
use cypher_core::random::{uniform_u128_below, uniform_u64_inclusive};
use cypher_core::KeyBuffer;

use crate::error::{CryptoError, Result};
use crate::tables::{INV_SBOX, RCON, SBOX};

/// Block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Key size in bytes
pub const KEY_SIZE: usize = 16;

/// Number of rounds for a 128-bit key
pub const ROUNDS: usize = 10;

/// Words in an expanded key schedule
pub const SCHEDULE_WORDS: usize = 4 * (ROUNDS + 1);

type State = [[u8; 4]; 4];

fn state_from_block(block: u128) -> State {
    let bytes = block.to_be_bytes();
    let mut state = [[0u8; 4]; 4];
    for (i, byte) in bytes.iter().enumerate() {
        state[i % 4][i / 4] = *byte;
    }
    state
}

fn block_from_state(state: &State) -> u128 {
    let mut bytes = [0u8; BLOCK_SIZE];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = state[i % 4][i / 4];
    }
    u128::from_be_bytes(bytes)
}

/// A 128-bit AES key, wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AesKey([u8; KEY_SIZE]);

impl AesKey {
    /// Wrap raw key bytes
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Copy a key out of a slice of exactly [`KEY_SIZE`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Key from a big-endian integer
    pub fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// Key as a big-endian integer
    pub fn to_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Borrow the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Generate a key with the OS random source, see [`AesKey::generate_with`].
    pub fn generate() -> Result<Self> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a key the way the legacy tool did.
    ///
    /// A length `s` in `[1, 16]` is drawn first, then a value below
    /// `2^(8s)`, which is shifted up by `16 - s` bytes. The low bytes of a
    /// short draw are therefore always zero and keys are not uniform over
    /// the 128-bit space. Use [`AesKey::generate_uniform_with`] where that
    /// matters.
    pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        let selector = uniform_u64_inclusive(1, KEY_SIZE as u64, rng)? as u32;
        let value = if selector as usize == KEY_SIZE {
            let mut bytes = [0u8; KEY_SIZE];
            rng.try_fill_bytes(&mut bytes)?;
            u128::from_be_bytes(bytes)
        } else {
            uniform_u128_below(1u128 << (8 * selector), rng)?
        };
        let shift = 8 * (KEY_SIZE as u32 - selector);
        Ok(Self::from_u128(value << shift))
    }

    /// Generate a uniformly random key with the OS random source.
    pub fn generate_uniform() -> Result<Self> {
        Self::generate_uniform_with(&mut OsRng)
    }

    /// Generate a key uniform over all 128-bit values.
    pub fn generate_uniform_with<R: RngCore + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut bytes = [0u8; KEY_SIZE];
        rng.try_fill_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }

    /// Write the raw 16 key bytes to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        KeyBuffer::from_slice(&self.0).export(path)?;
        Ok(())
    }

    /// Read a raw 16-byte key file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let buffer = KeyBuffer::import(path)?;
        Self::from_bytes(buffer.as_bytes())
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesKey(<redacted>)")
    }
}

/// The 44 round-key words derived from one key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RoundKeySchedule {
    words: [u32; SCHEDULE_WORDS],
}

fn sub_word(word: u32) -> u32 {
    u32::from_be_bytes(word.to_be_bytes().map(|b| SBOX[b as usize]))
}

impl RoundKeySchedule {
    /// Expand `key` into the full schedule.
    pub fn expand(key: &AesKey) -> Self {
        let mut words = [0u32; SCHEDULE_WORDS];
        for (i, chunk) in key.0.chunks_exact(4).enumerate() {
            words[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        for i in 4..SCHEDULE_WORDS {
            let mut temp = words[i - 1];
            if i % 4 == 0 {
                temp = sub_word(temp.rotate_left(8)) ^ ((RCON[i / 4 - 1] as u32) << 24);
            }
            words[i] = words[i - 4] ^ temp;
        }
        Self { words }
    }

    /// All schedule words
    pub fn words(&self) -> &[u32; SCHEDULE_WORDS] {
        &self.words
    }

    fn add_round_key(&self, state: &mut State, round: usize) {
        for col in 0..4 {
            let word = self.words[4 * round + col].to_be_bytes();
            for row in 0..4 {
                state[row][col] ^= word[row];
            }
        }
    }
}

fn sub_bytes(state: &mut State, table: &[u8; 256]) {
    for row in state.iter_mut() {
        for byte in row.iter_mut() {
            *byte = table[*byte as usize];
        }
    }
}

fn shift_rows(state: &mut State) {
    for (r, row) in state.iter_mut().enumerate() {
        row.rotate_left(r);
    }
}

fn inv_shift_rows(state: &mut State) {
    for (r, row) in state.iter_mut().enumerate() {
        row.rotate_right(r);
    }
}

fn mix_column_with(state: &mut State, matrix: &[[u8; 4]; 4]) {
    for col in 0..4 {
        let column = [state[0][col], state[1][col], state[2][col], state[3][col]];
        for row in 0..4 {
            state[row][col] = (0..4).fold(0u8, |acc, k| acc ^ gf256_mul(matrix[row][k], column[k]));
        }
    }
}

const MIX: [[u8; 4]; 4] = [[2, 3, 1, 1], [1, 2, 3, 1], [1, 1, 2, 3], [3, 1, 1, 2]];
const INV_MIX: [[u8; 4]; 4] = [
    [0x0e, 0x0b, 0x0d, 0x09],
    [0x09, 0x0e, 0x0b, 0x0d],
    [0x0d, 0x09, 0x0e, 0x0b],
    [0x0b, 0x0d, 0x09, 0x0e],
];

/// AES-128 with an expanded key schedule.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Aes128 {
    schedule: RoundKeySchedule,
}

impl Aes128 {
    /// Expand `key` and build a cipher
    pub fn new(key: &AesKey) -> Self {
        Self { schedule: RoundKeySchedule::expand(key) }
    }

    /// The expanded schedule
    pub fn schedule(&self) -> &RoundKeySchedule {
        &self.schedule
    }

    /// Encrypt one block
    pub fn encrypt_block(&self, block: u128) -> u128 {
        let mut state = state_from_block(block);
        self.schedule.add_round_key(&mut state, 0);
        for round in 1..ROUNDS {
            sub_bytes(&mut state, &SBOX);
            shift_rows(&mut state);
            mix_column_with(&mut state, &MIX);
            self.schedule.add_round_key(&mut state, round);
        }
        sub_bytes(&mut state, &SBOX);
        shift_rows(&mut state);
        self.schedule.add_round_key(&mut state, ROUNDS);
        let out = block_from_state(&state);
        state.zeroize();
        out
    }

    /// Decrypt one block
    pub fn decrypt_block(&self, block: u128) -> u128 {
        let mut state = state_from_block(block);
        self.schedule.add_round_key(&mut state, ROUNDS);
        for round in (1..ROUNDS).rev() {
            inv_shift_rows(&mut state);
            sub_bytes(&mut state, &INV_SBOX);
            self.schedule.add_round_key(&mut state, round);
            mix_column_with(&mut state, &INV_MIX);
        }
        inv_shift_rows(&mut state);
        sub_bytes(&mut state, &INV_SBOX);
        self.schedule.add_round_key(&mut state, 0);
        let out = block_from_state(&state);
        state.zeroize();
        out
    }

    /// Encrypt each 16-byte block of `data` independently.
    pub fn encrypt_ecb(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.map_blocks(data, |block| self.encrypt_block(block))
    }

    /// Decrypt each 16-byte block of `data` independently.
    pub fn decrypt_ecb(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.map_blocks(data, |block| self.decrypt_block(block))
    }

    fn map_blocks(&self, data: &[u8], transform: impl Fn(u128) -> u128) -> Result<Vec<u8>> {
        if data.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::InvalidBlockLength { len: data.len(), block: BLOCK_SIZE });
        }
        let mut out = Vec::with_capacity(data.len());
        for chunk in data.chunks_exact(BLOCK_SIZE) {
            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(chunk);
            out.extend_from_slice(&transform(u128::from_be_bytes(block)).to_be_bytes());
        }
        debug!(blocks = data.len() / BLOCK_SIZE, "processed ECB buffer");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    const FIPS_KEY: u128 = 0x000102030405060708090a0b0c0d0e0f;
    const FIPS_PLAIN: u128 = 0x00112233445566778899aabbccddeeff;
    const FIPS_CIPHER: u128 = 0x69c4e0d86a7b0430d8cdb78070b4c55a;

    #[test]
    fn test_fips197_known_answer() {
        let aes = Aes128::new(&AesKey::from_u128(FIPS_KEY));
        assert_eq!(aes.encrypt_block(FIPS_PLAIN), FIPS_CIPHER);
        assert_eq!(aes.decrypt_block(FIPS_CIPHER), FIPS_PLAIN);
    }

    #[test]
    fn test_key_expansion_appendix_a() {
        // FIPS-197 Appendix A.1
        let key = AesKey::from_u128(0x2b7e151628aed2a6abf7158809cf4f3c);
        let schedule = RoundKeySchedule::expand(&key);
        let words = schedule.words();
        assert_eq!(words[4], 0xa0fafe17);
        assert_eq!(words[5], 0x88542cb1);
        assert_eq!(words[43], 0xb6630ca6);
    }

    #[test]
    fn test_state_layout_is_column_major() {
        let state = state_from_block(FIPS_PLAIN);
        assert_eq!(state[0], [0x00, 0x44, 0x88, 0xcc]);
        assert_eq!(state[1][0], 0x11);
        assert_eq!(block_from_state(&state), FIPS_PLAIN);
    }

    #[test]
    fn test_mix_columns_inverse() {
        let mut state = state_from_block(0xdb135345f20a225c01010101c6c6c6c6);
        let original = state;
        mix_column_with(&mut state, &MIX);
        // column 0 from the standard MixColumns examples
        assert_eq!([state[0][0], state[1][0], state[2][0], state[3][0]], [0x8e, 0x4d, 0xa1, 0xbc]);
        mix_column_with(&mut state, &INV_MIX);
        assert_eq!(state, original);
    }

    #[test]
    fn test_ecb_round_trip() {
        let aes = Aes128::new(&AesKey::from_u128(FIPS_KEY));
        let data: Vec<u8> = (0..64u8).collect();
        let sealed = aes.encrypt_ecb(&data).unwrap();
        assert_eq!(sealed.len(), 64);
        assert_eq!(
            u128::from_be_bytes(sealed[..16].try_into().unwrap()),
            aes.encrypt_block(u128::from_be_bytes(data[..16].try_into().unwrap()))
        );
        assert_eq!(aes.decrypt_ecb(&sealed).unwrap(), data);
        assert!(aes.encrypt_ecb(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_ecb_rejects_partial_block() {
        let aes = Aes128::new(&AesKey::from_u128(1));
        assert!(matches!(
            aes.encrypt_ecb(&[0u8; 17]),
            Err(CryptoError::InvalidBlockLength { len: 17, block: 16 })
        ));
        assert!(aes.decrypt_ecb(&[0u8; 15]).is_err());
    }

    /// Fills every byte with the same value
    struct ConstRng(u8);

    impl RngCore for ConstRng {
        fn next_u32(&mut self) -> u32 {
            u32::from_le_bytes([self.0; 4])
        }
        fn next_u64(&mut self) -> u64 {
            u64::from_le_bytes([self.0; 8])
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(self.0);
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn test_legacy_generation_scales_short_draw() {
        // 0x0101..01 % 16 == 1 selects two bytes, the value 0x0101 is then
        // shifted into the top of the key
        let key = AesKey::generate_with(&mut ConstRng(1)).unwrap();
        let mut expected = [0u8; KEY_SIZE];
        expected[0] = 1;
        expected[1] = 1;
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn test_legacy_generation_is_skewed() {
        let mut rng = StdRng::seed_from_u64(9);
        let zero_low_byte = (0..400)
            .filter(|_| AesKey::generate_with(&mut rng).unwrap().as_bytes()[KEY_SIZE - 1] == 0)
            .count();
        // only a full 16-byte draw can set the low byte
        assert!(zero_low_byte > 300, "{zero_low_byte} of 400 keys had a zero low byte");
    }

    #[test]
    fn test_uniform_generation_differs() {
        let mut rng = StdRng::seed_from_u64(10);
        let a = AesKey::generate_uniform_with(&mut rng).unwrap();
        let b = AesKey::generate_uniform_with(&mut rng).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_from_bytes_length() {
        assert!(AesKey::from_bytes(&[0u8; 16]).is_ok());
        assert!(matches!(
            AesKey::from_bytes(&[0u8; 15]),
            Err(CryptoError::InvalidKeyLength { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_key_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aes.key");
        let key = AesKey::from_u128(FIPS_KEY);
        key.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap().len(), KEY_SIZE);
        assert_eq!(AesKey::load(&path).unwrap(), key);

        std::fs::write(&path, [1u8; 7]).unwrap();
        assert!(matches!(AesKey::load(&path), Err(CryptoError::InvalidKeyLength { .. })));
    }

    #[test]
    fn test_debug_redacts_key() {
        assert_eq!(format!("{:?}", AesKey::from_u128(FIPS_KEY)), "AesKey(<redacted>)");
    }
}
