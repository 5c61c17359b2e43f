//! Fixed 16-byte frame header
//!
//! ```text
//! 0               8    9    10   11   12   13   14   15
//! +---------------+----+----+----+----+----+----+----+----+
//! | payload len   | pf | ps | ef | et | kf | kt | hf | ht |
//! | (u64, BE)     |    |    |    |    |    |    |    |    |
//! +---------------+----+----+----+----+----+----+----+----+
//! ```
//!
//! The eight trailing bytes are pad flag/size, encryption flag/type, key
//! flag/type and hash flag/type. They are stored verbatim so unknown values
//! survive a round trip; [`FrameHeader::encryption`] and [`FrameHeader::key`]
//! interpret the values this crate assigns.

use bytes::{Buf, BufMut};

/// Encoded header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Cipher applied to a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EncryptionType {
    /// Per-byte textbook RSA
    Rsa = 1,
    /// AES-128 in ECB mode
    Aes128 = 2,
}

impl TryFrom<u8> for EncryptionType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            1 => Ok(EncryptionType::Rsa),
            2 => Ok(EncryptionType::Aes128),
            other => Err(other),
        }
    }
}

/// Kind of key carried in a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyType {
    /// RSA public key `(e, n)`
    RsaPublic = 1,
    /// AES-128 session key
    Aes128 = 2,
}

impl TryFrom<u8> for KeyType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            1 => Ok(KeyType::RsaPublic),
            2 => Ok(KeyType::Aes128),
            other => Err(other),
        }
    }
}

/// Frame header
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    /// Number of payload bytes that follow the header
    pub payload_len: u64,
    /// Non-zero when the payload carries padding
    pub pad_flag: u8,
    /// Number of pad bytes at the end of the decrypted payload
    pub pad_size: u8,
    /// Non-zero when the payload is encrypted
    pub enc_flag: u8,
    /// Raw encryption type
    pub enc_type: u8,
    /// Non-zero when the payload is a key
    pub key_flag: u8,
    /// Raw key type
    pub key_type: u8,
    /// Non-zero when a hash is attached
    pub hash_flag: u8,
    /// Raw hash type
    pub hash_type: u8,
}

impl FrameHeader {
    /// Header for a plain payload of `payload_len` bytes
    pub fn new(payload_len: u64) -> Self {
        Self {
            payload_len,
            ..Default::default()
        }
    }

    /// Serialize to the 16-byte wire form
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        self.encode_into(&mut &mut out[..]);
        out
    }

    /// Append the wire form to `buf`
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64(self.payload_len);
        buf.put_slice(&[
            self.pad_flag,
            self.pad_size,
            self.enc_flag,
            self.enc_type,
            self.key_flag,
            self.key_type,
            self.hash_flag,
            self.hash_type,
        ]);
    }

    /// Parse the 16-byte wire form
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Self {
        let mut buf = &bytes[..];
        let payload_len = buf.get_u64();
        Self {
            payload_len,
            pad_flag: buf.get_u8(),
            pad_size: buf.get_u8(),
            enc_flag: buf.get_u8(),
            enc_type: buf.get_u8(),
            key_flag: buf.get_u8(),
            key_type: buf.get_u8(),
            hash_flag: buf.get_u8(),
            hash_type: buf.get_u8(),
        }
    }

    /// Known encryption type, if the encryption flag is set
    pub fn encryption(&self) -> Option<EncryptionType> {
        if self.enc_flag == 0 {
            return None;
        }
        EncryptionType::try_from(self.enc_type).ok()
    }

    /// Known key type, if the key flag is set
    pub fn key(&self) -> Option<KeyType> {
        if self.key_flag == 0 {
            return None;
        }
        KeyType::try_from(self.key_type).ok()
    }

    /// Pad size, if the pad flag is set
    pub fn padding(&self) -> Option<u8> {
        (self.pad_flag != 0).then_some(self.pad_size)
    }

    /// Mark the payload as encrypted with `kind`
    pub fn with_encryption(mut self, kind: EncryptionType) -> Self {
        self.enc_flag = 1;
        self.enc_type = kind as u8;
        self
    }

    /// Mark the payload as a key of `kind`
    pub fn with_key(mut self, kind: KeyType) -> Self {
        self.key_flag = 1;
        self.key_type = kind as u8;
        self
    }

    /// Record `pad_size` trailing pad bytes
    pub fn with_padding(mut self, pad_size: u8) -> Self {
        self.pad_flag = 1;
        self.pad_size = pad_size;
        self
    }
}
