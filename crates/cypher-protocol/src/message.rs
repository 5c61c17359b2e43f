//! Keys and ciphertext embedded in frames
//!
//! Three message kinds make up a transfer:
//!
//! - an RSA public key (`key_flag`, key type [`KeyType::RsaPublic`]), payload
//!   is the length-prefixed exponent and modulus
//! - an AES key sealed with RSA (key type [`KeyType::Aes128`], encryption
//!   [`EncryptionType::Rsa`]), payload is a big-endian `u64` count followed by
//!   one length-prefixed ciphertext integer per key byte
//! - AES data (encryption [`EncryptionType::Aes128`], pad flag set), payload
//!   is the padded plaintext encrypted block by block
//!
//! Each decoder checks the header tags before touching the payload.

use bytes::BufMut;
use num_bigint::BigUint;

use cypher_core::wire;
use cypher_crypto::aes::{Aes128, AesKey, KEY_SIZE};
use cypher_crypto::rsa::{decrypt_bytes, encrypt_bytes, RsaPrivateKey, RsaPublicKey};

use crate::error::{ProtocolError, Result};
use crate::frame::Frame;
use crate::header::{EncryptionType, FrameHeader, KeyType};
use crate::padding;

/// Kind of message a frame carries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// RSA public key
    PublicKey,
    /// RSA-sealed AES key
    SealedKey,
    /// AES-encrypted data
    Data,
}

impl MessageKind {
    /// Classify a header by its tags
    pub fn of(header: &FrameHeader) -> Option<Self> {
        match (header.key(), header.encryption()) {
            (Some(KeyType::RsaPublic), None) => Some(MessageKind::PublicKey),
            (Some(KeyType::Aes128), Some(EncryptionType::Rsa)) => Some(MessageKind::SealedKey),
            (None, Some(EncryptionType::Aes128)) if header.pad_flag != 0 => Some(MessageKind::Data),
            _ => None,
        }
    }
}

fn expect_kind(frame: &Frame, expected: MessageKind) -> Result<()> {
    let found = MessageKind::of(frame.header());
    if found != Some(expected) {
        return Err(ProtocolError::UnexpectedFrame(format!(
            "expected {expected:?} frame, header carries {found:?}"
        )));
    }
    Ok(())
}

/// Frame carrying an RSA public key
pub fn public_key_frame(key: &RsaPublicKey) -> Frame {
    let header = FrameHeader::default().with_key(KeyType::RsaPublic);
    Frame::with_header(header, key.to_bytes().into_vec())
}

/// Extract the public key from a [`public_key_frame`]
pub fn decode_public_key(frame: &Frame) -> Result<RsaPublicKey> {
    expect_kind(frame, MessageKind::PublicKey)?;
    Ok(RsaPublicKey::from_bytes(frame.payload())?)
}

/// Frame carrying `key` sealed byte by byte under `public`
pub fn sealed_key_frame(key: &AesKey, public: &RsaPublicKey) -> Frame {
    let sealed = encrypt_bytes(key.as_bytes(), public);
    let fields: Vec<Vec<u8>> = sealed.iter().map(BigUint::to_bytes_be).collect();

    let mut payload = Vec::with_capacity(8 + fields.iter().map(|f| wire::encoded_len(f.len())).sum::<usize>());
    payload.put_u64(fields.len() as u64);
    for field in &fields {
        wire::put_field(&mut payload, field);
    }

    let header = FrameHeader::default()
        .with_key(KeyType::Aes128)
        .with_encryption(EncryptionType::Rsa);
    Frame::with_header(header, payload)
}

/// Recover the AES key from a [`sealed_key_frame`]
pub fn open_sealed_key(frame: &Frame, private: &RsaPrivateKey) -> Result<AesKey> {
    expect_kind(frame, MessageKind::SealedKey)?;

    let mut cursor = frame.payload();
    let count = wire::take_u64(&mut cursor)?;
    if count != KEY_SIZE as u64 {
        return Err(ProtocolError::Malformed(format!(
            "sealed key holds {count} bytes, expected {KEY_SIZE}"
        )));
    }
    let mut sealed = Vec::with_capacity(KEY_SIZE);
    for _ in 0..KEY_SIZE {
        sealed.push(BigUint::from_bytes_be(wire::take_field(&mut cursor)?));
    }
    if !cursor.is_empty() {
        return Err(ProtocolError::Malformed(format!(
            "{} trailing bytes after sealed key",
            cursor.len()
        )));
    }

    let mut bytes = decrypt_bytes(&sealed, private);
    let key = AesKey::from_bytes(&bytes);
    bytes.fill(0);
    Ok(key?)
}

/// Pad `plaintext` and encrypt it into a data frame
pub fn data_frame(plaintext: &[u8], cipher: &Aes128) -> Result<Frame> {
    let (mut padded, pad_size) = padding::pad(plaintext);
    let sealed = cipher.encrypt_ecb(&padded);
    padded.fill(0);

    let header = FrameHeader::default()
        .with_encryption(EncryptionType::Aes128)
        .with_padding(pad_size);
    Ok(Frame::with_header(header, sealed?))
}

/// Decrypt a [`data_frame`] and strip its padding
pub fn open_data_frame(frame: &Frame, cipher: &Aes128) -> Result<Vec<u8>> {
    expect_kind(frame, MessageKind::Data)?;
    let mut padded = cipher.decrypt_ecb(frame.payload())?;
    let len = padding::unpad(&padded, frame.header().pad_size)?.len();
    padded.truncate(len);
    Ok(padded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cypher_crypto::rsa::RsaKeyPair;
    use cypher_crypto::CryptoError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn keypair() -> RsaKeyPair {
        let mut rng = StdRng::seed_from_u64(17);
        RsaKeyPair::generate_with(24, 20, &mut rng).unwrap()
    }

    #[test]
    fn test_public_key_frame() {
        let pair = keypair();
        let frame = public_key_frame(&pair.public);
        assert_eq!(MessageKind::of(frame.header()), Some(MessageKind::PublicKey));
        assert_eq!(decode_public_key(&frame).unwrap(), pair.public);
    }

    #[test]
    fn test_sealed_key_frame() {
        let pair = keypair();
        let key = AesKey::from_u128(0x0011_2233_4455_6677_8899_aabb_ccdd_eeff);
        let frame = sealed_key_frame(&key, &pair.public);
        assert_eq!(frame.header().enc_type, EncryptionType::Rsa as u8);
        assert_eq!(open_sealed_key(&frame, &pair.private).unwrap(), key);
    }

    #[test]
    fn test_sealed_key_wrong_count() {
        let pair = keypair();
        let mut payload = Vec::new();
        payload.put_u64(3);
        let header = FrameHeader::default()
            .with_key(KeyType::Aes128)
            .with_encryption(EncryptionType::Rsa);
        let frame = Frame::with_header(header, payload);
        assert!(matches!(
            open_sealed_key(&frame, &pair.private),
            Err(ProtocolError::Malformed(_))
        ));
    }

    #[test]
    fn test_data_frame() {
        let cipher = Aes128::new(&AesKey::from_u128(42));
        for len in [0usize, 1, 15, 16, 17, 100] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let frame = data_frame(&plaintext, &cipher).unwrap();
            assert_eq!(frame.payload().len(), padding::padded_len(len));
            assert_eq!(frame.header().padding(), Some(padding::pad_size(len)));
            assert_eq!(open_data_frame(&frame, &cipher).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_tag_mismatch() {
        let pair = keypair();
        let cipher = Aes128::new(&AesKey::from_u128(1));
        let data = data_frame(b"hello", &cipher).unwrap();
        let public = public_key_frame(&pair.public);

        assert!(matches!(decode_public_key(&data), Err(ProtocolError::UnexpectedFrame(_))));
        assert!(matches!(
            open_sealed_key(&public, &pair.private),
            Err(ProtocolError::UnexpectedFrame(_))
        ));
        assert!(matches!(open_data_frame(&public, &cipher), Err(ProtocolError::UnexpectedFrame(_))));
    }

    #[test]
    fn test_corrupt_data_frame() {
        let cipher = Aes128::new(&AesKey::from_u128(5));
        let frame = data_frame(b"0123456789", &cipher).unwrap();

        let mut header = *frame.header();
        header.pad_size = 0;
        let bad_pad = Frame::with_header(header, frame.payload().to_vec());
        assert!(matches!(open_data_frame(&bad_pad, &cipher), Err(ProtocolError::InvalidPadding(_))));

        let truncated = Frame::with_header(*frame.header(), frame.payload()[..10].to_vec());
        assert!(matches!(
            open_data_frame(&truncated, &cipher),
            Err(ProtocolError::Crypto(CryptoError::InvalidBlockLength { .. }))
        ));
    }
}
