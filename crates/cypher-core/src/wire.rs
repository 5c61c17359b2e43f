//! Length-prefixed fields
//!
//! Every field is an 8-byte big-endian length followed by that many bytes,
//! so several fields can share one buffer and be parsed back in order.

use bytes::{Buf, BufMut};

use crate::error::{CoreError, Result};

/// Size of the length prefix in bytes
pub const LEN_PREFIX_SIZE: usize = 8;

/// Encoded size of a field of `len` bytes
pub const fn encoded_len(len: usize) -> usize {
    LEN_PREFIX_SIZE + len
}

/// Append `field` with its length prefix.
pub fn put_field<B: BufMut>(buf: &mut B, field: &[u8]) {
    buf.put_u64(field.len() as u64);
    buf.put_slice(field);
}

/// Take one length-prefixed field off the front of `buf`.
pub fn take_field<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    if buf.remaining() < LEN_PREFIX_SIZE {
        return Err(CoreError::Truncated {
            needed: LEN_PREFIX_SIZE as u64,
            available: buf.remaining(),
        });
    }
    let len = buf.get_u64();
    let data: &'a [u8] = *buf;
    if len > data.len() as u64 {
        return Err(CoreError::Truncated { needed: len, available: data.len() });
    }
    let (field, rest) = data.split_at(len as usize);
    *buf = rest;
    Ok(field)
}

/// Take a bare big-endian `u64` off the front of `buf`.
pub fn take_u64(buf: &mut &[u8]) -> Result<u64> {
    if buf.remaining() < 8 {
        return Err(CoreError::Truncated { needed: 8, available: buf.remaining() });
    }
    Ok(buf.get_u64())
}
