//! Block padding for AES payloads
//!
//! A buffer of `len` bytes is extended with `p = 16 - (len % 16)` zero bytes,
//! so `p` is always in `[1, 16]` and a full block is added when `len` is
//! already aligned. The pad size travels in the frame header, not in the
//! pad bytes themselves.

use crate::error::{ProtocolError, Result};

/// Padding block size
pub const PAD_BLOCK: usize = 16;

/// Length after padding `len` bytes
pub fn padded_len(len: usize) -> usize {
    (len / PAD_BLOCK + 1) * PAD_BLOCK
}

/// Number of pad bytes added to `len` bytes
pub fn pad_size(len: usize) -> u8 {
    (PAD_BLOCK - len % PAD_BLOCK) as u8
}

/// Copy `data` and append its padding, returning the pad size as well.
pub fn pad(data: &[u8]) -> (Vec<u8>, u8) {
    let size = pad_size(data.len());
    let mut out = Vec::with_capacity(padded_len(data.len()));
    out.extend_from_slice(data);
    out.resize(data.len() + size as usize, 0);
    (out, size)
}

/// Strip `pad_size` bytes from the end of `data`.
pub fn unpad(data: &[u8], pad_size: u8) -> Result<&[u8]> {
    let size = pad_size as usize;
    if !(1..=PAD_BLOCK).contains(&size) {
        return Err(ProtocolError::InvalidPadding(format!(
            "pad size {size} outside [1, {PAD_BLOCK}]"
        )));
    }
    if size > data.len() {
        return Err(ProtocolError::InvalidPadding(format!(
            "pad size {size} exceeds payload of {} bytes",
            data.len()
        )));
    }
    Ok(&data[..data.len() - size])
}
