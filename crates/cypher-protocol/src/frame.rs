//! A header together with its payload

use crate::error::{ProtocolError, Result};
use crate::header::{FrameHeader, HEADER_SIZE};

/// One framed message. The header's `payload_len` always equals the
/// payload length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    payload: Vec<u8>,
}

impl Frame {
    /// Plain frame around `payload`
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            header: FrameHeader::new(payload.len() as u64),
            payload,
        }
    }

    /// Frame with caller-chosen tags; `payload_len` is taken from `payload`.
    pub fn with_header(mut header: FrameHeader, payload: Vec<u8>) -> Self {
        header.payload_len = payload.len() as u64;
        Self { header, payload }
    }

    /// Pair a decoded header with its payload, checking the declared length.
    pub fn from_parts(header: FrameHeader, payload: Vec<u8>) -> Result<Self> {
        if header.payload_len != payload.len() as u64 {
            return Err(ProtocolError::Malformed(format!(
                "header declares {} payload bytes, got {}",
                header.payload_len,
                payload.len()
            )));
        }
        Ok(Self { header, payload })
    }

    /// The header
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// The payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take the payload
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Header and payload in one contiguous buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        self.header.encode_into(&mut out);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Size on the wire
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}
