//! Blocking frame transfer over byte streams
//!
//! Reads accumulate exactly [`HEADER_SIZE`] bytes, decode the header to
//! learn the payload length, then accumulate exactly that many payload
//! bytes. Writes send the full header before the first payload byte. Both
//! directions loop over partial transfers; an interrupted call is retried
//! and a zero-length transfer means the peer is gone.

use std::io::{self, ErrorKind, Read, Write};

use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::error::{ProtocolError, Result};
use crate::frame::Frame;
use crate::header::{FrameHeader, HEADER_SIZE};

/// Where a [`FrameDecoder`] is in the current message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeState {
    /// Collecting header bytes
    AwaitHeader,
    /// Header decoded, collecting payload bytes
    AwaitPayload,
    /// Header and payload complete
    Complete,
}

impl DecodeState {
    /// Stage name used in error reports
    pub fn stage(self) -> &'static str {
        match self {
            DecodeState::AwaitHeader => "header",
            DecodeState::AwaitPayload => "payload",
            DecodeState::Complete => "complete",
        }
    }
}

/// Incremental decoder for one frame.
///
/// Callers either copy arbitrary chunks in with [`FrameDecoder::feed`], or
/// read straight into [`FrameDecoder::unfilled`] and report the count with
/// [`FrameDecoder::advance`]. Both paths produce the same frame however the
/// bytes are split.
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecodeState,
    max_payload_len: u64,
    header_buf: [u8; HEADER_SIZE],
    header: FrameHeader,
    payload: Vec<u8>,
    filled: usize,
}

impl FrameDecoder {
    /// Decoder enforcing the limits in `config`
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            state: DecodeState::AwaitHeader,
            max_payload_len: config.max_payload_len,
            header_buf: [0u8; HEADER_SIZE],
            header: FrameHeader::default(),
            payload: Vec::new(),
            filled: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Bytes collected so far in the current stage
    pub fn received(&self) -> u64 {
        self.filled as u64
    }

    /// Bytes the current stage needs in total
    pub fn expected(&self) -> u64 {
        match self.state {
            DecodeState::AwaitHeader => HEADER_SIZE as u64,
            DecodeState::AwaitPayload => self.header.payload_len,
            DecodeState::Complete => 0,
        }
    }

    /// The not yet filled part of the current stage's buffer
    pub fn unfilled(&mut self) -> &mut [u8] {
        match self.state {
            DecodeState::AwaitHeader => &mut self.header_buf[self.filled..],
            DecodeState::AwaitPayload => &mut self.payload[self.filled..],
            DecodeState::Complete => &mut [],
        }
    }

    fn unfilled_len(&self) -> usize {
        match self.state {
            DecodeState::AwaitHeader => HEADER_SIZE - self.filled,
            DecodeState::AwaitPayload => self.payload.len() - self.filled,
            DecodeState::Complete => 0,
        }
    }

    /// Record that `n` bytes were written into [`FrameDecoder::unfilled`].
    ///
    /// `n` may not exceed the length of that slice.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        let room = self.unfilled_len();
        if n > room {
            return Err(ProtocolError::Malformed(format!(
                "advanced {n} bytes with {room} left in the {} stage",
                self.state.stage()
            )));
        }
        self.filled += n;
        match self.state {
            DecodeState::AwaitHeader if self.filled == HEADER_SIZE => {
                self.header = FrameHeader::decode(&self.header_buf);
                self.begin_payload()
            }
            DecodeState::AwaitPayload if self.filled == self.payload.len() => {
                self.state = DecodeState::Complete;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn begin_payload(&mut self) -> Result<()> {
        let len = self.header.payload_len;
        if len > self.max_payload_len {
            return Err(ProtocolError::PayloadTooLarge {
                len,
                max: self.max_payload_len,
            });
        }
        let len = usize::try_from(len).map_err(|_| ProtocolError::PayloadTooLarge {
            len,
            max: usize::MAX as u64,
        })?;
        trace!(payload_len = len, "frame header decoded");

        self.payload = vec![0u8; len];
        self.filled = 0;
        self.state = if len == 0 {
            DecodeState::Complete
        } else {
            DecodeState::AwaitPayload
        };
        Ok(())
    }

    /// Copy as much of `bytes` as the current frame needs, returning how many
    /// were consumed. Bytes past the end of the frame are left to the caller.
    pub fn feed(&mut self, mut bytes: &[u8]) -> Result<usize> {
        let mut consumed = 0;
        while !bytes.is_empty() && self.state != DecodeState::Complete {
            let slot = self.unfilled();
            let n = slot.len().min(bytes.len());
            slot[..n].copy_from_slice(&bytes[..n]);
            self.advance(n)?;
            bytes = &bytes[n..];
            consumed += n;
        }
        Ok(consumed)
    }

    /// Apply the result of one read into [`FrameDecoder::unfilled`].
    ///
    /// A zero count means the peer closed the stream. An interrupted read
    /// changes nothing, so the caller reads again.
    pub fn on_read(&mut self, read: io::Result<usize>) -> Result<()> {
        match read {
            Ok(0) => Err(self.peer_closed()),
            Ok(n) => {
                trace!(stage = self.state.stage(), n, "partial read");
                self.advance(n)
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Error describing a stream that ended in the current stage
    pub fn peer_closed(&self) -> ProtocolError {
        ProtocolError::PeerClosed {
            stage: self.state.stage(),
            received: self.received(),
            expected: self.expected(),
        }
    }

    /// The finished frame, or `None` while bytes are still missing
    pub fn finish(self) -> Option<Frame> {
        (self.state == DecodeState::Complete).then(|| Frame::with_header(self.header, self.payload))
    }

    pub(crate) fn into_frame(self) -> Result<Frame> {
        let frame = self
            .finish()
            .ok_or_else(|| ProtocolError::Malformed("decoder stopped before completion".to_string()))?;
        debug!(payload_len = frame.payload().len(), "received frame");
        Ok(frame)
    }
}

/// Progress through one buffer being written
pub(crate) struct WriteProgress<'a> {
    buf: &'a [u8],
    written: usize,
    stage: &'static str,
}

impl<'a> WriteProgress<'a> {
    pub(crate) fn new(buf: &'a [u8], stage: &'static str) -> Self {
        Self { buf, written: 0, stage }
    }

    pub(crate) fn is_done(&self) -> bool {
        self.written == self.buf.len()
    }

    pub(crate) fn remaining(&self) -> &'a [u8] {
        &self.buf[self.written..]
    }

    /// Apply the result of one write of [`WriteProgress::remaining`].
    pub(crate) fn on_write(&mut self, result: io::Result<usize>) -> Result<()> {
        match result {
            Ok(0) => Err(ProtocolError::PeerClosed {
                stage: self.stage,
                received: self.written as u64,
                expected: self.buf.len() as u64,
            }),
            Ok(n) => {
                trace!(stage = self.stage, n, "partial write");
                self.written += n.min(self.buf.len() - self.written);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read one complete frame from `reader`.
pub fn read_frame<R: Read + ?Sized>(reader: &mut R, config: &CodecConfig) -> Result<Frame> {
    let mut decoder = FrameDecoder::new(config);
    while decoder.state() != DecodeState::Complete {
        let read = reader.read(decoder.unfilled());
        decoder.on_read(read)?;
    }
    decoder.into_frame()
}

fn write_full<W: Write + ?Sized>(writer: &mut W, buf: &[u8], stage: &'static str) -> Result<()> {
    let mut progress = WriteProgress::new(buf, stage);
    while !progress.is_done() {
        let result = writer.write(progress.remaining());
        progress.on_write(result)?;
    }
    Ok(())
}

/// Write `frame` to `writer`, header first, and flush.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, frame: &Frame) -> Result<()> {
    write_full(writer, &frame.header().encode(), "header")?;
    write_full(writer, frame.payload(), "payload")?;
    writer.flush()?;
    debug!(payload_len = frame.payload().len(), "sent frame");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{EncryptionType, KeyType};
    use std::io::Cursor;

    /// Hands out at most one byte per read call
    struct Trickle<R>(R);

    impl<R: Read> Read for Trickle<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(1);
            self.0.read(&mut buf[..len])
        }
    }

    /// Fails every other call with `Interrupted`
    struct Flaky<W> {
        inner: W,
        fail_next: bool,
    }

    impl<W: Write> Write for Flaky<W> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.fail_next = !self.fail_next;
            if self.fail_next {
                return Err(ErrorKind::Interrupted.into());
            }
            let len = buf.len().min(3);
            self.inner.write(&buf[..len])
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    /// Accepts a fixed number of bytes, then reports zero-length writes
    struct Closing {
        capacity: usize,
    }

    impl Write for Closing {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.capacity);
            self.capacity -= n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn sample_frame(len: usize) -> Frame {
        let header = FrameHeader {
            hash_flag: 9,
            hash_type: 10,
            ..FrameHeader::new(0)
                .with_encryption(EncryptionType::Rsa)
                .with_key(KeyType::Aes128)
                .with_padding(7)
        };
        Frame::with_header(header, (0..len).map(|i| i as u8).collect())
    }

    #[test]
    fn test_round_trip() {
        let frame = sample_frame(100);
        let mut wire = Vec::new();
        write_frame(&mut wire, &frame).unwrap();
        assert_eq!(wire.len(), 116);

        let decoded = read_frame(&mut Cursor::new(wire), &CodecConfig::default()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_single_byte_reads() {
        let frame = sample_frame(33);
        let bytes = frame.to_bytes();
        let decoded =
            read_frame(&mut Trickle(Cursor::new(bytes)), &CodecConfig::default()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_interrupted_writes_are_retried() {
        let frame = sample_frame(40);
        let mut flaky = Flaky { inner: Vec::new(), fail_next: false };
        write_frame(&mut flaky, &frame).unwrap();
        assert_eq!(flaky.inner, frame.to_bytes());
    }

    #[test]
    fn test_eof_in_header() {
        let bytes = sample_frame(4).to_bytes();
        let err = read_frame(&mut Cursor::new(&bytes[..10]), &CodecConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PeerClosed { stage: "header", received: 10, expected: 16 }
        ));
    }

    #[test]
    fn test_eof_in_payload() {
        let bytes = sample_frame(20).to_bytes();
        let err = read_frame(&mut Cursor::new(&bytes[..30]), &CodecConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PeerClosed { stage: "payload", received: 14, expected: 20 }
        ));
    }

    #[test]
    fn test_oversized_payload_is_refused() {
        let header = FrameHeader::new(u64::MAX).encode();
        let err = read_frame(&mut Cursor::new(header), &CodecConfig::with_max_payload_len(1024))
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PayloadTooLarge { len: u64::MAX, max: 1024 }
        ));
    }

    #[test]
    fn test_writer_closing() {
        let frame = sample_frame(10);
        let err = write_frame(&mut Closing { capacity: 20 }, &frame).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PeerClosed { stage: "payload", received: 4, expected: 10 }
        ));

        let err = write_frame(&mut Closing { capacity: 3 }, &frame).unwrap_err();
        assert!(matches!(err, ProtocolError::PeerClosed { stage: "header", .. }));
    }

    #[test]
    fn test_feed_leaves_trailing_bytes() {
        let mut bytes = sample_frame(5).to_bytes();
        bytes.extend_from_slice(b"next");

        let mut decoder = FrameDecoder::new(&CodecConfig::default());
        let used = decoder.feed(&bytes).unwrap();
        assert_eq!(used, 21);
        assert_eq!(decoder.state(), DecodeState::Complete);
        assert_eq!(decoder.finish().unwrap(), sample_frame(5));
    }

    #[test]
    fn test_feed_state_transitions() {
        let bytes = sample_frame(3).to_bytes();
        let mut decoder = FrameDecoder::new(&CodecConfig::default());
        assert_eq!(decoder.state(), DecodeState::AwaitHeader);

        decoder.feed(&bytes[..15]).unwrap();
        assert_eq!(decoder.state(), DecodeState::AwaitHeader);
        assert_eq!(decoder.received(), 15);

        decoder.feed(&bytes[15..17]).unwrap();
        assert_eq!(decoder.state(), DecodeState::AwaitPayload);
        assert_eq!(decoder.expected(), 3);

        decoder.feed(&bytes[17..]).unwrap();
        assert_eq!(decoder.state(), DecodeState::Complete);
    }

    #[test]
    fn test_advance_past_buffer_is_refused() {
        let mut decoder = FrameDecoder::new(&CodecConfig::default());
        assert!(matches!(decoder.advance(17), Err(ProtocolError::Malformed(_))));
        assert_eq!(decoder.state(), DecodeState::AwaitHeader);
        assert_eq!(decoder.unfilled().len(), HEADER_SIZE);

        let bytes = sample_frame(4).to_bytes();
        decoder.feed(&bytes[..HEADER_SIZE]).unwrap();
        assert_eq!(decoder.state(), DecodeState::AwaitPayload);
        assert!(matches!(decoder.advance(5), Err(ProtocolError::Malformed(_))));
        decoder.unfilled().copy_from_slice(&bytes[HEADER_SIZE..]);
        decoder.advance(4).unwrap();
        assert_eq!(decoder.finish().unwrap(), sample_frame(4));
    }

    #[test]
    fn test_on_read_outcomes() {
        let mut decoder = FrameDecoder::new(&CodecConfig::default());
        decoder.on_read(Err(ErrorKind::Interrupted.into())).unwrap();
        assert_eq!(decoder.received(), 0);

        decoder.on_read(Ok(6)).unwrap();
        assert_eq!(decoder.received(), 6);

        assert!(matches!(
            decoder.on_read(Ok(0)),
            Err(ProtocolError::PeerClosed { stage: "header", received: 6, expected: 16 })
        ));
        assert!(matches!(
            decoder.on_read(Err(ErrorKind::ConnectionReset.into())),
            Err(ProtocolError::Io(_))
        ));
    }

    #[test]
    fn test_empty_payload_completes_after_header() {
        let frame = Frame::new(Vec::new());
        let mut decoder = FrameDecoder::new(&CodecConfig::default());
        decoder.feed(&frame.to_bytes()).unwrap();
        assert_eq!(decoder.state(), DecodeState::Complete);
        assert!(decoder.finish().unwrap().payload().is_empty());
    }
}
