//! Frame transfer over tokio streams
//!
//! Same wire behavior as [`crate::codec`], driven by the same
//! [`FrameDecoder`] state machine.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::codec::{DecodeState, FrameDecoder, WriteProgress};
use crate::config::CodecConfig;
use crate::error::Result;
use crate::frame::Frame;

/// Read one complete frame from `reader`.
pub async fn read_frame_async<R>(reader: &mut R, config: &CodecConfig) -> Result<Frame>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut decoder = FrameDecoder::new(config);
    while decoder.state() != DecodeState::Complete {
        let read = reader.read(decoder.unfilled()).await;
        decoder.on_read(read)?;
    }
    decoder.into_frame()
}

async fn write_full<W>(writer: &mut W, buf: &[u8], stage: &'static str) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut progress = WriteProgress::new(buf, stage);
    while !progress.is_done() {
        let result = writer.write(progress.remaining()).await;
        progress.on_write(result)?;
    }
    Ok(())
}

/// Write `frame` to `writer`, header first, and flush.
pub async fn write_frame_async<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    write_full(writer, &frame.header().encode(), "header").await?;
    write_full(writer, frame.payload(), "payload").await?;
    writer.flush().await?;
    debug!(payload_len = frame.payload().len(), "sent frame");
    Ok(())
}
