//! Length-prefixed framing over any `AsyncRead + AsyncWrite` stream.
//!
//! Every frame is `HEADER || PAYLOAD`, where `HEADER` is `HEADER_SIZE`
//! bytes of left-justified, space-padded ASCII decimal giving
//! `len(PAYLOAD)`. Reads proceed in chunks of up to `BUFFER_SIZE`; an empty
//! read signals the peer closed its write half.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::sleep;

use crate::environment::{BUFFER_SIZE, HEADER_SIZE, SEND_DELAY};
use crate::error::{BgpyError, Result};

/// Frames `payload` onto `stream`: a `HEADER_SIZE`-byte ASCII decimal length
/// header followed by the payload bytes, then a short delay to give a slow
/// receiver time to complete its read before the next frame follows. The
/// delay is part of the wire contract, not an incidental implementation
/// detail — removing it changes observable behavior for real clients.
pub async fn send_frame<W: AsyncWrite + Unpin>(stream: &mut W, payload: &[u8]) -> Result<()> {
    let header = format!("{:<width$}", payload.len(), width = HEADER_SIZE);
    debug_assert_eq!(header.len(), HEADER_SIZE);

    stream.write_all(header.as_bytes()).await?;
    stream.write_all(payload).await?;
    stream.flush().await?;

    sleep(SEND_DELAY).await;
    Ok(())
}

/// Reads one frame from `stream`, stripping the header. Returns `Ok(None)`
/// if the peer closed the connection before sending a complete frame
/// (including before sending any bytes at all) — the wire-level "no
/// message" case.
pub async fn recv_frame<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    let mut chunk = vec![0u8; BUFFER_SIZE];
    let mut msg_len: Option<usize> = None;

    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);

        if msg_len.is_none() && buf.len() >= HEADER_SIZE {
            let header = std::str::from_utf8(&buf[..HEADER_SIZE])
                .map_err(|_| BgpyError::Framing("non-UTF8 header".to_string()))?;
            let len = header
                .trim()
                .parse::<usize>()
                .map_err(|_| BgpyError::Framing(header.to_string()))?;
            msg_len = Some(len);
        }

        if let Some(len) = msg_len {
            if buf.len() - HEADER_SIZE == len {
                return Ok(Some(buf.split_off(HEADER_SIZE)));
            }
            if buf.len() - HEADER_SIZE > len {
                return Err(BgpyError::Framing(
                    "received more bytes than the frame header declared".to_string(),
                ));
            }
        }
    }
}
