//! JSON-lines request loop
//!
//! Each input line is one [`Envelope<ClientToCanvas>`], at most
//! [`MAX_LINE_BYTES`] long. Requests are served
//! concurrently, so responses come back in completion order and carry the
//! request id for correlation.

use std::sync::Arc;

use place_ipc::{CanvasToClient, ClientToCanvas, Envelope, ErrorCode, IpcError, MAX_LINE_BYTES};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::AppError;
use crate::handler::Handler;

/// Id used for responses to lines that could not be decoded
pub const UNCORRELATED_ID: u64 = 0;

/// One input line as read off the wire
enum RawLine {
    /// Complete line within the size limit, newline stripped
    Line(Vec<u8>),
    /// Line longer than the limit; its bytes were skipped, not buffered
    TooLarge(usize),
}

/// Read the next line, buffering at most `limit` bytes of it.
///
/// Returns `None` at EOF.
async fn read_line<R>(input: &mut R, limit: usize) -> std::io::Result<Option<RawLine>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *input)
        .take(limit as u64 + 1)
        .read_until(b'\n', &mut buf)
        .await?;
    if read == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        return Ok(Some(RawLine::Line(buf)));
    }
    if buf.len() <= limit {
        // Last line without a trailing newline
        return Ok(Some(RawLine::Line(buf)));
    }

    let mut skipped = buf.len();
    loop {
        let (consumed, done) = {
            let chunk = input.fill_buf().await?;
            match chunk.iter().position(|b| *b == b'\n') {
                Some(newline) => (newline + 1, true),
                None => (chunk.len(), chunk.is_empty()),
            }
        };
        input.consume(consumed);
        skipped += consumed;
        if done {
            return Ok(Some(RawLine::TooLarge(skipped)));
        }
    }
}

/// Decode one raw line into a request, or the reason it was rejected
fn decode(raw: RawLine) -> Option<Result<Envelope<ClientToCanvas>, String>> {
    let bytes = match raw {
        RawLine::Line(bytes) => bytes,
        RawLine::TooLarge(len) => {
            return Some(Err(IpcError::TooLarge {
                len,
                limit: MAX_LINE_BYTES,
            }
            .to_string()));
        }
    };
    let line = match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => return Some(Err(format!("Request line is not valid UTF-8: {e}"))),
    };
    if line.trim().is_empty() {
        return None;
    }
    Some(Envelope::from_line(&line).map_err(|e| e.to_string()))
}

/// Serve requests from `input` until EOF, then return `output` once every
/// in-flight response has been written.
pub async fn serve<R, W>(handler: Arc<Handler>, mut input: R, output: W) -> Result<W, AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Envelope<CanvasToClient>>();

    let writer = tokio::spawn(async move {
        let mut output = output;
        while let Some(response) = rx.recv().await {
            let mut line = response.to_line()?;
            line.push('\n');
            output.write_all(line.as_bytes()).await?;
            output.flush().await?;
        }
        Ok::<W, AppError>(output)
    });

    let mut in_flight = JoinSet::new();
    let mut served = 0u64;

    while let Some(raw) = read_line(&mut input, MAX_LINE_BYTES).await? {
        let Some(decoded) = decode(raw) else {
            continue;
        };
        served += 1;

        // Send failures mean the writer already died; its error surfaces below.
        match decoded {
            Ok(request) => {
                let handler = handler.clone();
                let tx = tx.clone();
                in_flight.spawn(async move {
                    let response = handler.handle(request.message).await;
                    let _ = tx.send(Envelope::new(request.id, response));
                });
            }
            Err(e) => {
                warn!("Rejecting malformed request line: {}", e);
                let _ = tx.send(Envelope::new(
                    UNCORRELATED_ID,
                    CanvasToClient::error(ErrorCode::InvalidRequest, e),
                ));
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        joined?;
    }
    drop(tx);

    let output = writer.await??;
    info!("Input closed after {} requests", served);
    Ok(output)
}
