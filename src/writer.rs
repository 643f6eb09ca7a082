// ABOUTME: Drains one framed buffer to a socket via a partial-write loop (§4.3)
// ABOUTME: Releases the buffer on every exit path by simply letting it drop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Buf;
use tokio::io::AsyncWriteExt;
use tracing::{trace, warn};

use crate::buffer::Buffer;
use crate::error::FrameError;

/// Shared closed-flag a connection's read and write halves both consult.
///
/// Grounded on the same idea as `tokio::sync::Notify`-backed shutdown signals in
/// connection-oriented servers: a cheap, lock-free way for one half of a duplex
/// connection to tell the other "don't bother starting, we're done" (§4.3 step 0).
#[derive(Clone, Default)]
pub struct ConnectionState {
    closed: Arc<AtomicBool>,
}

impl ConnectionState {
    pub fn new() -> Self {
        ConnectionState::default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Writes `buffer`'s contents to `sink` in full, looping over partial writes.
///
/// Consumes the buffer so its `Drop` impl releases it back to the pool on every return
/// path, success or failure, without any explicit cleanup code here.
pub async fn write_buffer<W>(state: &ConnectionState, sink: &mut W, mut buffer: Buffer) -> Result<(), FrameError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    if state.is_closed() {
        return Err(FrameError::ChannelClosed);
    }

    while buffer.has_remaining() {
        let n = match sink.write(buffer.chunk()).await {
            Ok(n) => n,
            Err(source) => {
                state.close();
                let error = FrameError::classify_io(source);
                warn!(%error, "write failed; closing connection");
                return Err(error);
            }
        };
        if n == 0 {
            state.close();
            return Err(FrameError::PeerClosed);
        }
        buffer.advance(n);
    }
    trace!("frame flushed");
    Ok(())
}
