// ABOUTME: Per-connection read loop: pulls bytes, feeds the decoder, dispatches frames (§4.6)
// ABOUTME: Owns the residual BytesMut across reads; nothing here survives past one connection

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::buffer::BufferPool;
use crate::decoder::FrameDecoder;
use crate::dispatch::dispatch;
use crate::error::FrameError;
use crate::frame::{Message, LARGE};
use crate::writer::ConnectionState;

/// Receives decoded values or terminal errors for one connection.
///
/// Mirrors the reference design's single-callback-per-connection surface: `receive` fires
/// once per successfully decoded [`Message`], `exception` fires exactly once, for whichever
/// error ends the read loop.
pub trait ReceiveCallback: Send + Sync {
    fn receive(&self, value: Message);
    fn exception(&self, error: FrameError);
}

/// Runs until the connection ends, feeding every decoded message to `callback`.
///
/// A read returning `0` bytes, any I/O error, or a fatal decode error (oversize or
/// non-positive `FRAME_LENGTH`) all end the loop; bytes left over after the last complete
/// frame are simply dropped along with `residual` when this function returns, since
/// nothing outlives the connection they belong to (§4.6, resolving the reference design's
/// Open Question 2).
pub async fn run_read_loop<R>(
    mut source: R,
    state: ConnectionState,
    pool: Arc<BufferPool>,
    decoder: FrameDecoder,
    keep_alive_timeout: Option<Duration>,
    callback: Arc<dyn ReceiveCallback>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut residual = BytesMut::new();

    loop {
        if state.is_closed() {
            return;
        }

        let mut chunk = match pool.acquire(LARGE).await {
            Ok(buf) => buf,
            Err(error) => {
                callback.exception(error);
                state.close();
                return;
            }
        };
        chunk.resize(LARGE, 0);

        let read = match keep_alive_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, source.read(&mut chunk)).await {
                Ok(result) => result,
                Err(_) => {
                    state.close();
                    callback.exception(FrameError::Timeout);
                    return;
                }
            },
            None => source.read(&mut chunk).await,
        };

        let n = match read {
            Ok(0) => {
                state.close();
                if !residual.is_empty() {
                    debug!(bytes = residual.len(), "connection closed with a trailing partial frame");
                }
                return;
            }
            Ok(n) => n,
            Err(source_err) => {
                state.close();
                callback.exception(FrameError::classify_io(source_err));
                return;
            }
        };

        residual.extend_from_slice(&chunk[..n]);
        drop(chunk);

        let outcome = decoder.decode_from(&mut residual);
        for frame in &outcome.frames {
            match dispatch(frame) {
                Ok(message) => callback.receive(message),
                Err(error) => {
                    warn!(?error, "dropping malformed frame");
                    let fatal = error.is_fatal_to_connection();
                    callback.exception(error);
                    if fatal {
                        // A dispatch error is local to one frame by construction (§4.5),
                        // but if that ever changes this still closes the connection
                        // instead of silently treating a fatal error as recoverable.
                        state.close();
                        return;
                    }
                }
            }
        }
        if let Some(fatal) = outcome.fatal {
            debug_assert!(fatal.is_fatal_to_connection(), "decoder only ever reports fatal frame errors");
            state.close();
            callback.exception(fatal);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::START_MARKER;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<Message>>,
        errors: Mutex<Vec<String>>,
    }

    impl ReceiveCallback for Recorder {
        fn receive(&self, value: Message) {
            self.messages.lock().unwrap().push(value);
        }
        fn exception(&self, error: FrameError) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    fn frame_bytes(marker: u8, payload: &[u8]) -> Vec<u8> {
        let frame_length = 1 + payload.len() as u32;
        let mut out = vec![START_MARKER];
        out.extend_from_slice(&frame_length.to_be_bytes());
        out.push(marker);
        out.extend_from_slice(payload);
        out
    }

    #[tokio::test]
    async fn decodes_every_frame_from_a_closing_stream() {
        let mut wire = frame_bytes(0x00, &[]);
        wire.extend(frame_bytes(0x02, &[0, 0, 0, 9]));
        let source = std::io::Cursor::new(wire);

        let recorder = Arc::new(Recorder::default());
        let state = ConnectionState::new();
        run_read_loop(
            source,
            state.clone(),
            BufferPool::new(2),
            FrameDecoder::new(65536),
            None,
            recorder.clone(),
        )
        .await;

        let messages = recorder.messages.lock().unwrap();
        assert_eq!(&*messages, &[Message::Heartbeat, Message::Int32(9)]);
        assert!(state.is_closed());
    }

    #[tokio::test]
    async fn fatal_frame_error_stops_the_loop_after_reporting_it() {
        let mut wire = frame_bytes(0x00, &[]);
        wire.extend_from_slice(&[START_MARKER]);
        wire.extend_from_slice(&u32::MAX.to_be_bytes()); // oversize frame length
        let source = std::io::Cursor::new(wire);

        let recorder = Arc::new(Recorder::default());
        let state = ConnectionState::new();
        run_read_loop(
            source,
            state.clone(),
            BufferPool::new(2),
            FrameDecoder::new(1024),
            None,
            recorder.clone(),
        )
        .await;

        assert_eq!(recorder.messages.lock().unwrap().len(), 1);
        assert_eq!(recorder.errors.lock().unwrap().len(), 1);
        assert!(state.is_closed());
    }
}
