// ABOUTME: Ties the encoder/writer and decoder/reader halves to one TCP connection (§4.7, §3)
// ABOUTME: Outbound dispatches synchronously per call; inbound runs its own spawned read loop

use std::sync::Arc;
use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{watch, Mutex};

use crate::buffer::BufferPool;
use crate::decoder::FrameDecoder;
use crate::encoder::FrameEncoder;
use crate::error::FrameError;
use crate::frame::Message;
use crate::reader::{run_read_loop, ReceiveCallback};
use crate::writer::{write_buffer, ConnectionState};

/// A no-op callback, used until a caller installs a real one.
struct NullCallback;
impl ReceiveCallback for NullCallback {
    fn receive(&self, _value: Message) {}
    fn exception(&self, _error: FrameError) {}
}

/// Owns the send side of a connection: a [`FrameEncoder`] and the write half it drains
/// framed buffers into. `send` serializes and writes one message to completion before
/// returning, matching the reference design's per-call `Request`/completion pairing
/// without needing a separate queue — callers wanting concurrent sends over the same
/// socket are responsible for not doing that (§ Open Questions, resolved: one logical
/// sender per connection).
pub struct OutboundPipeline {
    encoder: FrameEncoder,
    sink: Mutex<OwnedWriteHalf>,
    state: ConnectionState,
}

impl OutboundPipeline {
    pub fn new(pool: Arc<BufferPool>, sink: OwnedWriteHalf, state: ConnectionState) -> Self {
        OutboundPipeline {
            encoder: FrameEncoder::new(pool),
            sink: Mutex::new(sink),
            state,
        }
    }

    /// Frames `message` and drains it to the socket; equivalent to the reference design's
    /// per-type `send*` calls unified behind one entry point (§4.2/§4.3).
    pub async fn send(&self, message: &Message) -> Result<(), FrameError> {
        let buffer = self.encoder.encode(message).await?;
        let mut sink = self.sink.lock().await;
        write_buffer(&self.state, &mut *sink, buffer).await
    }
}

/// Owns the receive side: a spawned read loop feeding a replaceable [`ReceiveCallback`].
///
/// The callback is stored behind a [`watch`] channel so it can be swapped out at any time
/// without coordinating with the in-flight read loop (§4.7) — the loop simply reads the
/// latest value out of the channel before invoking it.
pub struct InboundPipeline {
    callback_tx: watch::Sender<Arc<dyn ReceiveCallback>>,
    state: ConnectionState,
    task: tokio::task::JoinHandle<()>,
}

impl InboundPipeline {
    pub fn spawn(
        source: OwnedReadHalf,
        pool: Arc<BufferPool>,
        decoder: FrameDecoder,
        keep_alive_timeout: Option<Duration>,
        state: ConnectionState,
    ) -> Self {
        let (callback_tx, callback_rx) = watch::channel(Arc::new(NullCallback) as Arc<dyn ReceiveCallback>);
        let dispatching = WatchedCallback { rx: callback_rx };
        let loop_state = state.clone();
        let task = tokio::spawn(async move {
            run_read_loop(source, loop_state, pool, decoder, keep_alive_timeout, Arc::new(dispatching)).await;
        });

        InboundPipeline { callback_tx, state, task }
    }

    /// Atomically replaces the callback the read loop delivers to from now on.
    pub fn set_receive_callback(&self, callback: Arc<dyn ReceiveCallback>) {
        let _ = self.callback_tx.send(callback);
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }
}

impl Drop for InboundPipeline {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Adapts a `watch::Receiver<Arc<dyn ReceiveCallback>>` into a single stable callback the
/// read loop can hold for its whole lifetime, always forwarding to whatever was installed
/// most recently.
struct WatchedCallback {
    rx: watch::Receiver<Arc<dyn ReceiveCallback>>,
}

impl ReceiveCallback for WatchedCallback {
    fn receive(&self, value: Message) {
        self.rx.borrow().receive(value);
    }
    fn exception(&self, error: FrameError) {
        self.rx.borrow().exception(error);
    }
}
