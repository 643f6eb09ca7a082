// ABOUTME: Demonstration accept loop wiring a BufferPool and ErrorSink to every connection (§6)
// ABOUTME: Not a production deployment surface — exists so the crate can be exercised end to end

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::buffer::BufferPool;
use crate::config::Config;
use crate::decoder::FrameDecoder;
use crate::error::FrameError;
use crate::frame::Message;
use crate::logsink::ErrorSink;
use crate::pipeline::{InboundPipeline, OutboundPipeline};
use crate::reader::ReceiveCallback;
use crate::writer::ConnectionState;

const MAX_FRAME_LENGTH: u32 = 16 * 1024 * 1024;

/// Replies to every non-heartbeat message with itself; heartbeats are acknowledged by
/// simply not erroring (§6).
struct EchoCallback {
    outbound: Arc<OutboundPipeline>,
    sink: ErrorSink,
}

impl ReceiveCallback for EchoCallback {
    fn receive(&self, value: Message) {
        if matches!(value, Message::Heartbeat) {
            return;
        }
        let outbound = self.outbound.clone();
        tokio::spawn(async move {
            if let Err(error) = outbound.send(&value).await {
                tracing::warn!(%error, "echo reply failed");
            }
        });
    }

    fn exception(&self, error: FrameError) {
        self.sink.record(format!("connection error: {error}"));
        error!(%error, "connection raised an error");
    }
}

/// Binds `port`, loads [`Config`], and spawns an inbound/outbound pipeline pair per
/// accepted connection until the listener errors.
pub async fn run_server(port: u16) -> std::io::Result<()> {
    let config = Config::load();
    info!(server_name = %config.server_name, port, "starting");

    let pool = BufferPool::new(config.buffer_pools);
    let sink = ErrorSink::spawn("logs/error.log");
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;

    // The demo doesn't track individual connection lifetime; pipelines accumulate here so
    // their read-loop tasks (aborted on `Drop`) keep running for the life of the server.
    let mut pipelines = Vec::new();

    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "accepted connection");
        let pool = pool.clone();
        let sink = sink.clone();
        let keep_alive_timeout = config.keep_alive.then_some(config.keep_alive_timeout);

        let (read_half, write_half) = socket.into_split();
        let state = ConnectionState::new();
        let outbound = Arc::new(OutboundPipeline::new(pool.clone(), write_half, state.clone()));
        let inbound = InboundPipeline::spawn(read_half, pool, FrameDecoder::new(MAX_FRAME_LENGTH), keep_alive_timeout, state);
        inbound.set_receive_callback(Arc::new(EchoCallback { outbound, sink }));
        pipelines.push(inbound);
    }
}
