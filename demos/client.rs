// ABOUTME: Connects to a running server, sends a few typed messages, and prints the echoes
// ABOUTME: Demonstrates pairing an Outbound and Inbound Pipeline around one TcpStream

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use argh::FromArgs;
use fastsock::buffer::BufferPool;
use fastsock::decoder::FrameDecoder;
use fastsock::error::FrameError;
use fastsock::frame::Message;
use fastsock::pipeline::{InboundPipeline, OutboundPipeline};
use fastsock::reader::ReceiveCallback;
use fastsock::writer::ConnectionState;
use tokio::net::TcpStream;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Connects to a fastsock server and sends a handful of sample messages
#[derive(FromArgs)]
struct CliArgs {
    /// whether to enable debug logging
    #[argh(switch, short = 'd')]
    debugging: bool,

    /// the hostname or IP address of the server (default: localhost)
    #[argh(option)]
    host: Option<String>,

    /// the port to connect to (default: 9000)
    #[argh(option, short = 'p')]
    port: Option<u16>,
}

struct PrintingCallback;

impl ReceiveCallback for PrintingCallback {
    fn receive(&self, value: Message) {
        info!(?value, "received");
    }
    fn exception(&self, error: FrameError) {
        warn!(%error, "connection error");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = argh::from_env();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debugging { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let host = cli_args.host.unwrap_or_else(|| "localhost".to_owned());
    let port = cli_args.port.unwrap_or(9000);

    info!("Connecting to {host}:{port}");
    let stream = TcpStream::connect((host.as_str(), port)).await?;
    let (read_half, write_half) = stream.into_split();

    let pool = BufferPool::new(16);
    let state = ConnectionState::new();
    let outbound = OutboundPipeline::new(pool.clone(), write_half, state.clone());
    let inbound = InboundPipeline::spawn(read_half, pool, FrameDecoder::new(16 * 1024 * 1024), None, state);
    inbound.set_receive_callback(Arc::new(PrintingCallback));

    outbound.send(&Message::Heartbeat).await?;
    outbound.send(&Message::String("hello from the demo client".to_string())).await?;
    outbound.send(&Message::Int32(42)).await?;
    outbound.send(&Message::Float64(std::f64::consts::PI)).await?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(inbound);
    Ok(())
}
