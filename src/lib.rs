//! A typed-message framing library for TCP connections.
//!
//! Seven message shapes (heartbeat, string, the numeric scalars, a UTF-16 code unit, and
//! a raw byte array) travel as self-delimiting frames: a marker byte, a big-endian length,
//! a type tag, then the payload. [`decoder::FrameDecoder`] resynchronizes on noise instead
//! of treating it as a fatal error; [`buffer::BufferPool`] keeps connections from competing
//! for allocations by handing out buffers from three fixed size classes.
//!
//! [`pipeline::InboundPipeline`] and [`pipeline::OutboundPipeline`] are the pieces most
//! applications reach for directly: pair one of each per accepted connection, install a
//! [`reader::ReceiveCallback`] on the inbound side, and call [`pipeline::OutboundPipeline::send`]
//! to write.

pub mod buffer;
pub mod config;
pub mod decoder;
pub mod dispatch;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod logsink;
pub mod pipeline;
pub mod reader;
pub mod server;
pub mod writer;

pub use buffer::{Buffer, BufferPool, SizeClass};
pub use config::Config;
pub use decoder::{DecodedFrame, FrameDecoder};
pub use error::{FrameError, Result};
pub use frame::{DataType, Message};
pub use logsink::ErrorSink;
pub use pipeline::{InboundPipeline, OutboundPipeline};
pub use reader::ReceiveCallback;
pub use writer::ConnectionState;
