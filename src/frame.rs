// ABOUTME: Wire format constants and the typed Message/DataType vocabulary shared by encoder and decoder
// ABOUTME: Encodes §3 of the framing spec: START_MARKER, FRAME_LENGTH, DATA_TYPE, payload shapes

use num_enum::TryFromPrimitive;

/// Leading byte of every frame; the decoder resynchronizes by scanning for this.
pub const START_MARKER: u8 = 0x01;

/// Bytes occupied by the `DATA_TYPE` field; `FRAME_LENGTH` always includes exactly this many
/// bytes plus the payload, per §3.
pub const DATA_TYPE_SIZE: u32 = 1;

/// Maximum non-marker bytes scanned in one resynchronization pass before yielding control
/// back to the caller (§4.4).
pub const MAX_GARBAGE_TOLERANCE: usize = 8192;

/// The three fixed buffer capacities; no other capacity is ever allocated (§3).
pub const SMALL: usize = 256;
pub const MEDIUM: usize = 4096;
pub const LARGE: usize = 65536;

/// Header bytes preceding the payload: START_MARKER(1) + FRAME_LENGTH(4) + DATA_TYPE(1).
pub const HEADER_SIZE: usize = 1 + 4 + 1;

/// Single-byte tag identifying the payload format, per §3's marker table.
#[derive(TryFromPrimitive, Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    Heartbeat = 0x00,
    String = 0x01,
    Int32 = 0x02,
    Float32 = 0x03,
    Float64 = 0x04,
    Char = 0x05,
    ByteArray = 0x06,
}

impl DataType {
    /// Payload size in bytes for fixed-width types; `None` for length-prefixed ones.
    pub const fn fixed_payload_len(self) -> Option<usize> {
        match self {
            DataType::Heartbeat => Some(0),
            DataType::Int32 => Some(4),
            DataType::Float32 => Some(4),
            DataType::Float64 => Some(8),
            DataType::Char => Some(2),
            DataType::String | DataType::ByteArray => None,
        }
    }
}

/// The closed set of values this library moves across a connection.
///
/// Outbound dispatch is a single exhaustive `match` over this enum (see
/// [`crate::encoder::FrameEncoder::send`]) rather than runtime type inspection — the
/// "unsupported message type" error of the reference design cannot occur here because
/// the compiler rejects any value that is not one of these seven shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Heartbeat,
    Int32(i32),
    Float32(f32),
    Float64(f64),
    /// A single UTF-16 code unit, per the wire format's compatibility constraint (§6).
    Char(u16),
    String(String),
    Bytes(Vec<u8>),
}

impl Message {
    pub fn data_type(&self) -> DataType {
        match self {
            Message::Heartbeat => DataType::Heartbeat,
            Message::Int32(_) => DataType::Int32,
            Message::Float32(_) => DataType::Float32,
            Message::Float64(_) => DataType::Float64,
            Message::Char(_) => DataType::Char,
            Message::String(_) => DataType::String,
            Message::Bytes(_) => DataType::ByteArray,
        }
    }
}
