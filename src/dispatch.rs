// ABOUTME: Turns a decoded (marker, payload) pair into a typed Message (§4.5)
// ABOUTME: Errors here are local to one frame and never desynchronize the byte stream

use bytes::Buf;

use crate::decoder::DecodedFrame;
use crate::error::FrameError;
use crate::frame::{DataType, Message};

/// Parses one decoded frame's payload according to its marker.
///
/// A malformed payload reports `Err` without affecting the stream: the decoder already
/// consumed exactly `payload_size` bytes before handing this frame over (§4.4 step 6), so
/// whatever this function does with those bytes cannot desynchronize the next frame.
pub fn dispatch(frame: &DecodedFrame) -> Result<Message, FrameError> {
    let data_type = DataType::try_from_primitive_or_violation(frame.marker)?;
    let mut payload = &frame.payload[..];

    match data_type {
        DataType::Heartbeat => Ok(Message::Heartbeat),
        DataType::Int32 => {
            read_exact(payload, data_type)?;
            Ok(Message::Int32(payload.get_i32()))
        }
        DataType::Float32 => {
            read_exact(payload, data_type)?;
            Ok(Message::Float32(payload.get_f32()))
        }
        DataType::Float64 => {
            read_exact(payload, data_type)?;
            Ok(Message::Float64(payload.get_f64()))
        }
        DataType::Char => {
            read_exact(payload, data_type)?;
            Ok(Message::Char(payload.get_u16()))
        }
        DataType::String => {
            let bytes = read_length_prefixed(&mut payload, data_type)?;
            let text = std::str::from_utf8(bytes)
                .map_err(|e| FrameError::protocol_violation_utf8(data_type, e))?;
            Ok(Message::String(text.to_owned()))
        }
        DataType::ByteArray => {
            let bytes = read_length_prefixed(&mut payload, data_type)?;
            Ok(Message::Bytes(bytes.to_vec()))
        }
    }
}

/// Validates a fixed-width payload against the wire width for `data_type`, read off
/// [`DataType::fixed_payload_len`] rather than a literal repeated at each call site.
fn read_exact(payload: &[u8], data_type: DataType) -> Result<(), FrameError> {
    let expected = data_type
        .fixed_payload_len()
        .expect("read_exact is only called for fixed-width data types");
    if payload.len() < expected {
        return Err(FrameError::ProtocolIncomplete {
            expected,
            actual: payload.len(),
        });
    }
    Ok(())
}

fn read_length_prefixed<'a>(payload: &mut &'a [u8], data_type: DataType) -> Result<&'a [u8], FrameError> {
    if payload.len() < 4 {
        return Err(FrameError::ProtocolIncomplete {
            expected: 4,
            actual: payload.len(),
        });
    }
    let declared = payload.get_u32() as usize;
    if declared > payload.len() {
        return Err(FrameError::protocol_violation_length(declared as u32, payload.len()));
    }
    let _ = data_type;
    let (bytes, rest) = payload.split_at(declared);
    *payload = rest;
    Ok(bytes)
}

impl DataType {
    fn try_from_primitive_or_violation(marker: u8) -> Result<Self, FrameError> {
        DataType::try_from(marker).map_err(|_| FrameError::protocol_violation_unknown_marker(marker))
    }
}
