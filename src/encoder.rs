// ABOUTME: Serializes one typed Message into a single pooled buffer (§4.2)
// ABOUTME: Produces a ready-to-write Buffer; handing it to a socket is the write engine's job

use std::sync::Arc;

use bytes::BufMut;

use crate::buffer::{Buffer, BufferPool};
use crate::error::FrameError;
use crate::frame::{DATA_TYPE_SIZE, HEADER_SIZE, START_MARKER};
use crate::frame::Message;

/// Builds framed buffers for each of the seven message shapes.
///
/// Every operation follows the same four steps (§4.2): size the packet, acquire a buffer
/// from the pool, write the header and payload big-endian, and hand the buffer back ready
/// to send. A failure partway through releases the buffer by simply dropping it — see
/// [`crate::buffer::Buffer`]'s `Drop` impl.
pub struct FrameEncoder {
    pool: Arc<BufferPool>,
}

impl FrameEncoder {
    pub fn new(pool: Arc<BufferPool>) -> Self {
        FrameEncoder { pool }
    }

    /// Dispatches on the message's variant; the match is exhaustive; there is no
    /// "unsupported type" path left to reach at runtime (§9 redesign flag).
    pub async fn encode(&self, message: &Message) -> Result<Buffer, FrameError> {
        match message {
            Message::Heartbeat => self.send_heartbeat().await,
            Message::Int32(v) => self.send_int32(*v).await,
            Message::Float32(v) => self.send_float32(*v).await,
            Message::Float64(v) => self.send_float64(*v).await,
            Message::Char(v) => self.send_char(*v).await,
            Message::String(v) => self.send_string(v).await,
            Message::Bytes(v) => self.send_byte_array(v).await,
        }
    }

    pub async fn send_heartbeat(&self) -> Result<Buffer, FrameError> {
        let mut buf = self.start_frame(0, 0x00).await?;
        self.finish(&mut buf, 0);
        Ok(buf)
    }

    pub async fn send_int32(&self, value: i32) -> Result<Buffer, FrameError> {
        let mut buf = self.start_frame(4, 0x02).await?;
        buf.put_i32(value);
        self.finish(&mut buf, 4);
        Ok(buf)
    }

    pub async fn send_float32(&self, value: f32) -> Result<Buffer, FrameError> {
        let mut buf = self.start_frame(4, 0x03).await?;
        buf.put_f32(value);
        self.finish(&mut buf, 4);
        Ok(buf)
    }

    pub async fn send_float64(&self, value: f64) -> Result<Buffer, FrameError> {
        let mut buf = self.start_frame(8, 0x04).await?;
        buf.put_f64(value);
        self.finish(&mut buf, 8);
        Ok(buf)
    }

    pub async fn send_char(&self, value: u16) -> Result<Buffer, FrameError> {
        let mut buf = self.start_frame(2, 0x05).await?;
        buf.put_u16(value);
        self.finish(&mut buf, 2);
        Ok(buf)
    }

    pub async fn send_string(&self, value: &str) -> Result<Buffer, FrameError> {
        let len: u32 = value
            .len()
            .try_into()
            .map_err(|_| FrameError::EncoderInternal("string exceeds 4GiB length prefix".into()))?;
        let payload_size = 4 + value.len();
        let mut buf = self.start_frame(payload_size, 0x01).await?;
        buf.put_u32(len);
        buf.put_slice(value.as_bytes());
        self.finish(&mut buf, payload_size);
        Ok(buf)
    }

    pub async fn send_byte_array(&self, value: &[u8]) -> Result<Buffer, FrameError> {
        let len: u32 = value
            .len()
            .try_into()
            .map_err(|_| FrameError::EncoderInternal("byte array exceeds 4GiB length prefix".into()))?;
        let payload_size = 4 + value.len();
        let mut buf = self.start_frame(payload_size, 0x06).await?;
        buf.put_u32(len);
        buf.put_slice(value);
        self.finish(&mut buf, payload_size);
        Ok(buf)
    }

    /// Acquires a buffer sized for `payload_size` and writes START_MARKER, FRAME_LENGTH,
    /// and DATA_TYPE — everything but the payload itself (steps 1-3 of §4.2).
    async fn start_frame(&self, payload_size: usize, marker: u8) -> Result<Buffer, FrameError> {
        let total_packet_size = HEADER_SIZE + payload_size;
        let mut buf = self.pool.acquire(total_packet_size).await?;
        buf.put_u8(START_MARKER);
        let frame_length = DATA_TYPE_SIZE + payload_size as u32;
        buf.put_u32(frame_length);
        buf.put_u8(marker);
        Ok(buf)
    }

    /// Step 4: the buffer's write cursor already equals its readable limit (BytesMut has
    /// no separate flip step) — this only asserts that invariant held.
    fn finish(&self, buf: &mut Buffer, payload_size: usize) {
        debug_assert_eq!(buf.len(), HEADER_SIZE + payload_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::FrameDecoder;
    use crate::dispatch::dispatch;
    use bytes::BytesMut;

    fn encoder() -> FrameEncoder {
        FrameEncoder::new(BufferPool::new(4))
    }

    async fn round_trip(message: Message) -> Message {
        let enc = encoder();
        let buf = enc.encode(&message).await.unwrap();
        let mut wire = BytesMut::from(&buf[..]);
        let decoder = FrameDecoder::new(65536);
        let outcome = decoder.decode_from(&mut wire);
        assert_eq!(outcome.frames.len(), 1);
        dispatch(&outcome.frames[0]).unwrap()
    }

    #[tokio::test]
    async fn heartbeat_round_trips() {
        assert_eq!(round_trip(Message::Heartbeat).await, Message::Heartbeat);
    }

    #[tokio::test]
    async fn int32_round_trips_full_range() {
        for v in [0, 1, -1, i32::MIN, i32::MAX] {
            assert_eq!(round_trip(Message::Int32(v)).await, Message::Int32(v));
        }
    }

    #[tokio::test]
    async fn float_round_trips_including_non_finite() {
        for v in [0.0f64, -0.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            match round_trip(Message::Float64(v)).await {
                Message::Float64(out) => {
                    if v.is_nan() {
                        assert!(out.is_nan());
                    } else {
                        assert_eq!(out.to_bits(), v.to_bits());
                    }
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn char_round_trips_full_bmp_sample() {
        for v in [0x0000u16, 0x0041, 0xD7FF, 0xFFFF] {
            assert_eq!(round_trip(Message::Char(v)).await, Message::Char(v));
        }
    }

    #[tokio::test]
    async fn string_round_trips_empty_and_unicode() {
        assert_eq!(round_trip(Message::String(String::new())).await, Message::String(String::new()));
        let s = "héllo\u{0}wörld".to_string();
        assert_eq!(round_trip(Message::String(s.clone())).await, Message::String(s));
    }

    #[tokio::test]
    async fn byte_array_round_trips_empty_and_random() {
        assert_eq!(round_trip(Message::Bytes(vec![])).await, Message::Bytes(vec![]));
        let data: Vec<u8> = (0..=255u8).cycle().take(60_000).collect();
        assert_eq!(round_trip(Message::Bytes(data.clone())).await, Message::Bytes(data));
    }

    #[tokio::test]
    async fn encoding_is_deterministic() {
        let enc = encoder();
        let a = enc.encode(&Message::String("same".into())).await.unwrap();
        let b = enc.encode(&Message::String("same".into())).await.unwrap();
        assert_eq!(&a[..], &b[..]);
    }

    #[tokio::test]
    async fn frame_length_equals_one_plus_payload_size_and_starts_with_marker() {
        let enc = encoder();
        let buf = enc.encode(&Message::Int32(7)).await.unwrap();
        assert_eq!(buf[0], START_MARKER);
        let frame_length = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        assert_eq!(frame_length, 1 + 4);
    }
}
