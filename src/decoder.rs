// ABOUTME: Stateful decoder that resynchronizes on garbage and emits complete frames (§4.4)
// ABOUTME: Consumes from a caller-owned BytesMut; whatever it doesn't consume is the residual

use bytes::{Buf, Bytes, BytesMut};
use tracing::{trace, warn};

use crate::error::FrameError;
use crate::frame::{DATA_TYPE_SIZE, HEADER_SIZE, MAX_GARBAGE_TOLERANCE, START_MARKER};

/// One fully-framed payload pulled off the wire: the raw marker byte (validated later by
/// the [`crate::dispatch`] stage, not here) and a zero-copy view of its payload.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub marker: u8,
    pub payload: Bytes,
}

/// Result of one [`FrameDecoder::decode_from`] call.
///
/// `frames` were fully decoded and should be delivered in order regardless of `fatal`:
/// invariant 4 (§8) only promises the connection closes *before any further frame is
/// emitted*, not that already-decoded frames are discarded.
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    pub frames: Vec<DecodedFrame>,
    pub fatal: Option<FrameError>,
}

/// Stateful per-connection frame parser.
///
/// Holds no bytes of its own between calls — the caller (the read engine, §4.6) owns the
/// `BytesMut` and is responsible for carrying forward whatever `decode_from` leaves
/// unconsumed. This is the explicit resolution of the reference design's Open Question 2.
pub struct FrameDecoder {
    max_frame_length: u32,
}

enum ScanResult {
    Found,
    NeedMoreData,
}

impl FrameDecoder {
    pub fn new(max_frame_length: u32) -> Self {
        FrameDecoder { max_frame_length }
    }

    /// Consume as many complete frames from `src` as are available, leaving any trailing
    /// partial frame (and its START_MARKER) untouched for the next call.
    pub fn decode_from(&self, src: &mut BytesMut) -> DecodeOutcome {
        let mut outcome = DecodeOutcome::default();
        loop {
            match self.seek_start_marker(src) {
                ScanResult::NeedMoreData => break,
                ScanResult::Found => {}
            }

            // `src[0]` is now START_MARKER. Peek the header without consuming until we
            // know a full frame is present — this peek-then-commit is the "mark and
            // rewind" of the source design, made free by simply not advancing yet.
            if src.len() < 1 + 4 {
                break; // awaiting more data for FRAME_LENGTH
            }
            let frame_length = u32::from_be_bytes([src[1], src[2], src[3], src[4]]);

            if frame_length == 0 {
                warn!(frame_length, "non-positive FRAME_LENGTH; closing connection");
                outcome.fatal = Some(FrameError::FrameNonPositive(frame_length));
                src.clear();
                break;
            }
            if frame_length > self.max_frame_length {
                warn!(frame_length, max = self.max_frame_length, "oversize FRAME_LENGTH; closing connection");
                outcome.fatal = Some(FrameError::FrameOversize {
                    length: frame_length,
                    max: self.max_frame_length,
                });
                src.clear();
                break;
            }

            let payload_size = (frame_length - DATA_TYPE_SIZE) as usize;
            let total_frame_bytes = HEADER_SIZE + payload_size;
            if src.len() < total_frame_bytes {
                break; // awaiting more data for the payload
            }

            src.advance(5); // START_MARKER + FRAME_LENGTH
            let marker = src.get_u8();
            let payload = src.split_to(payload_size).freeze();
            trace!(marker, payload_size, "frame decoded");
            outcome.frames.push(DecodedFrame { marker, payload });
        }
        outcome
    }

    /// Scans at most one `MAX_GARBAGE_TOLERANCE`-sized window for `START_MARKER` and
    /// yields control back to the caller if it isn't found in that window, even if more
    /// bytes are already sitting in `src` beyond it (§4.4 step 1): exceeding the
    /// tolerance without finding a marker always returns control to the read engine,
    /// which continues the scan from a fresh tolerance budget on the next call.
    fn seek_start_marker(&self, src: &mut BytesMut) -> ScanResult {
        let scan_limit = src.len().min(MAX_GARBAGE_TOLERANCE);
        if scan_limit == 0 {
            return ScanResult::NeedMoreData;
        }
        match src[..scan_limit].iter().position(|&b| b == START_MARKER) {
            Some(pos) => {
                if pos > 0 {
                    trace!(discarded = pos, "skipped framing noise");
                }
                src.advance(pos);
                ScanResult::Found
            }
            None => {
                src.advance(scan_limit);
                ScanResult::NeedMoreData
            }
        }
    }
}
