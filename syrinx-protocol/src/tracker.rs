//! Tracker link wire format
//!
//! The optical gate tracker free-runs: once started it streams feedback
//! frames with the current gate coordinates and is kept alive by a
//! periodic two-byte poll. Frames are fixed length:
//! - SYNC (1 byte): 0x05
//! - PAYLOAD (8 bytes): x0, y0, x1, y1 as little-endian u16
//! - CHECKSUM (1 byte): mod-256 sum of SYNC and all payload bytes
//!
//! Outgoing commands carry no sync byte: start-tracking is an opcode
//! plus the gate coordinates and a checksum over opcode + payload;
//! stop-tracking and the keep-alive are bare opcode bytes sent twice.

use heapless::Vec;

/// Frame synchronization byte
pub const TRACKER_SYNC: u8 = 0x05;

/// Feedback payload size in bytes (four LE u16 fields)
pub const PAYLOAD_LEN: usize = 8;

/// Complete feedback frame size (SYNC + PAYLOAD + CHECKSUM)
pub const FRAME_LEN: usize = 1 + PAYLOAD_LEN + 1;

/// Start-tracking command opcode
pub const CMD_START_TRACKING: u8 = 0x01;

/// Stop-tracking command, written as a doubled bare opcode
pub const STOP_TRACKING: [u8; 2] = [0x02, 0x02];

/// Keep-alive poll, written every service tick
pub const KEEP_ALIVE: [u8; 2] = [0x04, 0x04];

/// Mod-256 sum over `bytes`, seeded with `seed`
pub fn sum8(seed: u8, bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(seed, |sum, &byte| sum.wrapping_add(byte))
}

/// Errors that can occur while decoding feedback frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackerError {
    /// Trailer byte does not match the accumulated sum
    ChecksumMismatch { expected: u8, got: u8 },
}

/// The rectangular gate region reported by (and requested of) the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackGate {
    pub x0: u16,
    pub y0: u16,
    pub x1: u16,
    pub y1: u16,
}

impl TrackGate {
    /// Serialize the coordinates in wire order (x0, y0, x1, y1, LE u16 each)
    pub fn to_le_bytes(self) -> [u8; PAYLOAD_LEN] {
        let mut bytes = [0u8; PAYLOAD_LEN];
        bytes[0..2].copy_from_slice(&self.x0.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.y0.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.x1.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.y1.to_le_bytes());
        bytes
    }

    /// Decode coordinates from an 8-byte wire payload
    pub fn from_le_bytes(bytes: &[u8; PAYLOAD_LEN]) -> Self {
        Self {
            x0: u16::from_le_bytes([bytes[0], bytes[1]]),
            y0: u16::from_le_bytes([bytes[2], bytes[3]]),
            x1: u16::from_le_bytes([bytes[4], bytes[5]]),
            y1: u16::from_le_bytes([bytes[6], bytes[7]]),
        }
    }
}

/// Encode a start-tracking command: opcode + coordinates + checksum
pub fn start_tracking_frame(gate: &TrackGate) -> [u8; FRAME_LEN] {
    let payload = gate.to_le_bytes();
    let mut frame = [0u8; FRAME_LEN];
    frame[0] = CMD_START_TRACKING;
    frame[1..1 + PAYLOAD_LEN].copy_from_slice(&payload);
    frame[FRAME_LEN - 1] = sum8(CMD_START_TRACKING, &payload);
    frame
}

/// State machine for decoding incoming feedback frames
#[derive(Debug, Clone)]
pub struct FeedbackParser {
    state: ParseState,
    buffer: Vec<u8, PAYLOAD_LEN>,
    received: usize,
    checksum: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Scanning for the sync byte
    AwaitingSync,
    /// Accumulating payload bytes
    ReadingPayload,
    /// Waiting for the checksum trailer
    ReadingTrailer,
}

impl Default for FeedbackParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackParser {
    /// Create a new parser, scanning for sync
    pub fn new() -> Self {
        Self {
            state: ParseState::AwaitingSync,
            buffer: Vec::new(),
            received: 0,
            checksum: 0,
        }
    }

    /// Reset to the post-construction scanning state
    pub fn reset(&mut self) {
        self.state = ParseState::AwaitingSync;
        self.buffer.clear();
        self.received = 0;
        self.checksum = 0;
    }

    /// Returns true when no frame is partially decoded
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::AwaitingSync && self.buffer.is_empty()
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(gate))` when a complete valid frame is decoded,
    /// `Ok(None)` when more bytes are needed, or `Err` on a checksum
    /// failure. State persists between calls, so a frame may arrive
    /// split across any number of service passes.
    pub fn feed(&mut self, byte: u8) -> Result<Option<TrackGate>, TrackerError> {
        match self.state {
            ParseState::AwaitingSync => {
                if byte == TRACKER_SYNC {
                    self.checksum = byte;
                    self.state = ParseState::ReadingPayload;
                }
                // Silently ignore non-sync bytes while scanning
                Ok(None)
            }
            ParseState::ReadingPayload => {
                self.checksum = self.checksum.wrapping_add(byte);
                // Bytes past the bound are counted but not stored
                let _ = self.buffer.push(byte);
                self.received += 1;
                if self.received == PAYLOAD_LEN {
                    self.state = ParseState::ReadingTrailer;
                }
                Ok(None)
            }
            ParseState::ReadingTrailer => {
                let expected = self.checksum;
                if byte != expected {
                    self.reset();
                    return Err(TrackerError::ChecksumMismatch {
                        expected,
                        got: byte,
                    });
                }

                let mut payload = [0u8; PAYLOAD_LEN];
                payload.copy_from_slice(&self.buffer);
                self.reset();
                Ok(Some(TrackGate::from_le_bytes(&payload)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_gate_frame() {
        // SYNC + eight zero payload bytes + checksum 0x05
        let frame = [0x05, 0, 0, 0, 0, 0, 0, 0, 0, 0x05];
        let mut parser = FeedbackParser::new();

        let mut decoded = None;
        for &byte in &frame {
            if let Some(gate) = parser.feed(byte).unwrap() {
                decoded = Some(gate);
            }
        }

        assert_eq!(
            decoded,
            Some(TrackGate {
                x0: 0,
                y0: 0,
                x1: 0,
                y1: 0
            })
        );
        assert!(parser.is_idle());
    }

    #[test]
    fn test_checksum_mismatch_resets() {
        let frame = [0x05, 0x01, 0, 0, 0, 0, 0, 0, 0, 0xFF];
        let mut parser = FeedbackParser::new();

        let mut result = Ok(None);
        for &byte in &frame {
            result = parser.feed(byte);
        }

        assert_eq!(
            result,
            Err(TrackerError::ChecksumMismatch {
                expected: 0x06,
                got: 0xFF
            })
        );
        assert!(parser.is_idle());
    }

    #[test]
    fn test_gate_roundtrip() {
        let gate = TrackGate {
            x0: 0x1234,
            y0: 0x0010,
            x1: 0xABCD,
            y1: 0xFFFF,
        };
        let payload = gate.to_le_bytes();
        assert_eq!(payload[0], 0x34); // x0 low byte first
        assert_eq!(payload[1], 0x12);
        assert_eq!(TrackGate::from_le_bytes(&payload), gate);
    }

    #[test]
    fn test_resync_after_garbage() {
        let gate = TrackGate {
            x0: 100,
            y0: 200,
            x1: 300,
            y1: 400,
        };
        let payload = gate.to_le_bytes();

        let mut stream: Vec<u8, 20> = Vec::new();
        stream.extend_from_slice(&[0xDE, 0xAD, 0x42]).unwrap();
        stream.push(TRACKER_SYNC).unwrap();
        stream.extend_from_slice(&payload).unwrap();
        stream.push(sum8(TRACKER_SYNC, &payload)).unwrap();

        let mut parser = FeedbackParser::new();
        let mut decoded = None;
        for &byte in &stream {
            if let Some(g) = parser.feed(byte).unwrap() {
                decoded = Some(g);
            }
        }
        assert_eq!(decoded, Some(gate));
    }

    #[test]
    fn test_frame_split_across_feeds() {
        // State must survive an arbitrary boundary mid-payload
        let frame = [0x05, 1, 0, 2, 0, 3, 0, 4, 0, 0x0F];
        let mut parser = FeedbackParser::new();

        for &byte in &frame[..4] {
            assert_eq!(parser.feed(byte).unwrap(), None);
        }
        let mut decoded = None;
        for &byte in &frame[4..] {
            if let Some(gate) = parser.feed(byte).unwrap() {
                decoded = Some(gate);
            }
        }

        assert_eq!(
            decoded,
            Some(TrackGate {
                x0: 1,
                y0: 2,
                x1: 3,
                y1: 4
            })
        );
    }

    #[test]
    fn test_start_tracking_encoding() {
        let gate = TrackGate {
            x0: 1,
            y0: 2,
            x1: 3,
            y1: 4,
        };
        let frame = start_tracking_frame(&gate);

        assert_eq!(frame[0], CMD_START_TRACKING);
        assert_eq!(&frame[1..9], &[1, 0, 2, 0, 3, 0, 4, 0]);
        // checksum over opcode + payload
        assert_eq!(frame[9], 0x01 + 1 + 2 + 3 + 4);
    }

    #[test]
    fn test_sum8_wraps() {
        assert_eq!(sum8(0xFF, &[0x02]), 0x01);
        assert_eq!(sum8(0, &[]), 0);
    }
}
