//! Camera frame envelope decoding
//!
//! Frame format:
//! - HEADER (1 byte): 0x02 synchronization byte
//! - LENGTH (2 bytes): little-endian payload byte count
//! - PAYLOAD (declared length bytes)
//! - PAYLOAD END (1 byte): 0x0A, consumed silently before the footer
//! - FOOTER (1 byte): 0x03
//!
//! The protocol has no real integrity check. The device documentation
//! calls the running payload counter a "checksum", but it only counts
//! bytes: it equals the declared length whenever the payload loop
//! terminates normally, so it can flag a truncated stream but never a
//! corrupted byte. The comparison is kept to match the wire behavior;
//! do not rely on it for corruption detection.

use heapless::Vec;

use super::CAMERA_MAX_PAYLOAD;

/// Frame synchronization byte
pub const CAMERA_HEADER: u8 = 0x02;

/// End-of-frame byte
pub const CAMERA_FOOTER: u8 = 0x03;

/// Line feed separating payload from footer
pub const PAYLOAD_END: u8 = 0x0A;

/// Errors that can occur while decoding the frame envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload byte count diverged from the declared length
    LengthMismatch { declared: u16, counted: u16 },
    /// Byte after the payload was neither 0x0A nor the footer
    FooterMismatch { got: u8 },
}

/// State machine for decoding incoming camera frames
#[derive(Debug, Clone)]
pub struct ReplyParser {
    state: ParseState,
    buffer: Vec<u8, CAMERA_MAX_PAYLOAD>,
    declared: u16,
    counted: u16,
    // The device's "checksum": a second per-byte counter (module docs)
    checksum: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Scanning for the header byte
    AwaitingSync,
    /// Got header, waiting for the low length byte
    ReadingLengthLow,
    /// Waiting for the high length byte
    ReadingLengthHigh,
    /// Accumulating payload bytes
    ReadingPayload,
    /// Waiting for the 0x03 footer (0x0A markers consumed silently)
    AwaitingFooter,
}

impl Default for ReplyParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyParser {
    /// Create a new parser, scanning for the header
    pub fn new() -> Self {
        Self {
            state: ParseState::AwaitingSync,
            buffer: Vec::new(),
            declared: 0,
            counted: 0,
            checksum: 0,
        }
    }

    /// Reset to the post-construction scanning state
    pub fn reset(&mut self) {
        self.state = ParseState::AwaitingSync;
        self.buffer.clear();
        self.declared = 0;
        self.counted = 0;
        self.checksum = 0;
    }

    /// Returns true when no frame is partially decoded
    pub fn is_idle(&self) -> bool {
        self.state == ParseState::AwaitingSync && self.buffer.is_empty()
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(payload))` when a complete frame is decoded,
    /// `Ok(None)` when more bytes are needed, or `Err` on a malformed
    /// frame. The payload buffer is handed out by value and cleared in
    /// every outcome, so one frame's bytes can never leak into the next.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Vec<u8, CAMERA_MAX_PAYLOAD>>, FrameError> {
        match self.state {
            ParseState::AwaitingSync => {
                if byte == CAMERA_HEADER {
                    self.counted = 0;
                    self.checksum = 0;
                    self.state = ParseState::ReadingLengthLow;
                }
                // Silently ignore non-header bytes while scanning
                Ok(None)
            }
            ParseState::ReadingLengthLow => {
                self.declared = u16::from(byte);
                self.state = ParseState::ReadingLengthHigh;
                Ok(None)
            }
            ParseState::ReadingLengthHigh => {
                self.declared |= u16::from(byte) << 8;
                self.buffer.clear();
                if self.declared == 0 {
                    self.state = ParseState::AwaitingFooter;
                } else {
                    self.state = ParseState::ReadingPayload;
                }
                Ok(None)
            }
            ParseState::ReadingPayload => {
                self.checksum += 1;
                // Bytes past the bound are counted but not stored
                let _ = self.buffer.push(byte);
                self.counted += 1;
                if self.counted == self.declared {
                    // The device protocol's "checksum" comparison; equal
                    // by construction whenever this loop terminates
                    // normally (see module docs)
                    if self.checksum != self.counted {
                        let err = FrameError::LengthMismatch {
                            declared: self.declared,
                            counted: self.checksum,
                        };
                        self.reset();
                        return Err(err);
                    }
                    self.state = ParseState::AwaitingFooter;
                }
                Ok(None)
            }
            ParseState::AwaitingFooter => {
                if byte == PAYLOAD_END {
                    // Line feed between payload and footer
                    return Ok(None);
                }
                if byte != CAMERA_FOOTER {
                    self.reset();
                    return Err(FrameError::FooterMismatch { got: byte });
                }

                let payload = self.buffer.clone();
                self.reset();
                Ok(Some(payload))
            }
        }
    }
}
