//! Optical gate tracker link
//!
//! The tracker free-runs: there is no request/response correlation.
//! After a start command it streams feedback frames with the gate it is
//! locked onto, and it expects a fixed two-byte keep-alive poll from us
//! every service tick whether or not anything was decoded.

use syrinx_hal::SerialPort;
use syrinx_protocol::tracker::{
    start_tracking_frame, FeedbackParser, TrackGate, TrackerError, KEEP_ALIVE, STOP_TRACKING,
};

use crate::IssueError;

/// Events delivered during a tracker service pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackerEvent {
    /// A valid feedback frame was decoded
    GateUpdate(TrackGate),
    /// A frame was discarded on its checksum trailer
    ChecksumMismatch { expected: u8, got: u8 },
    /// The port reported a fault; the pass was abandoned
    TransportFault,
    /// The transmit side could not take the keep-alive whole
    Congestion,
}

/// Copyable status snapshot for telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackerSnapshot {
    /// Last feedback decoded cleanly and no fault since
    pub valid: bool,
    /// A start command has been sent without a later stop
    pub tracking: bool,
    /// Last gate reported by the tracker
    pub gate: Option<TrackGate>,
}

/// The tracker link engine.
///
/// Owns the port and the feedback parser; call [`service`](Self::service)
/// periodically from the scheduler.
pub struct TrackerLink<P> {
    port: P,
    parser: FeedbackParser,
    gate: Option<TrackGate>,
    valid: bool,
    tracking: bool,
}

impl<P: SerialPort> TrackerLink<P> {
    /// Create a link engine owning `port`
    pub fn new(port: P) -> Self {
        Self {
            port,
            parser: FeedbackParser::new(),
            gate: None,
            valid: false,
            tracking: false,
        }
    }

    /// Drain and decode everything the port has, then send the keep-alive.
    ///
    /// The keep-alive goes out every tick regardless of decode outcome;
    /// it is the poll that keeps the device streaming, not a reply.
    pub fn service(&mut self, mut on_event: impl FnMut(TrackerEvent)) {
        self.read_incoming(&mut on_event);

        if self.port.tx_space() < KEEP_ALIVE.len() {
            on_event(TrackerEvent::Congestion);
        } else {
            self.port.write(&KEEP_ALIVE);
        }
    }

    fn read_incoming(&mut self, on_event: &mut impl FnMut(TrackerEvent)) {
        let available = match self.port.available() {
            Ok(n) => n,
            Err(_) => {
                self.valid = false;
                on_event(TrackerEvent::TransportFault);
                return;
            }
        };

        for _ in 0..available {
            let byte = match self.port.read_byte() {
                Some(byte) => byte,
                None => break,
            };

            match self.parser.feed(byte) {
                Ok(Some(gate)) => {
                    self.gate = Some(gate);
                    self.valid = true;
                    on_event(TrackerEvent::GateUpdate(gate));
                }
                Ok(None) => {}
                Err(TrackerError::ChecksumMismatch { expected, got }) => {
                    self.valid = false;
                    on_event(TrackerEvent::ChecksumMismatch { expected, got });
                }
            }
        }
    }

    /// Command the tracker to lock onto `gate`.
    ///
    /// Fails without writing anything if the transmit side cannot take
    /// the whole framed command.
    pub fn start_tracking(&mut self, gate: TrackGate) -> Result<(), IssueError> {
        let frame = start_tracking_frame(&gate);
        if self.port.tx_space() < frame.len() {
            return Err(IssueError::Congestion);
        }
        self.port.write(&frame);
        self.tracking = true;
        Ok(())
    }

    /// Command the tracker to drop its lock
    pub fn stop_tracking(&mut self) -> Result<(), IssueError> {
        if self.port.tx_space() < STOP_TRACKING.len() {
            return Err(IssueError::Congestion);
        }
        self.port.write(&STOP_TRACKING);
        self.tracking = false;
        Ok(())
    }

    /// Last gate reported by the tracker
    pub fn gate(&self) -> Option<TrackGate> {
        self.gate
    }

    /// True after a clean decode with no fault since
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// True between a start command and the matching stop
    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    /// Copyable status snapshot for telemetry
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            valid: self.valid,
            tracking: self.tracking,
            gate: self.gate,
        }
    }

    /// Get access to the underlying port
    pub fn port(&self) -> &P {
        &self.port
    }
}
