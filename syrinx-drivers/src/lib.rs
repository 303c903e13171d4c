//! Payload Link Engines
//!
//! One engine per payload serial link, each owning its port, its wire
//! parser and the last-known device state:
//!
//! - [`TrackerLink`] - the optical gate tracker. Free-running: once
//!   started it streams coordinate feedback, and the engine polls it
//!   with a fixed keep-alive every service tick.
//! - [`CameraLink`] - the dual-sensor camera. Strictly request/response
//!   with a single-slot outstanding-request gate; the engine drives the
//!   connection handshake and startup configuration itself, then hands
//!   control to the consumer.
//!
//! Both engines expose one poll-driven `service` entry point. All state
//! transitions happen synchronously inside it; decoded results and
//! recovered faults are delivered through a caller-supplied event sink.
//! Nothing here retries on its own: a discarded frame is gone, and an
//! unanswered camera request holds the gate until a reply of any
//! classifiable shape arrives (the consumer can watch `is_busy` and
//! decide to reset the link).

#![no_std]
#![deny(unsafe_code)]

pub mod camera;
pub mod tracker;

pub use camera::{CameraConfig, CameraEvent, CameraLink, CameraSnapshot, LinkFault, Phase};
pub use tracker::{TrackerEvent, TrackerLink, TrackerSnapshot};

/// Why a command could not be issued.
///
/// Issuance failures are returned to the caller instead of flowing
/// through the event sink; nothing is written to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IssueError {
    /// A request is already outstanding on this link
    Busy,
    /// The transport cannot take the whole framed command
    Congestion,
    /// Recording is already in progress
    AlreadyRecording,
    /// No recording is in progress
    NotRecording,
}
