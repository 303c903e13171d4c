//! Payload Link Wire Protocols
//!
//! This crate defines the two wire formats spoken over the payload serial
//! links, one per module. Both decoders are byte-at-a-time state machines
//! that tolerate a read boundary falling anywhere in a frame and resync
//! on the next start byte after garbage or a failed frame.
//!
//! # Tracker link ([`tracker`])
//!
//! Fixed-length binary frames carrying gate coordinates:
//! ```text
//! ┌──────┬──────────────────────────────┬──────────┐
//! │ SYNC │ PAYLOAD                      │ CHECKSUM │
//! │ 0x05 │ x0,y0,x1,y1 as LE u16 (8B)   │ sum8     │
//! └──────┴──────────────────────────────┴──────────┘
//! ```
//! The checksum is the mod-256 sum of the sync byte and all payload
//! bytes.
//!
//! # Camera link ([`camera`])
//!
//! Variable-length, mostly-textual frames:
//! ```text
//! ┌────────┬────────┬────────┬─────────────┬──────┬────────┐
//! │ HEADER │ LEN LO │ LEN HI │ PAYLOAD     │ END  │ FOOTER │
//! │ 0x02   │   LE u16 length │ 0–128B text │ 0x0A │ 0x03   │
//! └────────┴────────┴────────┴─────────────┴──────┴────────┘
//! ```
//! The declared length counts payload bytes only. The camera protocol
//! carries no real integrity check (see [`camera::frame`]); replies are
//! short ASCII literals or a decimal zoom index.

#![no_std]
#![deny(unsafe_code)]

pub mod camera;
pub mod tracker;

pub use camera::{
    CameraCommand, CameraSelect, FrameError, Layout, Reply, ReplyError, ReplyParser,
    CAMERA_MAX_PAYLOAD,
};
pub use tracker::{FeedbackParser, TrackGate, TrackerError, TRACKER_SYNC};
