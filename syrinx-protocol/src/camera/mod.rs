//! Camera link wire format
//!
//! The dual-sensor camera speaks a request/response protocol of short
//! ASCII mnemonics wrapped in a light binary envelope:
//! - HEADER (1 byte): 0x02
//! - LENGTH (2 bytes): little-endian payload byte count
//! - PAYLOAD (0-128 bytes): command mnemonic or reply text
//! - PAYLOAD END (1 byte): 0x0A line feed
//! - FOOTER (1 byte): 0x03
//!
//! Replies are one of four fixed literals (`OK`, `NOT_READY`, `TRUE`,
//! `FALSE`, each line-feed terminated) or a numeric zoom answer
//! (`"<index> <ratio>"`). See [`frame`] for the envelope decoder,
//! [`reply`] for classification and [`command`] for outgoing encoding.

pub mod command;
pub mod frame;
pub mod reply;

pub use command::{CameraCommand, CameraSelect, Layout, MAX_FRAME_LEN};
pub use frame::{FrameError, ReplyParser, CAMERA_FOOTER, CAMERA_HEADER, PAYLOAD_END};
pub use reply::{classify, Reply, ReplyError, ReplyFamily};

/// Maximum reply payload the link ever carries
pub const CAMERA_MAX_PAYLOAD: usize = 128;
