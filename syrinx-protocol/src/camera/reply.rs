//! Reply classification
//!
//! The camera answers every command with a short text payload. Four
//! literal families are recognized by their first character and then
//! verified against the exact expected string; anything else is treated
//! as a numeric zoom answer of the shape `"<index> <ratio>"` where the
//! index is a single ASCII digit and the ratio a decimal float.

use core::str;

/// Expected literal replies, line-feed terminated as the device sends them
pub const OK_REPLY: &[u8] = b"OK\n";
pub const NOT_READY_REPLY: &[u8] = b"NOT_READY\n";
pub const TRUE_REPLY: &[u8] = b"TRUE\n";
pub const FALSE_REPLY: &[u8] = b"FALSE\n";

/// A classified reply payload
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Command accepted
    Ok,
    /// Command refused, camera busy
    NotReady,
    /// Affirmative status answer
    True,
    /// Negative status answer
    False,
    /// Zoom answer: index plus the optical ratio at that index
    Numeric { index: u8, ratio: f32 },
}

/// The four literal reply families, used in classification errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyFamily {
    Ok,
    NotReady,
    True,
    False,
}

/// Errors that can occur while classifying a reply payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyError {
    /// First character matched a literal family but the body diverged
    ClassificationMismatch { expected: ReplyFamily },
    /// Payload was not a literal and does not follow the numeric shape.
    ///
    /// The index is carried when the leading digit was valid: the
    /// device firmware applies it before validating the ratio, and the
    /// dispatch layer preserves that salvage behavior.
    MalformedNumeric { index: Option<u8> },
}

impl ReplyFamily {
    fn expected(self) -> &'static [u8] {
        match self {
            ReplyFamily::Ok => OK_REPLY,
            ReplyFamily::NotReady => NOT_READY_REPLY,
            ReplyFamily::True => TRUE_REPLY,
            ReplyFamily::False => FALSE_REPLY,
        }
    }

    fn reply(self) -> Reply {
        match self {
            ReplyFamily::Ok => Reply::Ok,
            ReplyFamily::NotReady => Reply::NotReady,
            ReplyFamily::True => Reply::True,
            ReplyFamily::False => Reply::False,
        }
    }
}

/// Classify a decoded frame payload
pub fn classify(payload: &[u8]) -> Result<Reply, ReplyError> {
    let family = match payload.first() {
        Some(b'O') => Some(ReplyFamily::Ok),
        Some(b'N') => Some(ReplyFamily::NotReady),
        Some(b'T') => Some(ReplyFamily::True),
        Some(b'F') => Some(ReplyFamily::False),
        _ => None,
    };

    match family {
        Some(family) => {
            if payload == family.expected() {
                Ok(family.reply())
            } else {
                Err(ReplyError::ClassificationMismatch { expected: family })
            }
        }
        None => classify_numeric(payload),
    }
}

/// Parse a numeric zoom answer: digit, space, decimal ratio.
///
/// The exact shape is `index ' ' ratio` with a single-digit index and a
/// ratio starting with a digit; trailing whitespace is ignored. Any
/// deviation is an error, carrying the index when it alone was valid.
fn classify_numeric(payload: &[u8]) -> Result<Reply, ReplyError> {
    let index = match payload.first() {
        Some(&c) if c.is_ascii_digit() => c - b'0',
        _ => return Err(ReplyError::MalformedNumeric { index: None }),
    };

    if payload.get(1) != Some(&b' ') {
        return Err(ReplyError::MalformedNumeric { index: Some(index) });
    }
    match payload.get(2) {
        Some(c) if c.is_ascii_digit() => {}
        _ => return Err(ReplyError::MalformedNumeric { index: Some(index) }),
    }

    let ratio = str::from_utf8(&payload[2..])
        .ok()
        .and_then(|text| text.trim_end().parse::<f32>().ok());

    match ratio {
        Some(ratio) => Ok(Reply::Numeric { index, ratio }),
        None => Err(ReplyError::MalformedNumeric { index: Some(index) }),
    }
}
