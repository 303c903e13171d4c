//! Single-outstanding-request gate
//!
//! The camera answers exactly one command at a time and its replies
//! carry no correlation id, so the link remembers which command went
//! out and attributes the next classifiable reply to it. While a
//! request is outstanding all further issuance is rejected; there is no
//! timeout, so a lost reply holds the gate until the consumer resets
//! the link.

use syrinx_protocol::camera::CameraCommand;

/// Remembers the one command awaiting a reply
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestTracker {
    outstanding: Option<CameraCommand>,
}

impl RequestTracker {
    /// Create a tracker with no request outstanding
    pub fn new() -> Self {
        Self { outstanding: None }
    }

    /// True while a reply is awaited
    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    /// The command awaiting a reply, if any
    pub fn outstanding(&self) -> Option<CameraCommand> {
        self.outstanding
    }

    /// Record `command` as sent; the caller checks the gate first
    pub fn begin(&mut self, command: CameraCommand) {
        self.outstanding = Some(command);
    }

    /// Release the gate, returning the command the reply answers
    pub fn take(&mut self) -> Option<CameraCommand> {
        self.outstanding.take()
    }
}
