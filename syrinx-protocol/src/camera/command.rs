//! Outgoing command encoding
//!
//! Commands are four-letter ASCII mnemonics, optionally followed by one
//! space and an argument (a decimal zoom index or a layout/camera
//! word), wrapped in the same header/length/payload/end/footer envelope
//! the camera uses for its replies.

use core::fmt::Write;

use heapless::{String, Vec};

use super::frame::{CAMERA_FOOTER, CAMERA_HEADER, PAYLOAD_END};
use super::CAMERA_MAX_PAYLOAD;

/// Maximum complete frame size (HEADER + LENGTH + payload + END + FOOTER)
pub const MAX_FRAME_LEN: usize = 1 + 2 + CAMERA_MAX_PAYLOAD + 1 + 1;

/// Screen layout presets the camera offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout {
    Inspection,
    Security,
    Fullscreen,
    Pip,
}

impl Layout {
    /// The argument word the protocol uses for this layout
    pub fn as_word(self) -> &'static str {
        match self {
            Layout::Inspection => "INSPECTION",
            Layout::Security => "SECURITY",
            Layout::Fullscreen => "FULLSCREEN",
            Layout::Pip => "PIP",
        }
    }
}

/// The two imaging sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CameraSelect {
    Visible,
    Thermal,
}

impl CameraSelect {
    /// The argument word the protocol uses for this sensor
    pub fn as_word(self) -> &'static str {
        match self {
            CameraSelect::Visible => "VISIBLE",
            CameraSelect::Thermal => "THERMAL",
        }
    }
}

/// Commands the camera accepts.
///
/// Every command is answered; the link layer remembers which one was
/// sent so the next reply can be attributed (one in flight at a time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CameraCommand {
    /// Trigger a photo capture (OK / NOT_READY)
    CapturePhoto,
    /// Ask whether a capture is in progress (TRUE / FALSE)
    QueryCapturing,
    /// Start video recording (OK / NOT_READY)
    StartRecording,
    /// Stop video recording (OK / NOT_READY)
    StopRecording,
    /// Ask whether recording is in progress (TRUE / FALSE)
    QueryRecording,
    /// Read the visible sensor zoom (numeric answer)
    GetVisibleZoom,
    /// Set the visible sensor zoom by index (OK)
    SetVisibleZoom(u8),
    /// Read the thermal sensor zoom (numeric answer)
    GetThermalZoom,
    /// Set the thermal sensor zoom by index (OK)
    SetThermalZoom(u8),
    /// Handshake probe; the camera answers OK once it is up
    CheckConnection,
    /// Select a screen layout (OK)
    SetLayout(Layout),
    /// Select which sensor fills the main view (OK)
    SetMainCamera(CameraSelect),
}

impl CameraCommand {
    /// The four-letter mnemonic, without any argument
    pub fn mnemonic(self) -> &'static str {
        match self {
            CameraCommand::CapturePhoto => "CPTR",
            CameraCommand::QueryCapturing => "ICPT",
            CameraCommand::StartRecording => "RCRS",
            CameraCommand::StopRecording => "RCRF",
            CameraCommand::QueryRecording => "IRCR",
            CameraCommand::GetVisibleZoom => "GZVV",
            CameraCommand::SetVisibleZoom(_) => "SZVN",
            CameraCommand::GetThermalZoom => "GZTV",
            CameraCommand::SetThermalZoom(_) => "SZTN",
            CameraCommand::CheckConnection => "HIWS",
            CameraCommand::SetLayout(_) => "SLAY",
            CameraCommand::SetMainCamera(_) => "SMCA",
        }
    }

    /// Render the payload text: mnemonic plus any argument
    fn payload(self) -> String<CAMERA_MAX_PAYLOAD> {
        let mut text = String::new();
        // Cannot overflow: the longest payload is far below the bound
        let _ = match self {
            CameraCommand::SetVisibleZoom(index) | CameraCommand::SetThermalZoom(index) => {
                write!(text, "{} {}", self.mnemonic(), index)
            }
            CameraCommand::SetLayout(layout) => {
                write!(text, "{} {}", self.mnemonic(), layout.as_word())
            }
            CameraCommand::SetMainCamera(camera) => {
                write!(text, "{} {}", self.mnemonic(), camera.as_word())
            }
            _ => text.push_str(self.mnemonic()).map_err(|_| core::fmt::Error),
        };
        text
    }

    /// Encode the fully framed command.
    ///
    /// The declared length counts payload bytes only; the 0x0A end
    /// marker and 0x03 footer sit outside it.
    pub fn encode(self) -> Vec<u8, MAX_FRAME_LEN> {
        let payload = self.payload();
        let len = payload.len() as u16;

        let mut frame = Vec::new();
        // Cannot overflow: MAX_FRAME_LEN covers the largest payload
        let _ = frame.push(CAMERA_HEADER);
        let _ = frame.push(len as u8);
        let _ = frame.push((len >> 8) as u8);
        let _ = frame.extend_from_slice(payload.as_bytes());
        let _ = frame.push(PAYLOAD_END);
        let _ = frame.push(CAMERA_FOOTER);
        frame
    }
}
