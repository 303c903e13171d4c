//! Dual-sensor camera link
//!
//! Strictly request/response: every command is remembered in a
//! single-slot gate and the next classifiable reply is attributed to
//! it. The engine drives its own startup sequence through that same
//! gate - probe until the camera answers, then read the visible zoom
//! and push the configured layout and main sensor - after which it
//! issues nothing on its own and consumers drive.

pub mod request;

use syrinx_hal::SerialPort;
use syrinx_protocol::camera::{
    classify, CameraCommand, CameraSelect, FrameError, Layout, Reply, ReplyError, ReplyParser,
};

use crate::IssueError;
use request::RequestTracker;

/// Connection lifecycle of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Probing; the camera has not answered yet
    Connecting,
    /// Connected; reading zoom and pushing the startup appearance
    Configuring,
    /// Startup complete; the engine is passive
    Ready,
}

/// Startup configuration for the link
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraConfig {
    /// Base for the derived slew multiplier, divided by (zoom index + 1)
    pub speed_multiplier_base: f32,
    /// Layout pushed during the configuring phase
    pub startup_layout: Layout,
    /// Main sensor pushed during the configuring phase
    pub startup_main_camera: CameraSelect,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            speed_multiplier_base: 1.0,
            startup_layout: Layout::Fullscreen,
            startup_main_camera: CameraSelect::Visible,
        }
    }
}

/// Locally recovered faults surfaced through the event sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkFault {
    /// The port reported a fault; the pass was abandoned
    Transport,
    /// A frame was discarded by the envelope decoder
    Frame(FrameError),
    /// A framed payload failed classification
    Reply(ReplyError),
    /// A reply arrived with no request outstanding, or of a kind the
    /// outstanding request cannot receive
    UnexpectedReply,
    /// The transmit side could not take a whole framed command
    Congestion,
}

/// Events delivered during a camera service pass
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CameraEvent {
    /// The camera answered the connection probe
    Connected,
    /// Startup configuration finished; consumers drive from here
    Ready,
    /// Capture acknowledged complete
    PhotoTaken,
    /// Recording acknowledged started / stopped
    RecordingStarted,
    RecordingStopped,
    /// Answer to a capture status query
    CaptureStatus(bool),
    /// Answer to a recording status query
    RecordingStatus(bool),
    /// A set-zoom command was acknowledged
    ZoomSet { camera: CameraSelect, index: u8 },
    /// A get-zoom command was answered
    ZoomReported {
        camera: CameraSelect,
        index: u8,
        ratio: f32,
    },
    /// The derived slew multiplier changed with the visible zoom
    SpeedMultiplier(f32),
    /// A layout change was acknowledged
    LayoutSet(Layout),
    /// A main-sensor change was acknowledged
    MainCameraSet(CameraSelect),
    /// The camera answered NOT_READY to this command
    Refused(CameraCommand),
    /// A recovered fault; the link continues
    Fault(LinkFault),
}

/// Copyable device-state snapshot for telemetry.
///
/// Zoom, layout and sensor selection stay `None` until the camera has
/// reported or acknowledged a value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraSnapshot {
    pub connected: bool,
    pub capturing: bool,
    pub recording: bool,
    pub visible_zoom: Option<u8>,
    pub thermal_zoom: Option<u8>,
    pub layout: Option<Layout>,
    pub main_camera: Option<CameraSelect>,
    pub speed_multiplier: f32,
}

/// The camera link engine.
///
/// Owns the port, the reply parser, the request gate and the device
/// state; call [`service`](Self::service) periodically from the
/// scheduler. Device state is mutated only by reply dispatch.
pub struct CameraLink<P> {
    port: P,
    parser: ReplyParser,
    requests: RequestTracker,
    config: CameraConfig,
    phase: Phase,
    state: CameraSnapshot,
}

impl<P: SerialPort> CameraLink<P> {
    /// Create a link engine owning `port`
    pub fn new(port: P, config: CameraConfig) -> Self {
        let state = CameraSnapshot {
            connected: false,
            capturing: false,
            recording: false,
            visible_zoom: None,
            thermal_zoom: None,
            layout: None,
            main_camera: None,
            speed_multiplier: config.speed_multiplier_base,
        };
        Self {
            port,
            parser: ReplyParser::new(),
            requests: RequestTracker::new(),
            config,
            phase: Phase::Connecting,
            state,
        }
    }

    /// Drain and dispatch everything the port has, then advance the
    /// startup phase if the gate is free.
    ///
    /// A transport fault abandons the whole pass; decoder and request
    /// state are untouched and the next pass picks up where this one
    /// left off.
    pub fn service(&mut self, mut on_event: impl FnMut(CameraEvent)) {
        if !self.read_incoming(&mut on_event) {
            return;
        }
        self.drive_phase(&mut on_event);
    }

    fn read_incoming(&mut self, on_event: &mut impl FnMut(CameraEvent)) -> bool {
        let available = match self.port.available() {
            Ok(n) => n,
            Err(_) => {
                on_event(CameraEvent::Fault(LinkFault::Transport));
                return false;
            }
        };

        for _ in 0..available {
            let byte = match self.port.read_byte() {
                Some(byte) => byte,
                None => break,
            };

            match self.parser.feed(byte) {
                Ok(Some(payload)) => self.dispatch(&payload, on_event),
                Ok(None) => {}
                // Frame-level errors never touch the request gate
                Err(error) => on_event(CameraEvent::Fault(LinkFault::Frame(error))),
            }
        }
        true
    }

    /// Attribute a framed payload to the outstanding request.
    ///
    /// Reaching classification releases the gate whatever the outcome;
    /// only a matched reply kind mutates device state.
    fn dispatch(&mut self, payload: &[u8], on_event: &mut impl FnMut(CameraEvent)) {
        let outstanding = self.requests.take();

        match classify(payload) {
            Ok(reply) => match outstanding {
                Some(command) => self.dispatch_reply(reply, command, on_event),
                None => on_event(CameraEvent::Fault(LinkFault::UnexpectedReply)),
            },
            Err(error) => {
                // A valid leading digit still lands the zoom index even
                // when the rest of the numeric answer is broken
                if let ReplyError::MalformedNumeric { index: Some(index) } = error {
                    match outstanding {
                        Some(CameraCommand::GetVisibleZoom) => {
                            self.apply_zoom(CameraSelect::Visible, index, on_event);
                        }
                        Some(CameraCommand::GetThermalZoom) => {
                            self.apply_zoom(CameraSelect::Thermal, index, on_event);
                        }
                        _ => {}
                    }
                }
                on_event(CameraEvent::Fault(LinkFault::Reply(error)));
            }
        }
    }

    fn dispatch_reply(
        &mut self,
        reply: Reply,
        command: CameraCommand,
        on_event: &mut impl FnMut(CameraEvent),
    ) {
        use CameraCommand::*;

        match (reply, command) {
            (Reply::Ok, CapturePhoto) => {
                self.state.capturing = false;
                on_event(CameraEvent::PhotoTaken);
            }
            (Reply::Ok, StartRecording) => {
                self.state.recording = true;
                on_event(CameraEvent::RecordingStarted);
            }
            (Reply::Ok, StopRecording) => {
                self.state.recording = false;
                on_event(CameraEvent::RecordingStopped);
            }
            (Reply::Ok, SetVisibleZoom(index)) => {
                self.state.visible_zoom = Some(index);
                on_event(CameraEvent::ZoomSet {
                    camera: CameraSelect::Visible,
                    index,
                });
            }
            (Reply::Ok, SetThermalZoom(index)) => {
                self.state.thermal_zoom = Some(index);
                on_event(CameraEvent::ZoomSet {
                    camera: CameraSelect::Thermal,
                    index,
                });
            }
            (Reply::Ok, CheckConnection) => {
                self.state.connected = true;
                if self.phase == Phase::Connecting {
                    self.phase = Phase::Configuring;
                }
                on_event(CameraEvent::Connected);
            }
            (Reply::Ok, SetLayout(layout)) => {
                self.state.layout = Some(layout);
                on_event(CameraEvent::LayoutSet(layout));
            }
            (Reply::Ok, SetMainCamera(camera)) => {
                self.state.main_camera = Some(camera);
                on_event(CameraEvent::MainCameraSet(camera));
            }
            (Reply::NotReady, CapturePhoto | StartRecording | StopRecording) => {
                // Refusal mutates nothing; an optimistic capturing flag
                // stays set until a status query refreshes it
                on_event(CameraEvent::Refused(command));
            }
            (Reply::True, QueryCapturing) | (Reply::False, QueryCapturing) => {
                let capturing = reply == Reply::True;
                self.state.capturing = capturing;
                on_event(CameraEvent::CaptureStatus(capturing));
            }
            (Reply::True, QueryRecording) | (Reply::False, QueryRecording) => {
                let recording = reply == Reply::True;
                self.state.recording = recording;
                on_event(CameraEvent::RecordingStatus(recording));
            }
            (Reply::Numeric { index, ratio }, GetVisibleZoom) => {
                self.apply_zoom(CameraSelect::Visible, index, on_event);
                on_event(CameraEvent::ZoomReported {
                    camera: CameraSelect::Visible,
                    index,
                    ratio,
                });
            }
            (Reply::Numeric { index, ratio }, GetThermalZoom) => {
                self.apply_zoom(CameraSelect::Thermal, index, on_event);
                on_event(CameraEvent::ZoomReported {
                    camera: CameraSelect::Thermal,
                    index,
                    ratio,
                });
            }
            _ => on_event(CameraEvent::Fault(LinkFault::UnexpectedReply)),
        }
    }

    /// Store a reported or salvaged zoom index. A visible reading also
    /// recomputes the slew multiplier; set-zoom acknowledgements do not.
    fn apply_zoom(
        &mut self,
        camera: CameraSelect,
        index: u8,
        on_event: &mut impl FnMut(CameraEvent),
    ) {
        match camera {
            CameraSelect::Visible => {
                self.state.visible_zoom = Some(index);
                let multiplier = self.config.speed_multiplier_base / (f32::from(index) + 1.0);
                self.state.speed_multiplier = multiplier;
                on_event(CameraEvent::SpeedMultiplier(multiplier));
            }
            CameraSelect::Thermal => {
                self.state.thermal_zoom = Some(index);
            }
        }
    }

    /// Issue the next startup command whenever the gate is free
    fn drive_phase(&mut self, on_event: &mut impl FnMut(CameraEvent)) {
        match self.phase {
            Phase::Connecting => {
                if !self.requests.is_busy() {
                    self.issue_internal(CameraCommand::CheckConnection, on_event);
                }
            }
            Phase::Configuring => {
                if self.configured() {
                    self.phase = Phase::Ready;
                    on_event(CameraEvent::Ready);
                } else if !self.requests.is_busy() {
                    let next = if self.state.visible_zoom.is_none() {
                        CameraCommand::GetVisibleZoom
                    } else if self.state.layout.is_none() {
                        CameraCommand::SetLayout(self.config.startup_layout)
                    } else {
                        CameraCommand::SetMainCamera(self.config.startup_main_camera)
                    };
                    self.issue_internal(next, on_event);
                }
            }
            Phase::Ready => {}
        }
    }

    fn configured(&self) -> bool {
        self.state.visible_zoom.is_some()
            && self.state.layout.is_some()
            && self.state.main_camera.is_some()
    }

    fn issue_internal(&mut self, command: CameraCommand, on_event: &mut impl FnMut(CameraEvent)) {
        if self.send(command).is_err() {
            // Gate is known free here, so the only failure is congestion
            on_event(CameraEvent::Fault(LinkFault::Congestion));
        }
    }

    /// Frame `command`, check capacity, write it whole and arm the gate
    fn send(&mut self, command: CameraCommand) -> Result<(), IssueError> {
        if self.requests.is_busy() {
            return Err(IssueError::Busy);
        }
        let frame = command.encode();
        if self.port.tx_space() < frame.len() {
            return Err(IssueError::Congestion);
        }
        self.port.write(&frame);
        self.requests.begin(command);
        Ok(())
    }

    /// Trigger a photo capture.
    ///
    /// The capturing flag is set optimistically at issuance; the OK
    /// reply clears it and a NOT_READY leaves it for a status query.
    pub fn capture_photo(&mut self) -> Result<(), IssueError> {
        self.send(CameraCommand::CapturePhoto)?;
        self.state.capturing = true;
        Ok(())
    }

    /// Ask whether a capture is in progress
    pub fn query_capturing(&mut self) -> Result<(), IssueError> {
        self.send(CameraCommand::QueryCapturing)
    }

    /// Start video recording
    pub fn start_recording(&mut self) -> Result<(), IssueError> {
        if self.requests.is_busy() {
            return Err(IssueError::Busy);
        }
        if self.state.recording {
            return Err(IssueError::AlreadyRecording);
        }
        self.send(CameraCommand::StartRecording)
    }

    /// Stop video recording
    pub fn stop_recording(&mut self) -> Result<(), IssueError> {
        if self.requests.is_busy() {
            return Err(IssueError::Busy);
        }
        if !self.state.recording {
            return Err(IssueError::NotRecording);
        }
        self.send(CameraCommand::StopRecording)
    }

    /// Ask whether recording is in progress
    pub fn query_recording(&mut self) -> Result<(), IssueError> {
        self.send(CameraCommand::QueryRecording)
    }

    /// Read the visible sensor zoom index and ratio
    pub fn get_visible_zoom(&mut self) -> Result<(), IssueError> {
        self.send(CameraCommand::GetVisibleZoom)
    }

    /// Set the visible sensor zoom by index
    pub fn set_visible_zoom(&mut self, index: u8) -> Result<(), IssueError> {
        self.send(CameraCommand::SetVisibleZoom(index))
    }

    /// Read the thermal sensor zoom index and ratio
    pub fn get_thermal_zoom(&mut self) -> Result<(), IssueError> {
        self.send(CameraCommand::GetThermalZoom)
    }

    /// Set the thermal sensor zoom by index
    pub fn set_thermal_zoom(&mut self, index: u8) -> Result<(), IssueError> {
        self.send(CameraCommand::SetThermalZoom(index))
    }

    /// Select a screen layout
    pub fn set_layout(&mut self, layout: Layout) -> Result<(), IssueError> {
        self.send(CameraCommand::SetLayout(layout))
    }

    /// Select which sensor fills the main view
    pub fn set_main_camera(&mut self, camera: CameraSelect) -> Result<(), IssueError> {
        self.send(CameraCommand::SetMainCamera(camera))
    }

    /// Probe the camera explicitly (the connecting phase does this on
    /// its own)
    pub fn check_connection(&mut self) -> Result<(), IssueError> {
        self.send(CameraCommand::CheckConnection)
    }

    /// Current connection lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while a request is outstanding.
    ///
    /// There is no timeout: a lost reply keeps this true forever, and a
    /// supervisor watching it is the intended recovery path.
    pub fn is_busy(&self) -> bool {
        self.requests.is_busy()
    }

    /// The command awaiting a reply, if any
    pub fn outstanding(&self) -> Option<CameraCommand> {
        self.requests.outstanding()
    }

    /// True once the camera has answered the connection probe
    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// Last-known capture state
    pub fn is_capturing(&self) -> bool {
        self.state.capturing
    }

    /// Last-known recording state
    pub fn is_recording(&self) -> bool {
        self.state.recording
    }

    /// Last-known visible sensor zoom index
    pub fn visible_zoom(&self) -> Option<u8> {
        self.state.visible_zoom
    }

    /// Last-known thermal sensor zoom index
    pub fn thermal_zoom(&self) -> Option<u8> {
        self.state.thermal_zoom
    }

    /// Last acknowledged layout
    pub fn layout(&self) -> Option<Layout> {
        self.state.layout
    }

    /// Last acknowledged main sensor
    pub fn main_camera(&self) -> Option<CameraSelect> {
        self.state.main_camera
    }

    /// Derived slew multiplier, base / (visible zoom index + 1)
    pub fn speed_multiplier(&self) -> f32 {
        self.state.speed_multiplier
    }

    /// Copyable device-state snapshot for telemetry
    pub fn snapshot(&self) -> CameraSnapshot {
        self.state
    }

    /// Get access to the underlying port
    pub fn port(&self) -> &P {
        &self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::{Deque, Vec};

    struct MockPort {
        rx: Deque<u8, 256>,
        tx: Vec<u8, 256>,
        tx_space: usize,
        fault: bool,
    }

    impl MockPort {
        fn new() -> Self {
            Self {
                rx: Deque::new(),
                tx: Vec::new(),
                tx_space: 256,
                fault: false,
            }
        }

        fn push_rx(&mut self, bytes: &[u8]) {
            for &byte in bytes {
                self.rx.push_back(byte).unwrap();
            }
        }

        /// Frame a reply payload the way the camera does
        fn push_reply(&mut self, payload: &[u8]) {
            let len = payload.len() as u16;
            self.push_rx(&[0x02, len as u8, (len >> 8) as u8]);
            self.push_rx(payload);
            self.push_rx(&[0x0A, 0x03]);
        }
    }

    impl SerialPort for MockPort {
        type Error = ();

        fn available(&mut self) -> Result<usize, ()> {
            if self.fault {
                Err(())
            } else {
                Ok(self.rx.len())
            }
        }

        fn read_byte(&mut self) -> Option<u8> {
            self.rx.pop_front()
        }

        fn tx_space(&mut self) -> usize {
            self.tx_space
        }

        fn write(&mut self, data: &[u8]) -> usize {
            let n = data.len().min(self.tx_space);
            self.tx.extend_from_slice(&data[..n]).unwrap();
            n
        }
    }

    fn collect_events(link: &mut CameraLink<MockPort>) -> Vec<CameraEvent, 16> {
        let mut events = Vec::new();
        link.service(|event| events.push(event).unwrap());
        events
    }

    /// A link that has finished its startup sequence
    fn ready_link() -> CameraLink<MockPort> {
        let mut link = CameraLink::new(MockPort::new(), CameraConfig::default());

        collect_events(&mut link); // probes HIWS
        link.port.push_reply(b"OK\n");
        collect_events(&mut link); // connected, asks GZVV
        link.port.push_reply(b"0 1.0\n");
        collect_events(&mut link); // zoom known, pushes SLAY
        link.port.push_reply(b"OK\n");
        collect_events(&mut link); // layout known, pushes SMCA
        link.port.push_reply(b"OK\n");
        let events = collect_events(&mut link);

        assert!(events.contains(&CameraEvent::Ready));
        assert_eq!(link.phase(), Phase::Ready);
        assert!(!link.is_busy());
        link.port.tx.clear();
        link
    }

    #[test]
    fn test_startup_sequence() {
        let mut link = CameraLink::new(MockPort::new(), CameraConfig::default());
        assert_eq!(link.phase(), Phase::Connecting);

        // First pass probes the camera
        collect_events(&mut link);
        assert_eq!(link.port.tx.as_slice(), CameraCommand::CheckConnection.encode().as_slice());
        assert_eq!(link.outstanding(), Some(CameraCommand::CheckConnection));

        link.port.tx.clear();
        link.port.push_reply(b"OK\n");
        let events = collect_events(&mut link);
        assert!(events.contains(&CameraEvent::Connected));
        assert_eq!(link.phase(), Phase::Configuring);
        assert!(link.is_connected());
        // Configuration continues in the same pass
        assert_eq!(link.outstanding(), Some(CameraCommand::GetVisibleZoom));
    }

    #[test]
    fn test_scenario_capture_photo_ok() {
        let mut link = ready_link();

        link.capture_photo().unwrap();
        assert!(link.is_capturing());
        assert!(link.is_busy());

        // "OK\n" framed with declared length 3
        link.port
            .push_rx(&[0x02, 0x03, 0x00, 0x4F, 0x4B, 0x0A, 0x0A, 0x03]);
        let events = collect_events(&mut link);

        assert_eq!(events.as_slice(), &[CameraEvent::PhotoTaken]);
        assert!(!link.is_capturing());
        assert!(!link.is_busy());
    }

    #[test]
    fn test_scenario_visible_zoom_reading() {
        let mut link = ready_link();

        link.get_visible_zoom().unwrap();
        link.port.push_reply(b"3 2.5");
        let events = collect_events(&mut link);

        assert_eq!(
            events.as_slice(),
            &[
                CameraEvent::SpeedMultiplier(0.25),
                CameraEvent::ZoomReported {
                    camera: CameraSelect::Visible,
                    index: 3,
                    ratio: 2.5
                },
            ]
        );
        assert_eq!(link.visible_zoom(), Some(3));
        assert_eq!(link.speed_multiplier(), 0.25);
    }

    #[test]
    fn test_thermal_zoom_does_not_touch_multiplier() {
        let mut link = ready_link();

        link.get_thermal_zoom().unwrap();
        link.port.push_reply(b"5 8.0");
        let events = collect_events(&mut link);

        assert_eq!(
            events.as_slice(),
            &[CameraEvent::ZoomReported {
                camera: CameraSelect::Thermal,
                index: 5,
                ratio: 8.0
            }]
        );
        assert_eq!(link.thermal_zoom(), Some(5));
        assert_eq!(link.speed_multiplier(), 1.0);
    }

    #[test]
    fn test_single_outstanding_gate() {
        let mut link = ready_link();

        link.capture_photo().unwrap();
        let written = link.port.tx.len();

        // Second command is rejected outright, nothing hits the wire
        assert_eq!(link.get_visible_zoom(), Err(IssueError::Busy));
        assert_eq!(link.port.tx.len(), written);

        // Any classifiable reply frees the gate
        link.port.push_reply(b"OK\n");
        collect_events(&mut link);
        link.get_visible_zoom().unwrap();
    }

    #[test]
    fn test_not_ready_reported_without_state_change() {
        let mut link = ready_link();

        link.capture_photo().unwrap();
        link.port.push_reply(b"NOT_READY\n");
        let events = collect_events(&mut link);

        assert_eq!(
            events.as_slice(),
            &[CameraEvent::Refused(CameraCommand::CapturePhoto)]
        );
        // The optimistic flag stays; a status query refreshes it
        assert!(link.is_capturing());
        assert!(!link.is_busy());

        link.query_capturing().unwrap();
        link.port.push_reply(b"FALSE\n");
        let events = collect_events(&mut link);
        assert_eq!(events.as_slice(), &[CameraEvent::CaptureStatus(false)]);
        assert!(!link.is_capturing());
    }

    #[test]
    fn test_recording_guards() {
        let mut link = ready_link();

        assert_eq!(link.stop_recording(), Err(IssueError::NotRecording));

        link.start_recording().unwrap();
        link.port.push_reply(b"OK\n");
        collect_events(&mut link);
        assert!(link.is_recording());

        assert_eq!(link.start_recording(), Err(IssueError::AlreadyRecording));

        link.stop_recording().unwrap();
        link.port.push_reply(b"OK\n");
        let events = collect_events(&mut link);
        assert_eq!(events.as_slice(), &[CameraEvent::RecordingStopped]);
        assert!(!link.is_recording());
    }

    #[test]
    fn test_unexpected_reply_leaves_state_alone() {
        let mut link = ready_link();

        // Reply with nothing outstanding
        link.port.push_reply(b"OK\n");
        let events = collect_events(&mut link);
        assert_eq!(
            events.as_slice(),
            &[CameraEvent::Fault(LinkFault::UnexpectedReply)]
        );

        // Reply kind the outstanding request cannot receive
        let before = link.snapshot();
        link.get_visible_zoom().unwrap();
        link.port.push_reply(b"TRUE\n");
        let events = collect_events(&mut link);
        assert_eq!(
            events.as_slice(),
            &[CameraEvent::Fault(LinkFault::UnexpectedReply)]
        );
        assert_eq!(link.snapshot(), before);
        // But the gate is released
        assert!(!link.is_busy());
    }

    #[test]
    fn test_malformed_numeric_salvages_index() {
        let mut link = ready_link();

        link.get_visible_zoom().unwrap();
        link.port.push_reply(b"3 x");
        let events = collect_events(&mut link);

        assert_eq!(
            events.as_slice(),
            &[
                CameraEvent::SpeedMultiplier(0.25),
                CameraEvent::Fault(LinkFault::Reply(ReplyError::MalformedNumeric {
                    index: Some(3)
                })),
            ]
        );
        assert_eq!(link.visible_zoom(), Some(3));
        assert!(!link.is_busy());
    }

    #[test]
    fn test_classification_mismatch_releases_gate() {
        let mut link = ready_link();

        link.capture_photo().unwrap();
        link.port.push_reply(b"OKAY\n");
        let events = collect_events(&mut link);

        assert!(matches!(
            events.as_slice(),
            &[CameraEvent::Fault(LinkFault::Reply(
                ReplyError::ClassificationMismatch { .. }
            ))]
        ));
        assert!(!link.is_busy());
    }

    #[test]
    fn test_frame_error_keeps_gate() {
        let mut link = ready_link();

        link.capture_photo().unwrap();
        // Correct envelope until a bad footer byte
        link.port.push_rx(&[0x02, 0x03, 0x00, b'O', b'K', b'\n', 0xEE]);
        let events = collect_events(&mut link);

        assert_eq!(
            events.as_slice(),
            &[CameraEvent::Fault(LinkFault::Frame(
                FrameError::FooterMismatch { got: 0xEE }
            ))]
        );
        // The reply never reached classification, so the gate holds
        assert!(link.is_busy());
    }

    #[test]
    fn test_congested_command_writes_nothing() {
        let mut link = ready_link();
        link.port.tx_space = 4;

        assert_eq!(link.capture_photo(), Err(IssueError::Congestion));
        assert!(link.port.tx.is_empty());
        assert!(!link.is_busy());
        assert!(!link.is_capturing());
    }

    #[test]
    fn test_transport_fault_abandons_pass() {
        let mut link = ready_link();
        link.capture_photo().unwrap();

        link.port.fault = true;
        link.port.push_reply(b"OK\n");
        let events = collect_events(&mut link);
        assert_eq!(
            events.as_slice(),
            &[CameraEvent::Fault(LinkFault::Transport)]
        );
        assert!(link.is_busy());

        // Recovery: the queued reply is still there next pass
        link.port.fault = false;
        let events = collect_events(&mut link);
        assert_eq!(events.as_slice(), &[CameraEvent::PhotoTaken]);
    }
}
