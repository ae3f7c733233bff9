//! Gemeinsame Mocks für die Integration Tests
//!
//! Alle Mocks zeichnen ihre Aufrufe auf, damit Tests Schreibzugriffe,
//! Quittungen und Ausgaben prüfen können.

#![allow(dead_code)]

use std::collections::VecDeque;

use musicviz_core::{
    Board, Device, DeviceInfo, FlashError, HttpReply, HttpRequest, LedError, Method, ProgressSink,
    PushEvent, SmartLedWriter, StatusLed, TransportError, UpdateError, UpdateTransport,
};
use rgb::RGB8;

pub const LEDS: usize = 8;

pub type TestDevice = Device<MockLedWriter, MockStatusLed, LEDS>;

pub const INFO: DeviceInfo = DeviceInfo {
    name: "MusicViz-Test",
    version: "1.0.0",
    release_url: "http://updates.local/releases/latest",
};

pub fn device() -> TestDevice {
    Device::new(INFO, MockLedWriter::new(), MockStatusLed::default(), 0)
}

pub fn release_json(tag: &str) -> Vec<u8> {
    format!(
        r#"{{"tag_name":"{tag}","name":"Release {tag}","assets":[{{"name":"firmware.bin","browser_download_url":"http://updates.local/{tag}/firmware.bin"}}]}}"#
    )
    .into_bytes()
}

// ============================================================================
// Mock LED Writer
// ============================================================================

#[derive(Default)]
pub struct MockLedWriter {
    pub last_frame: Option<Vec<RGB8>>,
    pub write_count: usize,
    pub fail_next_write: bool,
}

impl MockLedWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` wenn der letzte Frame komplett aus `color` besteht
    pub fn last_frame_is(&self, color: RGB8) -> bool {
        self.last_frame
            .as_ref()
            .is_some_and(|frame| !frame.is_empty() && frame.iter().all(|&p| p == color))
    }
}

impl SmartLedWriter for MockLedWriter {
    fn write(&mut self, pixels: &[RGB8]) -> Result<(), LedError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(LedError::WriteFailed);
        }

        self.last_frame = Some(pixels.to_vec());
        self.write_count += 1;
        Ok(())
    }
}

// ============================================================================
// Mock Status LED
// ============================================================================

#[derive(Default)]
pub struct MockStatusLed {
    pub on: bool,
    pub history: Vec<bool>,
}

impl StatusLed for MockStatusLed {
    fn set(&mut self, on: bool) {
        self.on = on;
        self.history.push(on);
    }
}

// ============================================================================
// Mock Update Transport
// ============================================================================

pub struct MockTransport {
    pub release: Result<Vec<u8>, TransportError>,
    pub flash_result: Result<(), FlashError>,
    /// (written, total)-Paare, die während `flash` gemeldet werden
    pub progress_steps: Vec<(u32, u32)>,
    pub fetch_count: usize,
    pub flash_count: usize,
    pub flashed_url: Option<String>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            release: Ok(release_json("v1.0.0")),
            flash_result: Ok(()),
            progress_steps: Vec::new(),
            fetch_count: 0,
            flash_count: 0,
            flashed_url: None,
        }
    }
}

impl UpdateTransport for MockTransport {
    async fn fetch_release(&mut self, _url: &str, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.fetch_count += 1;
        match &self.release {
            Ok(body) => {
                if body.len() > buf.len() {
                    return Err(TransportError::TooLarge);
                }
                buf[..body.len()].copy_from_slice(body);
                Ok(body.len())
            }
            Err(e) => Err(*e),
        }
    }

    async fn flash(&mut self, url: &str, progress: &mut dyn ProgressSink) -> Result<(), FlashError> {
        self.flash_count += 1;
        self.flashed_url = Some(url.to_string());
        for &(written, total) in &self.progress_steps {
            progress.on_progress(written, total);
        }
        self.flash_result
    }
}

// ============================================================================
// Mock Board
// ============================================================================

#[derive(Default)]
pub struct MockBoard {
    pub ip: Option<core::net::Ipv4Addr>,
    pub transport: MockTransport,
    pub push_events: VecDeque<PushEvent>,
    pub push_acks: Vec<Result<(), UpdateError>>,
    pub serial_in: VecDeque<u8>,
    pub serial_out: Vec<String>,
    pub http_in: VecDeque<HttpRequest>,
    pub http_out: Vec<HttpReply>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn online() -> Self {
        Self {
            ip: Some(core::net::Ipv4Addr::new(192, 168, 1, 42)),
            ..Self::default()
        }
    }

    pub fn type_line(&mut self, line: &str) {
        self.serial_in.extend(line.bytes());
        self.serial_in.push_back(b'\n');
    }

    /// Anzahl der Ausgabezeilen mit genau diesem Text
    pub fn count_out(&self, line: &str) -> usize {
        self.serial_out.iter().filter(|l| l.as_str() == line).count()
    }
}

impl Board for MockBoard {
    type Transport = MockTransport;

    fn ip_address(&self) -> Option<core::net::Ipv4Addr> {
        self.ip
    }

    fn transport(&mut self) -> &mut MockTransport {
        &mut self.transport
    }

    fn next_push_event(&mut self) -> Option<PushEvent> {
        self.push_events.pop_front()
    }

    fn push_ack(&mut self, result: Result<(), UpdateError>) {
        self.push_acks.push(result);
    }

    fn read_serial(&mut self) -> Option<u8> {
        self.serial_in.pop_front()
    }

    fn write_serial(&mut self, line: &str) {
        self.serial_out.push(line.to_string());
    }

    fn next_http_request(&mut self) -> Option<HttpRequest> {
        self.http_in.pop_front()
    }

    fn send_http_reply(&mut self, reply: HttpReply) {
        self.http_out.push(reply);
    }
}

pub fn http_request(slot: u8, method: Method, path: &str, body: &str) -> HttpRequest {
    HttpRequest::new(slot, method, format_args!("{}", path), body)
}

/// Ein Tick, synchron ausgeführt
pub fn tick(device: &mut TestDevice, board: &mut MockBoard, now_ms: u64) -> musicviz_core::TickOutcome {
    embassy_futures::block_on(device.tick(now_ms, board))
}
