//! Controller - besitzt Zustand, Komponenten und Hardware
//!
//! Ein Scheduler-Tick arbeitet in fester Reihenfolge:
//! 1. Push-Update-Ereignisse
//! 2. Periodische Update-Prüfung + laufender Update-Zyklus
//! 3. Serielle Eingabe
//! 4. HTTP-Anfragen
//! 5. LED-Rendering
//! 6. Liveness + Heartbeat
//!
//! Update-Behandlung liegt damit immer vor dem Rendern, die Sperre
//! `update_in_progress` ist beim Zeichnen bereits gesetzt.

use core::fmt::Write;

use heapless::String;

use crate::arbiter::LedArbiter;
use crate::command::Command;
use crate::config::{DeviceInfo, RESPONSE_PREFIX};
use crate::connectivity::ConnectivityMonitor;
use crate::fmt::{info, warn};
use crate::http::{ContentType, HttpReply, HttpRequest, ReplyText, route};
use crate::protocol::{self, CommandContext, Response};
use crate::serial::LineAssembler;
use crate::traits::{Board, SmartLedWriter, StatusLed};
use crate::types::{DeviceState, Truncating};
use crate::update::{UpdateContext, UpdatePhase, UpdateSequencer};

/// Serielle Ausgabezeile inkl. Präfix
type SerialText = String<400>;

/// Ergebnis eines Ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    Continue,
    /// Update erfolgreich installiert; der Aufrufer startet neu
    Restart,
}

pub struct Device<L, S, const N: usize> {
    state: DeviceState,
    arbiter: LedArbiter<N>,
    updater: UpdateSequencer,
    monitor: ConnectivityMonitor,
    serial: LineAssembler,
    strip: L,
    status_led: S,
}

impl<L, S, const N: usize> Device<L, S, N>
where
    L: SmartLedWriter,
    S: StatusLed,
{
    pub fn new(info: DeviceInfo, strip: L, status_led: S, boot_ms: u64) -> Self {
        Self {
            state: DeviceState::new(),
            arbiter: LedArbiter::new(),
            updater: UpdateSequencer::new(info, boot_ms),
            monitor: ConnectivityMonitor::new(boot_ms),
            serial: LineAssembler::new(),
            strip,
            status_led,
        }
    }

    /// Ausgangszustand herstellen und `READY` melden
    pub fn boot<B: Board>(&mut self, board: &mut B) {
        info!(
            "{} v{} starting",
            self.updater.info().name,
            self.updater.info().version
        );
        self.arbiter.clear(&mut self.strip);
        self.status_led.set(self.state.builtin_led_on);
        write_notice(board, "READY");
    }

    /// Ein Durchlauf der Scheduler-Schleife
    pub async fn tick<B: Board>(&mut self, now_ms: u64, board: &mut B) -> TickOutcome {
        if self.updater.phase() == UpdatePhase::Succeeded {
            return TickOutcome::Restart;
        }
        self.state.ip_address = board.ip_address();

        // 1. Push-Update
        while let Some(event) = board.next_push_event() {
            let mut ctx = UpdateContext {
                state: &mut self.state,
                arbiter: &mut self.arbiter,
                strip: &mut self.strip,
                status_led: &mut self.status_led,
            };
            let result = self.updater.on_push(event, &mut ctx);
            board.push_ack(result);
            if self.updater.phase() == UpdatePhase::Succeeded {
                return TickOutcome::Restart;
            }
        }

        // 2. Pull-Update
        let mut ctx = UpdateContext {
            state: &mut self.state,
            arbiter: &mut self.arbiter,
            strip: &mut self.strip,
            status_led: &mut self.status_led,
        };
        if let Some(result) = self.updater.poll(now_ms, board.transport(), &mut ctx).await {
            info!("Update: cycle finished {}", result);
        }
        if self.updater.phase() == UpdatePhase::Succeeded {
            return TickOutcome::Restart;
        }

        // 3. Serielle Eingabe
        while let Some(byte) = board.read_serial() {
            if let Some(change) = self.monitor.on_activity(&mut self.state, now_ms) {
                write_notice(board, change.notice());
            }
            match self.serial.push(byte) {
                Some(Ok(line)) => {
                    let response = self.handle_line(&line, now_ms);
                    write_notice(board, response.as_str());
                }
                Some(Err(e)) => {
                    warn!("Serial: line dropped");
                    write_notice(board, Response::error(format_args!("{}", e)).as_str());
                }
                None => {}
            }
        }

        // 4. HTTP
        while let Some(request) = board.next_http_request() {
            let reply = self.handle_http(&request, now_ms);
            board.send_http_reply(reply);
        }

        // 5. Rendern (no-op während eines Updates)
        self.arbiter
            .render_tick(&self.state, &mut self.strip, now_ms);

        // 6. Liveness
        if let Some(change) = self.monitor.tick(&mut self.state, now_ms) {
            write_notice(board, change.notice());
        }
        if self.monitor.heartbeat_due(&self.state, now_ms) {
            write_notice(board, "HEARTBEAT");
        }

        TickOutcome::Continue
    }

    /// Verarbeitet eine serielle Kommandozeile
    pub fn handle_line(&mut self, raw: &str, now_ms: u64) -> Response {
        let mut ctx = self.command_context(now_ms);
        protocol::respond(raw, &mut ctx)
    }

    /// Verarbeitet eine HTTP-Anfrage über dieselbe Kommando-Logik
    pub fn handle_http(&mut self, request: &HttpRequest, now_ms: u64) -> HttpReply {
        let command = match route(request.method, &request.path, &request.body) {
            Ok(command) => command,
            Err(e) => {
                let mut body = ReplyText::new();
                let _ = write!(Truncating(&mut body), "{}", e);
                return HttpReply {
                    slot: request.slot,
                    seq: request.seq,
                    status: e.status(),
                    content_type: ContentType::Text,
                    body,
                };
            }
        };

        let content_type = match command {
            Command::MusicData(_) => ContentType::Json,
            _ => ContentType::Text,
        };
        let mut ctx = self.command_context(now_ms);
        let response = protocol::interpret(command, &mut ctx);
        HttpReply {
            slot: request.slot,
            seq: request.seq,
            status: if response.is_error { 400 } else { 200 },
            content_type,
            body: response.text,
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn arbiter(&self) -> &LedArbiter<N> {
        &self.arbiter
    }

    pub fn updater(&self) -> &UpdateSequencer {
        &self.updater
    }

    pub fn strip(&self) -> &L {
        &self.strip
    }

    pub fn status_led(&self) -> &S {
        &self.status_led
    }

    fn command_context(&mut self, now_ms: u64) -> CommandContext<'_, L, S, N> {
        CommandContext {
            state: &mut self.state,
            updater: &mut self.updater,
            arbiter: &mut self.arbiter,
            strip: &mut self.strip,
            status_led: &mut self.status_led,
            now_ms,
        }
    }
}

/// Schreibt `RESPONSE:<text>` auf die serielle Schnittstelle
fn write_notice<B: Board>(board: &mut B, text: &str) {
    let mut line = SerialText::new();
    let _ = write!(Truncating(&mut line), "{}{}", RESPONSE_PREFIX, text);
    board.write_serial(&line);
}
