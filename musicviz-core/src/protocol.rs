//! Kommando-Protokoll - wendet ein Kommando auf den Gerätezustand an
//!
//! Serielle Zeilen und HTTP-Routen landen beide hier; Antworttexte
//! sind für beide Transporte identisch.

use core::fmt::{self, Write};

use crate::arbiter::LedArbiter;
use crate::command::{AVAILABLE_COMMANDS, Command, CommandError, UpdateAction, normalize};
use crate::effects::BeatSample;
use crate::fmt::{debug, info};
use crate::http::ReplyText;
use crate::traits::{SmartLedWriter, StatusLed};
use crate::types::{BuiltinLed, DeviceState, LedMode, Truncating};
use crate::update::{UpdateError, UpdateSequencer};

/// Antwort auf ein Kommando (ohne `RESPONSE:`-Präfix)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub text: ReplyText,
    pub is_error: bool,
}

impl Response {
    pub fn ok(args: fmt::Arguments<'_>) -> Self {
        let mut text = ReplyText::new();
        let _ = Truncating(&mut text).write_fmt(args);
        Self {
            text,
            is_error: false,
        }
    }

    /// Fehler-Antworten beginnen immer mit "ERROR "
    pub fn error(args: fmt::Arguments<'_>) -> Self {
        let mut text = ReplyText::new();
        let mut out = Truncating(&mut text);
        let _ = out.write_str("ERROR ");
        let _ = out.write_fmt(args);
        Self {
            text,
            is_error: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Zugriff des Protokolls auf Zustand, Update-Sequencer und Strip
pub struct CommandContext<'a, L, S, const N: usize> {
    pub state: &'a mut DeviceState,
    pub updater: &'a mut UpdateSequencer,
    pub arbiter: &'a mut LedArbiter<N>,
    pub strip: &'a mut L,
    pub status_led: &'a mut S,
    pub now_ms: u64,
}

/// Normalisiert, parst und wendet eine Rohzeile an
pub fn respond<L, S, const N: usize>(raw: &str, ctx: &mut CommandContext<'_, L, S, N>) -> Response
where
    L: SmartLedWriter,
    S: StatusLed,
{
    let line = normalize(raw);
    debug!("Command: {}", line.as_str());
    match Command::parse(&line) {
        Ok(command) => interpret(command, ctx),
        Err(e) => reject(e, &line),
    }
}

/// Fehler-Antwort für eine nicht parsebare Zeile
pub fn reject(error: CommandError, line: &str) -> Response {
    match error {
        CommandError::Unknown => Response::error(format_args!(
            "{}: {}. Available commands: {}",
            error, line, AVAILABLE_COMMANDS
        )),
        CommandError::InvalidBrightness | CommandError::InvalidUpdateAction => {
            Response::error(format_args!("{}", error))
        }
    }
}

/// Wendet ein geparstes Kommando an
///
/// Schreibt nur `mode`, `color`, `brightness`, `builtin_led_on` und
/// `auto_update_enabled`; Update-Felder ändert ausschließlich der Sequencer.
pub fn interpret<L, S, const N: usize>(
    command: Command<'_>,
    ctx: &mut CommandContext<'_, L, S, N>,
) -> Response
where
    L: SmartLedWriter,
    S: StatusLed,
{
    match command {
        Command::Ping => Response::ok(format_args!("PONG")),
        Command::SetMode(mode) => {
            if ctx.state.mode != mode {
                info!("Strip: mode {}", mode);
            }
            ctx.state.mode = mode;
            Response::ok(format_args!("{}", mode.label()))
        }
        Command::SetColor(color) => {
            ctx.state.color = color.rgb();
            if ctx.state.mode == LedMode::Solid {
                ctx.arbiter.render_now(ctx.state, &mut *ctx.strip, ctx.now_ms);
            }
            Response::ok(format_args!("Color {}", color.name()))
        }
        Command::Builtin(action) => {
            let on = match action {
                BuiltinLed::On => true,
                BuiltinLed::Off => false,
                BuiltinLed::Toggle => !ctx.state.builtin_led_on,
            };
            ctx.state.builtin_led_on = on;
            ctx.status_led.set(on);
            Response::ok(format_args!("LED {}", if on { "ON" } else { "OFF" }))
        }
        Command::Status => status_line(ctx.state, ctx.updater),
        Command::Info => info_line(ctx.state, ctx.updater),
        Command::Brightness(value) => {
            ctx.state.brightness = value;
            ctx.arbiter.render_now(ctx.state, &mut *ctx.strip, ctx.now_ms);
            Response::ok(format_args!("Brightness set to {}", value))
        }
        Command::MusicData(data) => {
            let sample = BeatSample::parse(data);
            if ctx.arbiter.apply_sample(sample, ctx.state, &mut *ctx.strip) {
                Response::ok(format_args!("Music data processed"))
            } else {
                Response::ok(format_args!("Music data ignored"))
            }
        }
        Command::Update(action) => update_command(action, ctx),
    }
}

fn update_command<L, S, const N: usize>(
    action: UpdateAction,
    ctx: &mut CommandContext<'_, L, S, N>,
) -> Response {
    match action {
        UpdateAction::Check => match ctx.updater.request_check(ctx.state) {
            Ok(()) => Response::ok(format_args!("Update check initiated")),
            Err(e) => Response::error(format_args!("{}", e)),
        },
        UpdateAction::Enable => {
            ctx.state.auto_update_enabled = true;
            Response::ok(format_args!("Auto-update enabled"))
        }
        UpdateAction::Disable => {
            ctx.state.auto_update_enabled = false;
            Response::ok(format_args!("Auto-update disabled"))
        }
        UpdateAction::Now => match ctx.updater.start_now(ctx.state) {
            Ok(()) => Response::ok(format_args!("Update started")),
            Err(UpdateError::NoUpdateAvailable) => {
                Response::ok(format_args!("No update available"))
            }
            Err(e) => Response::error(format_args!("{}", e)),
        },
    }
}

struct WifiText(Option<core::net::Ipv4Addr>);

impl fmt::Display for WifiText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ip) => write!(f, "{}", ip),
            None => f.write_str("disconnected"),
        }
    }
}

/// `Mode=..,LED=..,WiFi=..,USB=..,Version=..,Update=..`
pub fn status_line(state: &DeviceState, updater: &UpdateSequencer) -> Response {
    Response::ok(format_args!(
        "Mode={},LED={},WiFi={},USB={},Version={},Update={}",
        state.mode.name(),
        u8::from(state.builtin_led_on),
        WifiText(state.ip_address),
        if state.serial_connected {
            "connected"
        } else {
            "disconnected"
        },
        updater.info().version,
        state.update_status,
    ))
}

/// `Device=..,Version=..,IP=..,AutoUpdate=..`
pub fn info_line(state: &DeviceState, updater: &UpdateSequencer) -> Response {
    let info = updater.info();
    Response::ok(format_args!(
        "Device={},Version={},IP={},AutoUpdate={}",
        info.name,
        info.version,
        state
            .ip_address
            .unwrap_or(core::net::Ipv4Addr::UNSPECIFIED),
        u8::from(state.auto_update_enabled),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_prefix() {
        let response = Response::error(format_args!("Invalid brightness (0-255)"));
        assert!(response.is_error);
        assert_eq!(response.as_str(), "ERROR Invalid brightness (0-255)");
    }

    #[test]
    fn test_reject_unknown_lists_commands() {
        let response = reject(CommandError::Unknown, "frobnicate");
        assert!(response.as_str().starts_with("ERROR Unknown command: frobnicate."));
        assert!(response.as_str().contains("update:check/enable/disable/now"));
    }
}
