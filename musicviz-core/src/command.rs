//! Kommando-Grammatik für serielle Zeilen und HTTP-Routen
//!
//! Ein Kommando wird einmal aus Text geparst und danach nur noch
//! über den geschlossenen `Command`-Typ verarbeitet.

use core::fmt;

use heapless::String;

use crate::types::{BuiltinLed, LedMode, NamedColor, Truncating};

/// Alle gültigen Kommandos, Teil jeder "Unknown command"-Antwort
pub const AVAILABLE_COMMANDS: &str = "ping, off, solid, rainbow, visualizer, music, red, green, blue, yellow, white, ledon, ledoff, toggle, status, info, brightness:0-255, music:data, update:check/enable/disable/now";

/// Normalisierte Kommandozeile (getrimmt, Kleinbuchstaben)
pub type CommandLine = String<128>;

/// Teilkommandos von `update:<action>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateAction {
    Check,
    Enable,
    Disable,
    Now,
}

impl UpdateAction {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "check" => Some(Self::Check),
            "enable" => Some(Self::Enable),
            "disable" => Some(Self::Disable),
            "now" => Some(Self::Now),
            _ => None,
        }
    }
}

/// Geparstes Kommando
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Ping,
    SetMode(LedMode),
    SetColor(NamedColor),
    Builtin(BuiltinLed),
    Status,
    Info,
    Brightness(u8),
    /// Rohdaten für den Visualizer (alles nach `music:`)
    MusicData(&'a str),
    Update(UpdateAction),
}

/// Parse-Fehler; der Zustand bleibt bei allen Varianten unverändert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Nicht numerisch oder außerhalb 0-255
    InvalidBrightness,
    InvalidUpdateAction,
    Unknown,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBrightness => f.write_str("Invalid brightness (0-255)"),
            Self::InvalidUpdateAction => f.write_str("Invalid update command"),
            Self::Unknown => f.write_str("Unknown command"),
        }
    }
}

/// Trimmt und wandelt in Kleinbuchstaben; überlange Eingaben werden abgeschnitten
pub fn normalize(raw: &str) -> CommandLine {
    let mut line = CommandLine::new();
    let _ = fmt::Write::write_str(&mut Truncating(&mut line), raw.trim());
    line.make_ascii_lowercase();
    line
}

impl<'a> Command<'a> {
    /// Parst eine bereits normalisierte Zeile, erster Treffer gewinnt
    pub fn parse(line: &'a str) -> Result<Self, CommandError> {
        if line == "ping" {
            return Ok(Self::Ping);
        }
        if let Some(mode) = LedMode::from_token(line) {
            return Ok(Self::SetMode(mode));
        }
        if let Some(color) = NamedColor::from_token(line) {
            return Ok(Self::SetColor(color));
        }
        match line {
            "ledon" => return Ok(Self::Builtin(BuiltinLed::On)),
            "ledoff" => return Ok(Self::Builtin(BuiltinLed::Off)),
            "toggle" => return Ok(Self::Builtin(BuiltinLed::Toggle)),
            "status" => return Ok(Self::Status),
            "info" => return Ok(Self::Info),
            _ => {}
        }
        if let Some(value) = line.strip_prefix("brightness:") {
            return parse_brightness(value).map(Self::Brightness);
        }
        if let Some(data) = line.strip_prefix("music:") {
            return Ok(Self::MusicData(data));
        }
        if let Some(action) = line.strip_prefix("update:") {
            return UpdateAction::from_token(action)
                .map(Self::Update)
                .ok_or(CommandError::InvalidUpdateAction);
        }
        Err(CommandError::Unknown)
    }
}

fn parse_brightness(value: &str) -> Result<u8, CommandError> {
    let value: i32 = value
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidBrightness)?;
    u8::try_from(value).map_err(|_| CommandError::InvalidBrightness)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize("  RaInBoW \r").as_str(), "rainbow");
    }

    #[test]
    fn test_music_alias_is_mode_not_data() {
        assert_eq!(
            Command::parse("music"),
            Ok(Command::SetMode(LedMode::Visualizer))
        );
        assert_eq!(Command::parse("music:42"), Ok(Command::MusicData("42")));
    }

    #[test]
    fn test_brightness_bounds() {
        assert_eq!(Command::parse("brightness:0"), Ok(Command::Brightness(0)));
        assert_eq!(
            Command::parse("brightness:255"),
            Ok(Command::Brightness(255))
        );
        assert_eq!(
            Command::parse("brightness:256"),
            Err(CommandError::InvalidBrightness)
        );
        assert_eq!(
            Command::parse("brightness:-1"),
            Err(CommandError::InvalidBrightness)
        );
        assert_eq!(
            Command::parse("brightness:abc"),
            Err(CommandError::InvalidBrightness)
        );
        assert_eq!(
            Command::parse("brightness:"),
            Err(CommandError::InvalidBrightness)
        );
    }

    #[test]
    fn test_update_actions() {
        assert_eq!(
            Command::parse("update:now"),
            Ok(Command::Update(UpdateAction::Now))
        );
        assert_eq!(
            Command::parse("update:later"),
            Err(CommandError::InvalidUpdateAction)
        );
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(Command::parse("frobnicate"), Err(CommandError::Unknown));
        assert_eq!(Command::parse(""), Err(CommandError::Unknown));
    }
}
