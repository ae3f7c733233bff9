//! HTTP-Routentabelle
//!
//! Der HTTP-Server der Firmware reicht Methode, Pfad und Body durch;
//! hier wird daraus dasselbe [`Command`] wie auf der seriellen Seite.

use core::fmt;

use heapless::String;

use crate::command::{Command, UpdateAction};
use crate::types::{BuiltinLed, LedMode, NamedColor, Truncating};

pub type PathText = String<64>;
pub type BodyText = String<128>;
pub type ReplyText = String<384>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    Post,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ContentType {
    Text,
    Json,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Json => "application/json",
        }
    }
}

/// Anfrage eines HTTP-Handlers an den Controller
///
/// `slot` ordnet die Antwort dem wartenden Handler zu, `seq` der
/// konkreten Anfrage (verspätete Antworten auf abgebrochene Anfragen
/// tragen eine alte `seq`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub slot: u8,
    pub seq: u32,
    pub method: Method,
    pub path: PathText,
    pub body: BodyText,
}

impl HttpRequest {
    /// Überlange Pfade und Bodies werden abgeschnitten
    pub fn new(slot: u8, method: Method, path: fmt::Arguments<'_>, body: &str) -> Self {
        let mut request = Self {
            slot,
            seq: 0,
            method,
            path: PathText::new(),
            body: BodyText::new(),
        };
        let _ = fmt::Write::write_fmt(&mut Truncating(&mut request.path), path);
        let _ = fmt::Write::write_str(&mut Truncating(&mut request.body), body);
        request
    }

    pub fn with_seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }
}

/// Antwort des Controllers, `slot` und `seq` stammen aus der Anfrage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub slot: u8,
    pub seq: u32,
    pub status: u16,
    pub content_type: ContentType,
    pub body: ReplyText,
}

impl HttpReply {
    /// Gehört die Antwort zu Anfrage `seq` des Handlers `slot`?
    pub fn answers(&self, slot: u8, seq: u32) -> bool {
        self.slot == slot && self.seq == seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
    InvalidMode,
    InvalidColor,
    InvalidAction,
}

impl RouteError {
    pub fn status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::MethodNotAllowed => 405,
            Self::InvalidMode | Self::InvalidColor | Self::InvalidAction => 400,
        }
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("Not found"),
            Self::MethodNotAllowed => f.write_str("Method not allowed"),
            Self::InvalidMode => f.write_str("Invalid mode"),
            Self::InvalidColor => f.write_str("Invalid color"),
            Self::InvalidAction => f.write_str("Invalid action"),
        }
    }
}

/// Endpunkte, deren Antwort als JSON zurückgeht
pub fn is_music_path(path: &str) -> bool {
    matches!(strip_path(path), "/music/data" | "/api/music")
}

/// Pfad ohne Query-String und abschließenden Slash
fn strip_path(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or("");
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    }
}

/// Bildet Methode + Pfad (+ Body) auf ein Kommando ab
///
/// Pfad-Segmente werden ohne Beachtung der Groß-/Kleinschreibung verglichen,
/// der Body wird unverändert als Musik-Daten weitergereicht.
pub fn route<'a>(method: Method, path: &str, body: &'a str) -> Result<Command<'a>, RouteError> {
    let mut lower = PathText::new();
    lower
        .push_str(strip_path(path))
        .map_err(|_| RouteError::NotFound)?;
    lower.make_ascii_lowercase();
    let path = lower.as_str();

    if matches!(path, "/music/data" | "/api/music") {
        return match method {
            Method::Post => Ok(Command::MusicData(body)),
            Method::Get | Method::Other => Err(RouteError::MethodNotAllowed),
        };
    }

    match path {
        "/status" => return Ok(Command::Status),
        "/info" => return Ok(Command::Info),
        "/ping" => return Ok(Command::Ping),
        _ => {}
    }

    if let Some(action) = path.strip_prefix("/led/") {
        return match action {
            "on" => Ok(Command::Builtin(BuiltinLed::On)),
            "off" => Ok(Command::Builtin(BuiltinLed::Off)),
            "toggle" => Ok(Command::Builtin(BuiltinLed::Toggle)),
            _ => Err(RouteError::NotFound),
        };
    }
    if let Some(mode) = path.strip_prefix("/strip/mode/") {
        return LedMode::from_token(mode)
            .map(Command::SetMode)
            .ok_or(RouteError::InvalidMode);
    }
    if let Some(color) = path.strip_prefix("/strip/color/") {
        return NamedColor::from_token(color)
            .map(Command::SetColor)
            .ok_or(RouteError::InvalidColor);
    }
    if let Some(action) = path.strip_prefix("/auto-update/") {
        return UpdateAction::from_token(action)
            .map(Command::Update)
            .ok_or(RouteError::InvalidAction);
    }

    Err(RouteError::NotFound)
}
