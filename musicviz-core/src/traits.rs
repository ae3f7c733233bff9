//! Hardware- und Kollaborateur-Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware- und Netzwerk-Zugriff
//! ohne konkrete Implementierung.
//!
//! # Implementierungen
//! - **Production:** RMT Strip-Writer, GPIO Status-LED, HTTP-Transport (Firmware)
//! - **Testing:** Mocks in `musicviz-tests`

use core::fmt;
use core::net::Ipv4Addr;

use rgb::RGB8;

use crate::http::{HttpReply, HttpRequest};
use crate::update::PushEvent;
use crate::update::UpdateError;

/// Fehler-Typ für LED-Operationen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedError {
    WriteFailed,
}

/// Trait für den adressierbaren LED-Strip (WS2812/Neopixel)
pub trait SmartLedWriter {
    /// Schreibt einen kompletten Frame auf den Strip
    ///
    /// # Fehlerbehandlung
    /// Gibt `LedError::WriteFailed` zurück wenn Hardware-Zugriff fehlschlägt.
    /// Der Aufrufer behandelt Schreibfehler als fire-and-forget.
    fn write(&mut self, pixels: &[RGB8]) -> Result<(), LedError>;
}

/// Trait für die eingebaute Status-LED
pub trait StatusLed {
    fn set(&mut self, on: bool);
}

/// Fehler beim Abruf des Release-Dokuments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Hostname konnte nicht aufgelöst werden
    Dns,
    /// TCP-Verbindung fehlgeschlagen
    Connect,
    /// Server antwortete mit HTTP-Status != 200
    Status(u16),
    /// Antwort passt nicht in den Puffer
    TooLarge,
    /// Lesefehler / Timeout
    Io,
    /// Nur `http://` wird unterstützt
    UnsupportedUrl,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns => f.write_str("dns error"),
            Self::Connect => f.write_str("connect error"),
            Self::Status(code) => write!(f, "http {}", code),
            Self::TooLarge => f.write_str("response too large"),
            Self::Io => f.write_str("io error"),
            Self::UnsupportedUrl => f.write_str("unsupported url"),
        }
    }
}

/// Fehler beim Herunterladen und Flashen eines Images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    Transport(TransportError),
    InvalidPartitionTable,
    /// Keine inaktive OTA-Partition gefunden
    NoTargetSlot,
    Write,
    Activate,
    /// Image größer als die OTA-Partition
    TooLarge,
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "download: {}", e),
            Self::InvalidPartitionTable => f.write_str("invalid partition table"),
            Self::NoTargetSlot => f.write_str("no ota slot"),
            Self::Write => f.write_str("write failed"),
            Self::Activate => f.write_str("activate failed"),
            Self::TooLarge => f.write_str("image too large"),
        }
    }
}

impl From<TransportError> for FlashError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

/// Empfänger für Fortschrittsmeldungen während eines Flash-Vorgangs
pub trait ProgressSink {
    fn on_progress(&mut self, written: u32, total: u32);
}

/// Trait für die Pull-Update-Quelle
///
/// Beide Operationen sind async, weil sie über den Netzwerk-Stack laufen.
#[allow(async_fn_in_trait)]
pub trait UpdateTransport {
    /// Lädt das Release-Dokument nach `buf` und liefert die Länge
    async fn fetch_release(&mut self, url: &str, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Lädt das Image von `url` und schreibt es in die inaktive OTA-Partition
    ///
    /// Läuft bis Ende oder harten Fehler durch (kein Abbruch möglich).
    async fn flash(&mut self, url: &str, progress: &mut dyn ProgressSink)
    -> Result<(), FlashError>;
}

/// Kollaborateure eines Scheduler-Ticks
///
/// Kapselt alle Ein-/Ausgaben, die der Controller pro Tick abfragt:
/// Netzwerk-Status, Push-Update-Ereignisse, serielle Bytes und HTTP-Anfragen.
pub trait Board {
    type Transport: UpdateTransport;

    /// Aktuelle IPv4-Adresse, `None` ohne WLAN
    fn ip_address(&self) -> Option<Ipv4Addr>;

    fn transport(&mut self) -> &mut Self::Transport;

    /// Nächstes Ereignis eines laufenden Push-Updates (non-blocking)
    fn next_push_event(&mut self) -> Option<PushEvent>;

    /// Quittung für ein Push-Ereignis (z.B. Ablehnung von `Start`)
    fn push_ack(&mut self, result: Result<(), UpdateError>);

    /// Nächstes Byte von der seriellen Schnittstelle (non-blocking)
    fn read_serial(&mut self) -> Option<u8>;

    /// Schreibt eine Zeile (ohne Zeilenende) auf die serielle Schnittstelle
    fn write_serial(&mut self, line: &str);

    /// Nächste HTTP-Anfrage (non-blocking)
    fn next_http_request(&mut self) -> Option<HttpRequest>;

    fn send_http_reply(&mut self, reply: HttpReply);
}
