//! Core Types für den Gerätezustand
//!
//! Datenstrukturen ohne Hardware-Dependencies

use core::fmt::{self, Write};
use core::net::Ipv4Addr;

use heapless::String;
use rgb::RGB8;

use crate::config::DEFAULT_BRIGHTNESS;

/// Status-Text für Beobachtbarkeit (Update-Status)
pub type StatusText = String<64>;

/// Versions-Tag, z.B. "v1.2.0"
pub type VersionText = String<32>;

/// Download-URL eines Firmware-Images
pub type UrlText = String<256>;

/// Betriebs-Modus des LED-Strips
///
/// Genau ein Modus ist aktiv, Default ist `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedMode {
    #[default]
    Off,
    Solid,
    Rainbow,
    Visualizer,
}

impl LedMode {
    /// Kommando-Token → Modus; `music` ist der alte Alias für `visualizer`
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "off" => Some(Self::Off),
            "solid" => Some(Self::Solid),
            "rainbow" => Some(Self::Rainbow),
            "visualizer" | "music" => Some(Self::Visualizer),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Solid => "solid",
            Self::Rainbow => "rainbow",
            Self::Visualizer => "visualizer",
        }
    }

    /// Antwort-Text nach einem Moduswechsel
    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Strip OFF",
            Self::Solid => "Strip Solid Color",
            Self::Rainbow => "Strip Rainbow",
            Self::Visualizer => "Strip Visualizer Mode",
        }
    }
}

/// Die fünf per Kommando wählbaren Farben
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NamedColor {
    Red,
    Green,
    Blue,
    Yellow,
    White,
}

impl NamedColor {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            "yellow" => Some(Self::Yellow),
            "white" => Some(Self::White),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Yellow => "Yellow",
            Self::White => "White",
        }
    }

    pub fn rgb(self) -> RGB8 {
        match self {
            Self::Red => RGB8 { r: 255, g: 0, b: 0 },
            Self::Green => RGB8 { r: 0, g: 255, b: 0 },
            Self::Blue => RGB8 { r: 0, g: 0, b: 255 },
            Self::Yellow => RGB8 { r: 255, g: 255, b: 0 },
            Self::White => RGB8 {
                r: 255,
                g: 255,
                b: 255,
            },
        }
    }
}

/// Zustand der eingebauten Status-LED nach einem Kommando
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuiltinLed {
    On,
    Off,
    Toggle,
}

/// Gerätezustand - eine Instanz von Power-On bis Reset
///
/// Jedes Feld hat genau einen schreibenden Besitzer:
/// - Kommando-Protokoll: `mode`, `color`, `brightness`, `builtin_led_on`, `auto_update_enabled`
/// - Update-Sequencer: `update_in_progress`, `latest_version`, `update_status`
///   (und `builtin_led_on` als Busy-Anzeige während `Applying`)
/// - Connectivity-Monitor: `serial_connected`, `last_serial_activity_ms`
/// - Netzwerk-Schicht (über den Scheduler-Tick): `ip_address`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub mode: LedMode,
    pub color: RGB8,
    pub brightness: u8,
    pub builtin_led_on: bool,
    pub auto_update_enabled: bool,
    pub update_in_progress: bool,
    pub latest_version: VersionText,
    pub update_status: StatusText,
    pub serial_connected: bool,
    pub last_serial_activity_ms: u64,
    pub ip_address: Option<Ipv4Addr>,
}

impl Default for DeviceState {
    fn default() -> Self {
        let mut update_status = StatusText::new();
        let _ = update_status.push_str("Ready");
        Self {
            mode: LedMode::Off,
            color: NamedColor::Blue.rgb(),
            brightness: DEFAULT_BRIGHTNESS,
            builtin_led_on: false,
            auto_update_enabled: true,
            update_in_progress: false,
            latest_version: VersionText::new(),
            update_status,
            serial_connected: false,
            last_serial_activity_ms: 0,
            ip_address: None,
        }
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Überschreibt den Update-Status; zu lange Texte werden abgeschnitten
    pub fn set_update_status(&mut self, args: fmt::Arguments<'_>) {
        self.update_status.clear();
        let _ = Truncating(&mut self.update_status).write_fmt(args);
    }
}

/// `fmt::Write`-Adapter, der bei vollem Puffer abschneidet statt abzubrechen
pub(crate) struct Truncating<'a, const N: usize>(pub &'a mut String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}
