//! Feste Zeit- und Größen-Konstanten des Controllers
//!
//! Hardware- und Netzwerk-Konfiguration liegt in der Firmware-Crate,
//! hier stehen nur Werte, die das Verhalten der Zustandsmaschine bestimmen.

/// Serielle Verbindung gilt nach 30 s ohne Aktivität als getrennt
pub const SERIAL_TIMEOUT_MS: u64 = 30_000;

/// Intervall der periodischen Update-Prüfung (1 Stunde)
pub const UPDATE_CHECK_INTERVAL_MS: u64 = 3_600_000;

/// Heartbeat-Intervall solange USB verbunden ist
pub const HEARTBEAT_INTERVAL_MS: u64 = 10_000;

/// Maximale Länge einer seriellen Kommandozeile in Bytes
pub const SERIAL_LINE_MAX: usize = 100;

/// Start-Helligkeit des Strips (0-255)
pub const DEFAULT_BRIGHTNESS: u8 = 128;

/// Puffer für das Release-JSON der Update-Quelle
pub const RELEASE_BUFFER_SIZE: usize = 4096;

/// Hue-Schritt pro Rainbow-Frame
pub const RAINBOW_HUE_STEP: u8 = 3;

/// Phasen-Schritt pro Visualizer-Frame
pub const VISUALIZER_BEAT_STEP: u8 = 2;

/// Präfix aller seriellen Antworten
pub const RESPONSE_PREFIX: &str = "RESPONSE:";

/// Identität des Geräts, wird von der Firmware geliefert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Gerätename für `info` und Statuszeilen
    pub name: &'static str,
    /// Laufende Firmware-Version ohne "v"-Präfix, z.B. "1.0.0"
    pub version: &'static str,
    /// URL des Release-Dokuments (JSON mit `tag_name` und `assets`)
    pub release_url: &'static str,
}
