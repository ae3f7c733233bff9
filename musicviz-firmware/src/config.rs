// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen

use musicviz_core::DeviceInfo;

// ============================================================================
// Geräte-Identität
// ============================================================================

/// Gerätename (erscheint in `info` und im Boot-Log)
pub const DEVICE_NAME: &str = "MusicViz";

/// Laufende Firmware-Version ohne "v"-Präfix
/// Release-Tags werden gegen "v" + FIRMWARE_VERSION verglichen
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// URL des Release-Dokuments
/// Wird zur Build-Zeit aus der Environment Variable RELEASE_URL geladen
/// Setze diese in .env file (siehe .env.example)
pub const RELEASE_URL: &str = env!(
    "RELEASE_URL",
    "Release URL nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

pub const DEVICE_INFO: DeviceInfo = DeviceInfo {
    name: DEVICE_NAME,
    version: FIRMWARE_VERSION,
    release_url: RELEASE_URL,
};

// ============================================================================
// LED Konfiguration
// ============================================================================

/// Anzahl der LEDs im Strip
pub const LED_COUNT: usize = 60;

/// RMT Taktfrequenz in MHz
/// 80 MHz ist optimal für WS2812 LED-Timing
pub const RMT_CLOCK_MHZ: u32 = 80;

/// RMT-Puffer: 24 Pulse pro LED + 1 Reset
pub const LED_BUFFER_SIZE: usize = LED_COUNT * 24 + 1;

// Pins: Strip-Daten auf GPIO8 (onboard WS2812 der DevKitC ist GPIO8),
// Status-LED auf GPIO15, UART0 auf GPIO16 (TX) / GPIO17 (RX).
// Die Pin-Zuordnung steht in main.rs, weil Peripherals typisiert sind.

// ============================================================================
// Scheduler
// ============================================================================

/// Abstand zweier Scheduler-Ticks in Millisekunden
pub const TICK_INTERVAL_MS: u64 = 10;

/// Wartezeit vor dem Neustart nach erfolgreichem Update
/// (damit die letzte serielle Zeile und HTTP-Antworten noch rausgehen)
pub const RESTART_DELAY_MS: u64 = 1000;

// ============================================================================
// Serielle Schnittstelle
// ============================================================================

/// Baudrate der Kommando-Schnittstelle (UART0)
pub const SERIAL_BAUDRATE: u32 = 115_200;

/// Puffer zwischen UART-Task und Controller (je Richtung)
pub const SERIAL_PIPE_SIZE: usize = 512;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

/// Reconnect-Wartezeit nach WiFi-Fehlern
pub const WIFI_RETRY_DELAY_SECS: u64 = 5;

/// DNS Query Timeout in Sekunden
pub const DNS_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// HTTP Server Konfiguration
// ============================================================================

/// Anzahl paralleler HTTP-Server-Tasks (= Antwort-Slots)
pub const HTTP_TASK_COUNT: usize = 4;

/// HTTP Buffer-Größe in Bytes
/// Für HTTP Request/Response Headers und Body
pub const HTTP_BUFFER_SIZE: usize = 1024;

/// TCP RX Buffer-Größe in Bytes
pub const TCP_RX_BUFFER_SIZE: usize = 1024;

/// TCP TX Buffer-Größe in Bytes
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// Queue-Tiefe für HTTP-Anfragen an den Controller
pub const HTTP_QUEUE_DEPTH: usize = 4;

/// JSON-Puffer für die Music-Quittung (inkl. Meldungstext)
pub const JSON_ACK_BUFFER_SIZE: usize = 448;

// ============================================================================
// Update-Konfiguration
// ============================================================================

/// Port für Push-Updates (espota-Standardport)
pub const PUSH_OTA_PORT: u16 = 3232;

/// Passwort für Push-Updates, leer = kein Passwort
pub const OTA_PASSWORD: &str = match option_env!("OTA_PASSWORD") {
    Some(password) => password,
    None => "",
};

/// Socket-Timeout für Update-Verbindungen in Sekunden
pub const OTA_SOCKET_TIMEOUT_SECS: u64 = 30;

/// Chunk-Größe beim Schreiben ins Flash (= Sektor)
pub const OTA_CHUNK_SIZE: usize = 4096;

/// TCP RX Buffer für Firmware-Downloads
pub const DOWNLOAD_RX_BUFFER_SIZE: usize = 4096;

/// TCP TX Buffer für Firmware-Downloads (nur Request-Header)
pub const DOWNLOAD_TX_BUFFER_SIZE: usize = 512;

/// Puffer für HTTP-Antwort-Header
pub const HTTP_HEADER_BUFFER_SIZE: usize = 1024;

/// Queue-Tiefe für Push-Ereignisse an den Controller
pub const PUSH_QUEUE_DEPTH: usize = 8;
