//! Liveness der seriellen Verbindung
//!
//! Reine Zeitstempel-Vergleiche, ausgewertet einmal pro Tick.

use crate::config::{HEARTBEAT_INTERVAL_MS, SERIAL_TIMEOUT_MS};
use crate::fmt::info;
use crate::timer::{Interval, elapsed_since};
use crate::types::DeviceState;

/// Zustandswechsel der seriellen Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkChange {
    Connected,
    TimedOut,
}

impl LinkChange {
    /// Meldung auf der seriellen Schnittstelle (ohne `RESPONSE:`-Präfix)
    pub fn notice(self) -> &'static str {
        match self {
            Self::Connected => "USB_CONNECTED",
            Self::TimedOut => "USB_TIMEOUT",
        }
    }
}

/// Schreibt als einzige Komponente `serial_connected` und `last_serial_activity_ms`
#[derive(Debug, Clone, Copy)]
pub struct ConnectivityMonitor {
    heartbeat: Interval,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ConnectivityMonitor {
    pub const fn new(boot_ms: u64) -> Self {
        Self {
            heartbeat: Interval::new(HEARTBEAT_INTERVAL_MS, boot_ms),
        }
    }

    /// Ein Byte kam über die serielle Schnittstelle
    pub fn on_activity(&mut self, state: &mut DeviceState, now_ms: u64) -> Option<LinkChange> {
        state.last_serial_activity_ms = now_ms;
        if state.serial_connected {
            return None;
        }
        info!("Serial: connected");
        state.serial_connected = true;
        self.heartbeat.reset(now_ms);
        Some(LinkChange::Connected)
    }

    /// Timeout-Prüfung; meldet den Übergang genau einmal
    pub fn tick(&mut self, state: &mut DeviceState, now_ms: u64) -> Option<LinkChange> {
        if state.serial_connected
            && elapsed_since(now_ms, state.last_serial_activity_ms) > SERIAL_TIMEOUT_MS
        {
            info!("Serial: timeout");
            state.serial_connected = false;
            return Some(LinkChange::TimedOut);
        }
        None
    }

    /// `true` alle 10 s, solange die Verbindung steht
    pub fn heartbeat_due(&mut self, state: &DeviceState, now_ms: u64) -> bool {
        state.serial_connected && self.heartbeat.poll(now_ms)
    }
}
