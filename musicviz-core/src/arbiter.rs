//! LED-Arbiter - entscheidet pro Tick, wer auf den Strip schreiben darf
//!
//! Produzenten: Off, Solid, Rainbow, Visualizer - oder niemand, solange
//! ein Firmware-Update läuft (`DeviceState::update_in_progress`).

use rgb::RGB8;

use crate::config::{RAINBOW_HUE_STEP, VISUALIZER_BEAT_STEP};
use crate::effects::{BeatSample, beat_frame, fill_rainbow, visualizer_frame};
use crate::fmt::warn;
use crate::traits::SmartLedWriter;
use crate::types::{DeviceState, LedMode};

const BLACK: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// Besitzt den Frame-Puffer und die Effekt-Phasen
///
/// Hue- und Beat-Phase laufen monoton weiter und werden bei
/// Moduswechseln nicht zurückgesetzt.
pub struct LedArbiter<const N: usize> {
    frame: [RGB8; N],
    output: [RGB8; N],
    hue: u8,
    beat: u8,
    sample: Option<BeatSample>,
}

impl<const N: usize> Default for LedArbiter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LedArbiter<N> {
    pub const fn new() -> Self {
        Self {
            frame: [BLACK; N],
            output: [BLACK; N],
            hue: 0,
            beat: 0,
            sample: None,
        }
    }

    /// Einmal pro Scheduler-Tick
    ///
    /// Gibt `false` zurück, wenn das Rendern wegen eines laufenden Updates
    /// unterdrückt wurde (kein Schreibzugriff auf den Strip).
    pub fn render_tick<L: SmartLedWriter>(
        &mut self,
        state: &DeviceState,
        strip: &mut L,
        now_ms: u64,
    ) -> bool {
        if state.update_in_progress {
            return false;
        }
        self.paint(state, now_ms);
        match state.mode {
            LedMode::Rainbow => self.hue = self.hue.wrapping_add(RAINBOW_HUE_STEP),
            LedMode::Visualizer => self.beat = self.beat.wrapping_add(VISUALIZER_BEAT_STEP),
            LedMode::Off | LedMode::Solid => {}
        }
        self.flush(state.brightness, strip);
        true
    }

    /// Sofortiges Neuzeichnen ohne Phasen-Fortschritt (z.B. nach Farbwechsel)
    pub fn render_now<L: SmartLedWriter>(
        &mut self,
        state: &DeviceState,
        strip: &mut L,
        now_ms: u64,
    ) -> bool {
        if state.update_in_progress {
            return false;
        }
        self.paint(state, now_ms);
        self.flush(state.brightness, strip);
        true
    }

    /// Übernimmt ein Beat-Sample; im Visualizer-Modus wird sofort gezeichnet
    ///
    /// Gibt zurück, ob das Sample verwendet wurde. Außerhalb des
    /// Visualizer-Modus wird es verworfen.
    pub fn apply_sample<L: SmartLedWriter>(
        &mut self,
        sample: BeatSample,
        state: &DeviceState,
        strip: &mut L,
    ) -> bool {
        if state.mode != LedMode::Visualizer {
            return false;
        }
        self.sample = Some(sample);
        if !state.update_in_progress {
            beat_frame(&mut self.frame, sample);
            self.flush(state.brightness, strip);
        }
        true
    }

    /// Löscht den Strip unabhängig vom Modus (Eintritt in ein Update)
    pub fn clear<L: SmartLedWriter>(&mut self, strip: &mut L) {
        self.frame.fill(BLACK);
        self.output.fill(BLACK);
        if strip.write(&self.output).is_err() {
            warn!("LED: clear write failed");
        }
    }

    /// Zuletzt berechneter Frame (vor Helligkeits-Skalierung)
    pub fn frame(&self) -> &[RGB8] {
        &self.frame
    }

    pub fn hue_phase(&self) -> u8 {
        self.hue
    }

    pub fn beat_phase(&self) -> u8 {
        self.beat
    }

    pub fn last_sample(&self) -> Option<BeatSample> {
        self.sample
    }

    fn paint(&mut self, state: &DeviceState, now_ms: u64) {
        match state.mode {
            LedMode::Off => self.frame.fill(BLACK),
            LedMode::Solid => self.frame.fill(state.color),
            LedMode::Rainbow => {
                let delta = (255 / N.max(1)) as u8;
                fill_rainbow(&mut self.frame, self.hue, delta);
            }
            LedMode::Visualizer => {
                visualizer_frame(&mut self.frame, self.beat, now_ms, self.sample);
            }
        }
    }

    // Schreibfehler sind auf dieser Ebene nicht behandelbar: fire-and-forget
    fn flush<L: SmartLedWriter>(&mut self, brightness: u8, strip: &mut L) {
        let scaled = smart_leds::brightness(self.frame.iter().copied(), brightness);
        for (out, pixel) in self.output.iter_mut().zip(scaled) {
            *out = pixel;
        }
        if strip.write(&self.output).is_err() {
            warn!("LED: strip write failed");
        }
    }
}
