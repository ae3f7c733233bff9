// WS2812 Strip-Writer über das RMT Peripheral
//
// Implementiert `SmartLedWriter` aus musicviz-core. Helligkeit und
// Effekte rechnet der Arbiter, hier wird nur der fertige Frame gesendet.

use esp_hal::Blocking;
use esp_hal::gpio::interconnect::PeripheralOutput;
use esp_hal::rmt::{PulseCode, Rmt};
use esp_hal::time::Rate;
use esp_hal_smartled::SmartLedsAdapter;
use musicviz_core::{LedError, SmartLedWriter};
use rgb::RGB8;
use smart_leds_trait::SmartLedsWrite;

use crate::config::LED_BUFFER_SIZE;

/// Fehler beim Initialisieren des RMT Peripherals
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct RmtInitError;

/// Real Hardware Strip Writer
///
/// Der Puffer muss so lange leben wie der Writer, daher wird er im
/// Controller-Task angelegt und hier nur geliehen.
pub struct RmtStripWriter<'a> {
    strip: SmartLedsAdapter<'a, LED_BUFFER_SIZE>,
}

impl<'a> RmtStripWriter<'a> {
    /// Erstellt einen neuen Writer auf RMT-Kanal 0
    ///
    /// # Parameter
    /// - `pin`: Datenleitung des Strips
    /// - `rmt_peripheral`: RMT Peripheral
    /// - `rmt_clock_mhz`: RMT Clock Frequenz in MHz (z.B. 80)
    /// - `buffer`: Puffer für die Pulse aller LEDs
    pub fn new(
        pin: impl PeripheralOutput<'a>,
        rmt_peripheral: esp_hal::peripherals::RMT<'a>,
        rmt_clock_mhz: u32,
        buffer: &'a mut [PulseCode; LED_BUFFER_SIZE],
    ) -> Result<Self, RmtInitError> {
        let rmt: Rmt<'a, Blocking> =
            Rmt::new(rmt_peripheral, Rate::from_mhz(rmt_clock_mhz)).map_err(|_| RmtInitError)?;
        let strip = SmartLedsAdapter::new(rmt.channel0, pin, buffer);
        Ok(Self { strip })
    }
}

impl SmartLedWriter for RmtStripWriter<'_> {
    fn write(&mut self, pixels: &[RGB8]) -> Result<(), LedError> {
        self.strip
            .write(pixels.iter().copied())
            .map_err(|_| LedError::WriteFailed)
    }
}
