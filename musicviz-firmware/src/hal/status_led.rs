// Eingebaute Status-LED (einfacher GPIO-Ausgang)

use esp_hal::gpio::Output;
use musicviz_core::StatusLed;

/// Status-LED an einem GPIO, aktiv-high
pub struct GpioStatusLed<'a> {
    pin: Output<'a>,
}

impl<'a> GpioStatusLed<'a> {
    pub fn new(pin: Output<'a>) -> Self {
        Self { pin }
    }
}

impl StatusLed for GpioStatusLed<'_> {
    fn set(&mut self, on: bool) {
        if on {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}
