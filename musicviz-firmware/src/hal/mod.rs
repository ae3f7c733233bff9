// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Hardware-Traits aus musicviz-core für das ESP32-C6.
// Die Logik dahinter wird im Host-Workspace gegen Mocks getestet.

pub mod led_writer;
pub mod status_led;

pub use led_writer::RmtStripWriter;
pub use status_led::GpioStatusLed;
