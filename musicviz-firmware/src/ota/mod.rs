// OTA-Modul: Flash-Zugriff, Partitions-Handling und HTTP-Download
//
// Pull-Updates (Controller) und Push-Updates (Listener-Task) schreiben
// beide über `OtaService` in die inaktive Partition.

pub mod client;
pub mod flash;
pub mod service;
pub mod transport;

pub use flash::{FlashStorageMutex, init_flash_storage};
pub use service::{OtaError, OtaService, OtaSession};
pub use transport::HttpUpdateTransport;
