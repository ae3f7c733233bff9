// Geteilter Flash-Zugriff
//
// Pull- und Push-Pfad greifen über denselben Mutex auf das interne Flash zu.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use esp_hal::peripherals::FLASH;
use esp_storage::FlashStorage;
use static_cell::StaticCell;

/// Type-Alias für den geteilten Flash-Mutex
pub type FlashStorageMutex = Mutex<CriticalSectionRawMutex, RefCell<FlashStorage<'static>>>;

static FLASH_STORAGE_CELL: StaticCell<FlashStorageMutex> = StaticCell::new();

/// Initialisiert den Flash-Mutex aus dem FLASH Peripheral
///
/// # Panics
/// Panic bei zweitem Aufruf (StaticCell).
pub fn init_flash_storage(flash: FLASH<'static>) -> &'static FlashStorageMutex {
    let storage = FlashStorage::new(flash);
    FLASH_STORAGE_CELL.init(Mutex::new(RefCell::new(storage)))
}
