// OTA Service - Partitionen finden, Image schreiben, Slot aktivieren
//
// Nutzt den OTA-Mechanismus des ESP-IDF Bootloaders: Image in die
// inaktive App-Partition schreiben, danach Slot umschalten und als
// `New` markieren. Nach dem Neustart markiert `confirm_boot` das Image
// als gültig, sonst rollt der Bootloader zurück.

use defmt::{Debug2Format, info, warn};
use embedded_storage::Storage;
use esp_bootloader_esp_idf::ota::{Ota, OtaImageState, Slot};
use esp_bootloader_esp_idf::partitions::{
    AppPartitionSubType, DataPartitionSubType, PARTITION_TABLE_MAX_LEN, PartitionType,
    read_partition_table,
};
use musicviz_core::{FlashError, PushError};

use crate::ota::FlashStorageMutex;

/// Fehler beim Flashen
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum OtaError {
    /// Partitionstabelle nicht lesbar
    PartitionTable,
    /// Keine otadata-Partition (OTA nicht konfiguriert)
    NoOtaDataPartition,
    /// Keine Ziel-Partition für den nächsten Slot
    NoNextPartition,
    /// otadata nicht lesbar
    InvalidState,
    /// Image größer als die Ziel-Partition
    TooLarge,
    WriteError,
    ActivationError,
}

impl From<OtaError> for FlashError {
    fn from(e: OtaError) -> Self {
        match e {
            OtaError::PartitionTable | OtaError::NoOtaDataPartition | OtaError::InvalidState => {
                FlashError::InvalidPartitionTable
            }
            OtaError::NoNextPartition => FlashError::NoTargetSlot,
            OtaError::TooLarge => FlashError::TooLarge,
            OtaError::WriteError => FlashError::Write,
            OtaError::ActivationError => FlashError::Activate,
        }
    }
}

impl OtaError {
    /// Fehlergrund im Push-Pfad: alles vor dem ersten Byte ist `Begin`
    pub fn push_reason(self) -> PushError {
        match self {
            OtaError::WriteError => PushError::Receive,
            OtaError::ActivationError => PushError::End,
            _ => PushError::Begin,
        }
    }
}

/// OTA Service
///
/// Leichtgewichtiges Handle auf den geteilten Flash-Mutex.
#[derive(Clone, Copy)]
pub struct OtaService {
    flash: &'static FlashStorageMutex,
}

impl OtaService {
    pub fn new(flash: &'static FlashStorageMutex) -> Self {
        Self { flash }
    }

    /// Markiert ein frisch installiertes Image als gültig
    ///
    /// Früh beim Boot aufrufen, sonst bootet der Bootloader beim nächsten
    /// Reset wieder die vorherige Partition.
    pub fn confirm_boot(&self) {
        self.flash.lock(|cell| {
            let mut flash = cell.borrow_mut();
            let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];

            let Ok(pt) = read_partition_table(&mut *flash, &mut buffer) else {
                warn!("OTA: Failed to read partition table");
                return;
            };
            let Ok(Some(ota_data)) =
                pt.find_partition(PartitionType::Data(DataPartitionSubType::Ota))
            else {
                info!("OTA: No otadata partition, updates disabled");
                return;
            };

            let mut region = ota_data.as_embedded_storage(&mut *flash);
            let Ok(mut ota) = Ota::new(&mut region) else {
                warn!("OTA: otadata unreadable");
                return;
            };

            if matches!(ota.current_slot(), Ok(Slot::None) | Err(_)) {
                return;
            }

            match ota.current_ota_state() {
                Ok(OtaImageState::New | OtaImageState::PendingVerify) => {
                    if ota.set_current_ota_state(OtaImageState::Valid).is_ok() {
                        info!("OTA: Image marked valid");
                    } else {
                        warn!("OTA: Failed to mark image valid");
                    }
                }
                Ok(state) => info!("OTA: Image state {}", Debug2Format(&state)),
                Err(_) => warn!("OTA: Image state unreadable"),
            }
        });
    }

    /// Öffnet eine Schreib-Session auf der inaktiven Partition
    ///
    /// `total_size` ist die erwartete Image-Größe (0 = unbekannt).
    pub fn begin_update(&self, total_size: u32) -> Result<OtaSession, OtaError> {
        let (target_slot, offset, capacity) = self.flash.lock(|cell| {
            let mut flash = cell.borrow_mut();
            let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];

            let pt = read_partition_table(&mut *flash, &mut buffer)
                .map_err(|_| OtaError::PartitionTable)?;
            let ota_data = pt
                .find_partition(PartitionType::Data(DataPartitionSubType::Ota))
                .map_err(|_| OtaError::PartitionTable)?
                .ok_or(OtaError::NoOtaDataPartition)?;

            let mut region = ota_data.as_embedded_storage(&mut *flash);
            let mut ota = Ota::new(&mut region).map_err(|_| OtaError::InvalidState)?;
            let target_slot = ota
                .current_slot()
                .map_err(|_| OtaError::InvalidState)?
                .next();

            // Tabelle neu lesen, die Region oben hält `flash` geliehen
            let pt = read_partition_table(&mut *flash, &mut buffer)
                .map_err(|_| OtaError::PartitionTable)?;
            let target_type = match target_slot {
                Slot::None | Slot::Slot0 => PartitionType::App(AppPartitionSubType::Ota0),
                Slot::Slot1 => PartitionType::App(AppPartitionSubType::Ota1),
            };
            let target = pt
                .find_partition(target_type)
                .map_err(|_| OtaError::PartitionTable)?
                .ok_or(OtaError::NoNextPartition)?;

            Ok((target_slot, target.offset(), target.len()))
        })?;

        if total_size > capacity {
            warn!(
                "OTA: Image {} bytes exceeds partition {} bytes",
                total_size, capacity
            );
            return Err(OtaError::TooLarge);
        }

        info!(
            "OTA: Writing slot {} at 0x{:X} ({} bytes)",
            Debug2Format(&target_slot),
            offset,
            total_size
        );

        Ok(OtaSession {
            flash: self.flash,
            offset,
            capacity,
            target_slot,
            written: 0,
            total_size,
        })
    }
}

/// Laufende Schreib-Session
pub struct OtaSession {
    flash: &'static FlashStorageMutex,
    offset: u32,
    capacity: u32,
    target_slot: Slot,
    written: u32,
    total_size: u32,
}

impl OtaSession {
    /// Schreibt den nächsten Abschnitt des Images
    ///
    /// `Storage::write` erledigt Read-Modify-Write inkl. Sektor-Erase.
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<(), OtaError> {
        if data.is_empty() {
            return Ok(());
        }
        let len = data.len() as u32;
        if self.written + len > self.capacity {
            return Err(OtaError::TooLarge);
        }

        let at = self.offset + self.written;
        self.flash.lock(|cell| {
            cell.borrow_mut()
                .write(at, data)
                .map_err(|_| OtaError::WriteError)
        })?;

        self.written += len;
        Ok(())
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    /// Aktiviert den geschriebenen Slot für den nächsten Boot
    pub fn finalize(self) -> Result<(), OtaError> {
        if self.total_size != 0 && self.written != self.total_size {
            warn!(
                "OTA: Wrote {} bytes, expected {}",
                self.written, self.total_size
            );
            return Err(OtaError::WriteError);
        }

        self.flash.lock(|cell| {
            let mut flash = cell.borrow_mut();
            let mut buffer = [0u8; PARTITION_TABLE_MAX_LEN];

            let pt = read_partition_table(&mut *flash, &mut buffer)
                .map_err(|_| OtaError::PartitionTable)?;
            let ota_data = pt
                .find_partition(PartitionType::Data(DataPartitionSubType::Ota))
                .map_err(|_| OtaError::PartitionTable)?
                .ok_or(OtaError::NoOtaDataPartition)?;

            let mut region = ota_data.as_embedded_storage(&mut *flash);
            let mut ota = Ota::new(&mut region).map_err(|_| OtaError::InvalidState)?;

            ota.set_current_slot(self.target_slot)
                .map_err(|_| OtaError::ActivationError)?;
            ota.set_current_ota_state(OtaImageState::New)
                .map_err(|_| OtaError::ActivationError)?;
            Ok(())
        })?;

        info!(
            "OTA: Slot {} activated ({} bytes)",
            Debug2Format(&self.target_slot),
            self.written
        );
        Ok(())
    }
}
