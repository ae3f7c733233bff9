// Serial Task - UART0 ↔ Controller
//
// Reicht empfangene Bytes an den Controller weiter und schreibt dessen
// Ausgaben zurück. Zeilen-Framing und Kommandos macht der Controller.

use defmt::{Debug2Format, info, warn};
use embassy_futures::select::{Either, select};
use esp_hal::Async;
use esp_hal::uart::Uart;

use crate::SerialPipe;

/// Serial Task
///
/// # Parameter
/// - `uart`: fertig konfigurierter UART (async)
/// - `rx_pipe`: Bytes vom Host → Controller
/// - `tx_pipe`: Zeilen vom Controller → Host
#[embassy_executor::task]
pub async fn serial_task(
    uart: Uart<'static, Async>,
    rx_pipe: &'static SerialPipe,
    tx_pipe: &'static SerialPipe,
) {
    info!("Serial: UART console ready");

    let (mut rx, mut tx) = uart.split();
    let mut rx_buffer = [0u8; 64];
    let mut tx_buffer = [0u8; 64];

    loop {
        match select(rx.read_async(&mut rx_buffer), tx_pipe.read(&mut tx_buffer)).await {
            Either::First(Ok(n)) => {
                // Controller liest pro Tick alles ab; Überlauf nur wenn er hängt
                if rx_pipe.try_write(&rx_buffer[..n]).map_or(true, |w| w < n) {
                    warn!("Serial: RX pipe full, bytes dropped");
                }
            }
            Either::First(Err(e)) => {
                warn!("Serial: RX error {}", Debug2Format(&e));
            }
            Either::Second(n) => {
                let mut sent = 0;
                while sent < n {
                    match tx.write_async(&tx_buffer[sent..n]).await {
                        Ok(written) => sent += written,
                        Err(e) => {
                            warn!("Serial: TX error {}", Debug2Format(&e));
                            break;
                        }
                    }
                }
            }
        }
    }
}
