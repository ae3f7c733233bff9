// Push-Update Task - nimmt Firmware-Images per TCP entgegen
//
// Protokoll (eine Verbindung pro Update):
//   Tool → Gerät: "MVOTA <size> [password]\n", danach <size> Bytes Image
//   Gerät → Tool: "GO\n" nach Annahme, am Ende "OK\n" oder "ERR <grund>\n"
//
// Der Task schreibt selbst ins Flash und meldet jeden Schritt als
// `PushEvent` an den Controller. Über Start entscheidet der Controller:
// läuft schon ein Update, wird abgelehnt.

use core::fmt::{Arguments, Write as _};

use defmt::{info, warn};
use embassy_net::Stack;
use embassy_net::tcp::TcpSocket;
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;
use musicviz_core::{PushError, PushEvent, PushHeader, UpdateError};

use crate::config::{
    DOWNLOAD_RX_BUFFER_SIZE, OTA_CHUNK_SIZE, OTA_PASSWORD, OTA_SOCKET_TIMEOUT_SECS, PUSH_OTA_PORT,
};
use crate::ota::{OtaError, OtaService};
use crate::{PushAckSignal, PushEventSender};

/// Maximale Länge der Kopfzeile
const HEADER_BUFFER_SIZE: usize = 128;

/// Fehler einer Push-Verbindung (nur fürs Log)
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
enum PushNetError {
    Accept,
    Header,
    Rejected(UpdateError),
    Failed(PushError),
}

/// Push-Update Listener
///
/// # Parameter
/// - `stack`: embassy-net Stack
/// - `ota`: Flash-Zugriff für das Image
/// - `events`: Ereignisse an den Controller
/// - `start_ack`: Quittung des Controllers für `PushEvent::Start`
#[embassy_executor::task]
pub async fn push_update_task(
    stack: Stack<'static>,
    ota: OtaService,
    events: PushEventSender,
    start_ack: &'static PushAckSignal,
) {
    info!("Push-OTA: Listening on port {}", PUSH_OTA_PORT);

    loop {
        if let Err(e) = handle_push_connection(stack, ota, events, start_ack).await {
            warn!("Push-OTA: Connection ended with {}", e);
        }
        Timer::after(Duration::from_millis(100)).await;
    }
}

async fn handle_push_connection(
    stack: Stack<'static>,
    ota: OtaService,
    events: PushEventSender,
    start_ack: &PushAckSignal,
) -> Result<(), PushNetError> {
    let mut rx_buffer = [0u8; DOWNLOAD_RX_BUFFER_SIZE];
    let mut tx_buffer = [0u8; 128];

    let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
    socket.set_timeout(Some(Duration::from_secs(OTA_SOCKET_TIMEOUT_SECS)));
    socket
        .accept(PUSH_OTA_PORT)
        .await
        .map_err(|_| PushNetError::Accept)?;
    info!("Push-OTA: Connection accepted");

    // Kopfzeile lesen; was danach kommt, ist schon Image
    let mut header_buffer = [0u8; HEADER_BUFFER_SIZE];
    let mut filled = 0;
    let line_end = loop {
        if let Some(pos) = header_buffer[..filled].iter().position(|&b| b == b'\n') {
            break pos;
        }
        if filled == header_buffer.len() {
            return Err(PushNetError::Header);
        }
        match socket.read(&mut header_buffer[filled..]).await {
            Ok(0) | Err(_) => return Err(PushNetError::Header),
            Ok(n) => filled += n,
        }
    };

    let header = core::str::from_utf8(&header_buffer[..line_end])
        .ok()
        .and_then(PushHeader::parse);
    let Some(header) = header else {
        reply(&mut socket, format_args!("ERR invalid header")).await;
        return Err(PushNetError::Header);
    };
    let leftover = &header_buffer[line_end + 1..filled];

    // Controller entscheidet über den Start
    start_ack.reset();
    events.send(PushEvent::Start).await;
    if let Err(e) = start_ack.wait().await {
        reply(&mut socket, format_args!("ERR {}", e)).await;
        return Err(PushNetError::Rejected(e));
    }
    info!("Push-OTA: Receiving {} bytes", header.size);

    match receive_image(&mut socket, &header, leftover, ota, events).await {
        Ok(()) => {
            events.send(PushEvent::End).await;
            reply(&mut socket, format_args!("OK")).await;
            let _ = socket.flush().await;
            Ok(())
        }
        Err(reason) => {
            events.send(PushEvent::Error(reason)).await;
            reply(&mut socket, format_args!("ERR {}", reason)).await;
            Err(PushNetError::Failed(reason))
        }
    }
}

/// Prüft, empfängt und schreibt das Image; jeder Fehler ist ein Abbruchgrund
async fn receive_image(
    socket: &mut TcpSocket<'_>,
    header: &PushHeader<'_>,
    leftover: &[u8],
    ota: OtaService,
    events: PushEventSender,
) -> Result<(), PushError> {
    header.authorize(OTA_PASSWORD)?;
    socket
        .write_all(b"GO\n")
        .await
        .map_err(|_| PushError::Connect)?;

    let mut session = ota
        .begin_update(header.size)
        .map_err(OtaError::push_reason)?;

    let mut chunk = [0u8; OTA_CHUNK_SIZE];
    let take = leftover.len().min(header.size as usize);
    chunk[..take].copy_from_slice(&leftover[..take]);
    let mut filled = take;
    let mut received = take as u32;

    loop {
        // Volle Sektoren sammeln, dann schreiben
        while filled < chunk.len() && received < header.size {
            let want = (chunk.len() - filled).min((header.size - received) as usize);
            let n = socket
                .read(&mut chunk[filled..filled + want])
                .await
                .map_err(|_| PushError::Receive)?;
            if n == 0 {
                return Err(PushError::Receive);
            }
            filled += n;
            received += n as u32;
        }
        if filled == 0 {
            break;
        }

        session
            .write_chunk(&chunk[..filled])
            .map_err(|_| PushError::Receive)?;
        filled = 0;

        // Fortschritt darf verloren gehen, Ende/Fehler nicht
        let _ = events.try_send(PushEvent::Progress {
            written: session.written(),
            total: header.size,
        });

        if received >= header.size {
            break;
        }
    }

    session.finalize().map_err(|_| PushError::End)
}

/// Schreibt eine Antwortzeile, Fehler werden ignoriert
async fn reply(socket: &mut TcpSocket<'_>, args: Arguments<'_>) {
    let mut line = heapless::String::<64>::new();
    let _ = line.write_fmt(args);
    let _ = line.push('\n');
    let _ = socket.write_all(line.as_bytes()).await;
}
