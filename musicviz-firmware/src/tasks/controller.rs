// Controller Task - besitzt `Device` und treibt den Scheduler-Tick
//
// Alle Eingaben (UART, HTTP, Push-Updates) kommen über Kanäle herein und
// werden pro Tick in fester Reihenfolge abgearbeitet. Nur dieser Task
// verändert den Gerätezustand.

use core::net::Ipv4Addr;

use defmt::{info, warn};
use embassy_net::Stack;
use embassy_time::{Duration, Instant, Ticker, Timer};
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal_smartled::smart_led_buffer;
use musicviz_core::{
    Board, Device, HttpReply, HttpRequest, PushEvent, SmartLedWriter, StatusLed, TickOutcome,
    UpdateError,
};

use crate::config::{
    DEVICE_INFO, LED_COUNT, RESTART_DELAY_MS, RMT_CLOCK_MHZ, TICK_INTERVAL_MS,
};
use crate::hal::{GpioStatusLed, RmtStripWriter};
use crate::ota::HttpUpdateTransport;
use crate::{HttpReplySlots, HttpRequestReceiver, PushAckSignal, PushEventReceiver, SerialPipe};

/// Board-Implementierung auf Basis der Embassy-Kanäle
pub struct ChannelBoard {
    stack: Stack<'static>,
    transport: HttpUpdateTransport,
    push_events: PushEventReceiver,
    push_ack: &'static PushAckSignal,
    /// Nur `Start` wird quittiert, der Listener wartet genau darauf
    awaiting_start_ack: bool,
    serial_rx: &'static SerialPipe,
    serial_tx: &'static SerialPipe,
    http_requests: HttpRequestReceiver,
    http_replies: &'static HttpReplySlots,
}

impl ChannelBoard {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stack: Stack<'static>,
        transport: HttpUpdateTransport,
        push_events: PushEventReceiver,
        push_ack: &'static PushAckSignal,
        serial_rx: &'static SerialPipe,
        serial_tx: &'static SerialPipe,
        http_requests: HttpRequestReceiver,
        http_replies: &'static HttpReplySlots,
    ) -> Self {
        Self {
            stack,
            transport,
            push_events,
            push_ack,
            awaiting_start_ack: false,
            serial_rx,
            serial_tx,
            http_requests,
            http_replies,
        }
    }
}

impl Board for ChannelBoard {
    type Transport = HttpUpdateTransport;

    fn ip_address(&self) -> Option<Ipv4Addr> {
        self.stack
            .config_v4()
            .map(|config| config.address.address())
    }

    fn transport(&mut self) -> &mut Self::Transport {
        &mut self.transport
    }

    fn next_push_event(&mut self) -> Option<PushEvent> {
        let event = self.push_events.try_receive().ok()?;
        self.awaiting_start_ack = event == PushEvent::Start;
        Some(event)
    }

    fn push_ack(&mut self, result: Result<(), UpdateError>) {
        if core::mem::take(&mut self.awaiting_start_ack) {
            self.push_ack.signal(result);
        }
    }

    fn read_serial(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.serial_rx.try_read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn write_serial(&mut self, line: &str) {
        // Volle Pipe = Host liest nicht mit, Zeile wird verworfen
        for part in [line.as_bytes(), b"\r\n"] {
            if self.serial_tx.try_write(part).map_or(true, |n| n < part.len()) {
                warn!("Serial: TX pipe full, line truncated");
                return;
            }
        }
    }

    fn next_http_request(&mut self) -> Option<HttpRequest> {
        self.http_requests.try_receive().ok()
    }

    fn send_http_reply(&mut self, reply: HttpReply) {
        match self.http_replies.get(usize::from(reply.slot)) {
            Some(slot) => slot.signal(reply),
            None => warn!("HTTP: Reply for unknown slot {}", reply.slot),
        }
    }
}

/// Controller-Schleife - testbar ohne konkrete Hardware-Typen
///
/// Ruft `Device::tick` im festen Takt auf. Meldet der Tick `Restart`,
/// wird nach kurzer Wartezeit ein Software-Reset ausgelöst.
pub async fn controller_logic<L, S, B>(mut device: Device<L, S, LED_COUNT>, mut board: B) -> !
where
    L: SmartLedWriter,
    S: StatusLed,
    B: Board,
{
    device.boot(&mut board);

    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    loop {
        let now = Instant::now().as_millis();
        if device.tick(now, &mut board).await == TickOutcome::Restart {
            info!("Controller: Update installed, restarting");
            Timer::after(Duration::from_millis(RESTART_DELAY_MS)).await;
            esp_hal::system::software_reset();
        }
        ticker.next().await;
    }
}

/// Controller Task - Embassy Task für die Hardware-Initialisierung
///
/// # Parameter
/// - `strip_pin`: Datenleitung des WS2812 Strips
/// - `rmt_peripheral`: RMT Peripheral für präzises Timing
/// - `status_pin`: GPIO der Status-LED
/// - `board`: Kanäle und Transport
#[embassy_executor::task]
pub async fn controller_task(
    strip_pin: esp_hal::peripherals::GPIO8<'static>,
    rmt_peripheral: esp_hal::peripherals::RMT<'static>,
    status_pin: esp_hal::peripherals::GPIO15<'static>,
    board: ChannelBoard,
) {
    // Puffer lebt im Task-Future (statisch allokiert)
    // Macro allokiert Speicher im richtigen Format für RMT
    let mut rmt_buffer = smart_led_buffer!(LED_COUNT);

    let strip = match RmtStripWriter::new(strip_pin, rmt_peripheral, RMT_CLOCK_MHZ, &mut rmt_buffer)
    {
        Ok(strip) => strip,
        Err(e) => {
            warn!("Controller: RMT init failed: {}", e);
            return;
        }
    };
    let status_led = GpioStatusLed::new(Output::new(status_pin, Level::Low, OutputConfig::default()));

    let device = Device::new(
        DEVICE_INFO,
        strip,
        status_led,
        Instant::now().as_millis(),
    );
    controller_logic(device, board).await
}
