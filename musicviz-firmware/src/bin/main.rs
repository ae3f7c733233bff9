// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi und HTTP-Bodies brauchen dynamischen Speicher)
extern crate alloc;

// Embassy Async Runtime
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, StackResources};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use esp_hal::uart::{Config as UartConfig, Uart};

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

// Firmware-Crate
use esp_musicviz::config::{
    DEVICE_NAME, EXTRA_HEAP_SIZE, FIRMWARE_VERSION, HTTP_TASK_COUNT, SERIAL_BAUDRATE,
    WIFI_HEAP_SIZE,
};
use esp_musicviz::ota::{HttpUpdateTransport, OtaService, init_flash_storage};
use esp_musicviz::tasks::{
    ChannelBoard, connection_task, controller_task, dhcp_task, http_server_task, net_task,
    push_update_task, serial_task,
};
use esp_musicviz::{
    HttpReplySlots, HttpRequestChannel, PushAckSignal, PushEventChannel, SerialPipe,
};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Sockets: HTTP-Tasks + Push-Listener + Release-Download + DNS
const SOCKET_COUNT: usize = HTTP_TASK_COUNT + 3;

/// Main Entry Point
///
/// Initialisiert Hardware, Flash, WiFi und die Kanäle zum Controller,
/// spawnt alle Tasks und schläft danach.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // CPU auf 160 MHz, der Scheduler-Tick rechnet Frames im 10-ms-Takt
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    defmt::info!("{} v{} booting", DEVICE_NAME, FIRMWARE_VERSION);

    // Heap: reclaimed RAM (64 KB) + extra (36 KB)
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // esp-rtos: Zeitbasis für embassy-time und Scheduler für esp-radio
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // Flash + OTA: laufendes Image bestätigen, bevor irgendetwas anderes passiert
    let flash = init_flash_storage(peripherals.FLASH);
    let ota = OtaService::new(flash);
    ota.confirm_boot();

    // Radio + WiFi-Station
    static RADIO_INIT: static_cell::StaticCell<esp_radio::Controller> =
        static_cell::StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Hardware-RNG als Seed für TCP-Sequenznummern
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    static RESOURCES: static_cell::StaticCell<StackResources<SOCKET_COUNT>> =
        static_cell::StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    // Stack ist Copy und kann direkt an Tasks übergeben werden
    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    // Kanäle zum Controller
    static HTTP_REQUESTS: static_cell::StaticCell<HttpRequestChannel> =
        static_cell::StaticCell::new();
    let http_requests = &*HTTP_REQUESTS.init(HttpRequestChannel::new());

    static HTTP_REPLIES: static_cell::StaticCell<HttpReplySlots> = static_cell::StaticCell::new();
    let http_replies = &*HTTP_REPLIES.init([const { Signal::new() }; HTTP_TASK_COUNT]);

    static PUSH_EVENTS: static_cell::StaticCell<PushEventChannel> =
        static_cell::StaticCell::new();
    let push_events = &*PUSH_EVENTS.init(PushEventChannel::new());

    static PUSH_ACK: static_cell::StaticCell<PushAckSignal> = static_cell::StaticCell::new();
    let push_ack = &*PUSH_ACK.init(Signal::new());

    static SERIAL_RX: static_cell::StaticCell<SerialPipe> = static_cell::StaticCell::new();
    let serial_rx = &*SERIAL_RX.init(SerialPipe::new());

    static SERIAL_TX: static_cell::StaticCell<SerialPipe> = static_cell::StaticCell::new();
    let serial_tx = &*SERIAL_TX.init(SerialPipe::new());

    // UART0 für die Kommando-Konsole (defmt läuft über USB-Serial-JTAG)
    let uart = Uart::new(
        peripherals.UART0,
        UartConfig::default().with_baudrate(SERIAL_BAUDRATE),
    )
    .expect("Failed to initialize UART0")
    .with_rx(peripherals.GPIO17)
    .with_tx(peripherals.GPIO16)
    .into_async();

    // Controller besitzt den Gerätezustand
    let board = ChannelBoard::new(
        stack,
        HttpUpdateTransport::new(stack, ota),
        push_events.receiver(),
        push_ack,
        serial_rx,
        serial_tx,
        http_requests.receiver(),
        http_replies,
    );
    spawner
        .spawn(controller_task(
            peripherals.GPIO8,
            peripherals.RMT,
            peripherals.GPIO15,
            board,
        ))
        .unwrap();

    spawner
        .spawn(serial_task(uart, serial_rx, serial_tx))
        .unwrap();

    // Spawn WiFi Tasks
    spawner.spawn(connection_task(wifi_controller)).unwrap();
    spawner.spawn(net_task(runner)).unwrap();
    spawner.spawn(dhcp_task(stack)).unwrap();

    // Spawn HTTP Server Tasks, jede Instanz bedient eine Verbindung
    for task_id in 0..HTTP_TASK_COUNT {
        spawner
            .spawn(http_server_task(
                task_id,
                stack,
                http_requests.sender(),
                http_replies,
            ))
            .unwrap();
    }

    spawner
        .spawn(push_update_task(stack, ota, push_events.sender(), push_ack))
        .unwrap();

    // main() hat nichts mehr zu tun
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
